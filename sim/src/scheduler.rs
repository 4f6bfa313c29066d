//! Cooperative timer queue.
//!
//! A priority queue of (fire-time, task) pairs drained by the frame loop.
//! Tasks are plain values; cancellation is by equality, so unscheduling a
//! task removes every pending instance of it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Scheduling operations the mission engine and game flow depend on.
pub trait Clock<T> {
    /// Fire `task` once after `delay` seconds.
    fn schedule_once(&mut self, task: T, delay: f32);
    /// Fire `task` every `interval` seconds until unscheduled.
    fn schedule_periodic(&mut self, task: T, interval: f32);
    /// Cancel all pending instances of `task`. Returns how many were removed;
    /// cancelling something that is not scheduled is a no-op.
    fn unschedule(&mut self, task: &T) -> usize;
}

#[derive(Debug, Clone)]
struct Pending<T> {
    fire_at: f64,
    seq: u64,
    interval: Option<f64>,
    task: T,
}

impl<T> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Pending<T> {}

impl<T> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Pending<T> {
    // Reversed so the max-heap pops the earliest (then oldest) entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .total_cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Single-threaded timer queue driven by [`Scheduler::advance`].
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: f64,
    seq: u64,
    queue: BinaryHeap<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0.0,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }
}

impl<T: PartialEq + Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scheduler time in seconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    fn push(&mut self, task: T, delay: f64, interval: Option<f64>) {
        self.seq += 1;
        self.queue.push(Pending {
            fire_at: self.now + delay.max(0.0),
            seq: self.seq,
            interval,
            task,
        });
    }

    /// Move time forward. Due tasks are then taken one at a time with
    /// [`Scheduler::pop_due`], so a task that unschedules another prevents it
    /// from firing even when both were due in the same frame.
    pub fn advance(&mut self, dt: f32) {
        self.now += dt as f64;
    }

    /// Next task whose fire time has passed. Periodic tasks are re-armed.
    pub fn pop_due(&mut self) -> Option<T> {
        if self.queue.peek()?.fire_at > self.now {
            return None;
        }
        let mut due = self.queue.pop()?;
        let task = due.task.clone();
        if let Some(interval) = due.interval {
            due.fire_at += interval;
            self.seq += 1;
            due.seq = self.seq;
            self.queue.push(due);
        }
        Some(task)
    }

    /// Number of pending instances of `task`.
    pub fn pending(&self, task: &T) -> usize {
        self.queue.iter().filter(|p| p.task == *task).count()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl<T: PartialEq + Clone> Clock<T> for Scheduler<T> {
    fn schedule_once(&mut self, task: T, delay: f32) {
        self.push(task, delay as f64, None);
    }

    fn schedule_periodic(&mut self, task: T, interval: f32) {
        // A zero interval would re-fire forever within one pop loop.
        let interval = (interval as f64).max(1e-3);
        self.push(task, interval, Some(interval));
    }

    fn unschedule(&mut self, task: &T) -> usize {
        let before = self.queue.len();
        self.queue.retain(|p| p.task != *task);
        before - self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Task {
        A,
        B,
        Tick,
    }

    fn drain(s: &mut Scheduler<Task>) -> Vec<Task> {
        std::iter::from_fn(|| s.pop_due()).collect()
    }

    #[test]
    fn test_fires_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule_once(Task::B, 2.0);
        s.schedule_once(Task::A, 1.0);

        s.advance(0.5);
        assert!(drain(&mut s).is_empty());
        s.advance(2.0);
        assert_eq!(drain(&mut s), vec![Task::A, Task::B]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_same_time_fires_in_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule_once(Task::B, 1.0);
        s.schedule_once(Task::A, 1.0);
        s.advance(1.0);
        assert_eq!(drain(&mut s), vec![Task::B, Task::A]);
    }

    #[test]
    fn test_unschedule_removes_all_instances() {
        let mut s = Scheduler::new();
        s.schedule_once(Task::A, 1.0);
        s.schedule_once(Task::A, 3.0);
        s.schedule_once(Task::B, 1.0);

        assert_eq!(s.unschedule(&Task::A), 2);
        assert_eq!(s.unschedule(&Task::A), 0);
        s.advance(5.0);
        assert_eq!(drain(&mut s), vec![Task::B]);
    }

    #[test]
    fn test_periodic_rearms() {
        let mut s = Scheduler::new();
        s.schedule_periodic(Task::Tick, 1.0);
        s.advance(3.5);
        assert_eq!(drain(&mut s), vec![Task::Tick, Task::Tick, Task::Tick]);
        assert_eq!(s.pending(&Task::Tick), 1);

        s.unschedule(&Task::Tick);
        s.advance(10.0);
        assert!(drain(&mut s).is_empty());
    }

    #[test]
    fn test_unschedule_between_pops() {
        let mut s = Scheduler::new();
        s.schedule_once(Task::A, 1.0);
        s.schedule_once(Task::B, 1.0);
        s.advance(1.0);

        assert_eq!(s.pop_due(), Some(Task::A));
        s.unschedule(&Task::B);
        assert_eq!(s.pop_due(), None);
    }
}
