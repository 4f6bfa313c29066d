//! World events and the handler-stack event bus.
//!
//! The world queues [`WorldEvent`]s while it updates; the game drains them
//! and routes each one through the [`EventBus`]. Subscribers push a frame of
//! handlers for the event kinds they care about and pop (or remove) it when
//! done. Dispatch visits the most recently pushed frame first and stops at
//! the first handler that reports [`EventResult::Handled`].

use crate::components::Position;
use crate::registry::ObjectClass;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Kinds of event the world emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PlayerDeath,
    ItemCollected,
    ObjectShot,
    ObjectDestroyed,
    ObjectTractored,
    ObjectReleased,
    RegionEntered,
    AstronautDeath,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::PlayerDeath,
        EventKind::ItemCollected,
        EventKind::ObjectShot,
        EventKind::ObjectDestroyed,
        EventKind::ObjectTractored,
        EventKind::ObjectReleased,
        EventKind::RegionEntered,
        EventKind::AstronautDeath,
    ];

    /// Handler name, e.g. `on_item_collected`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PlayerDeath => "on_player_death",
            EventKind::ItemCollected => "on_item_collected",
            EventKind::ObjectShot => "on_object_shot",
            EventKind::ObjectDestroyed => "on_object_destroyed",
            EventKind::ObjectTractored => "on_object_tractored",
            EventKind::ObjectReleased => "on_object_released",
            EventKind::RegionEntered => "on_region_entered",
            EventKind::AstronautDeath => "on_astronaut_death",
        }
    }
}

/// Copy of an object's identifying state, taken when the event fired.
///
/// Events outlive the frame they were raised in, and the object may be gone
/// by the time a handler runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    #[serde(skip)]
    pub entity: Option<Entity>,
    pub class: ObjectClass,
    pub id: Option<String>,
    pub name: Option<String>,
    pub position: Position,
    pub value: u32,
}

/// An event raised by the world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WorldEvent {
    PlayerDeath,
    ItemCollected { collector: ObjectInfo, item: ObjectInfo },
    ObjectShot(ObjectInfo),
    ObjectDestroyed(ObjectInfo),
    ObjectTractored(ObjectInfo),
    ObjectReleased(ObjectInfo),
    RegionEntered,
    AstronautDeath(ObjectInfo),
}

impl WorldEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorldEvent::PlayerDeath => EventKind::PlayerDeath,
            WorldEvent::ItemCollected { .. } => EventKind::ItemCollected,
            WorldEvent::ObjectShot(_) => EventKind::ObjectShot,
            WorldEvent::ObjectDestroyed(_) => EventKind::ObjectDestroyed,
            WorldEvent::ObjectTractored(_) => EventKind::ObjectTractored,
            WorldEvent::ObjectReleased(_) => EventKind::ObjectReleased,
            WorldEvent::RegionEntered => EventKind::RegionEntered,
            WorldEvent::AstronautDeath(_) => EventKind::AstronautDeath,
        }
    }

    /// The object the event is about, if any.
    pub fn subject(&self) -> Option<&ObjectInfo> {
        match self {
            WorldEvent::ItemCollected { item, .. } => Some(item),
            WorldEvent::ObjectShot(o)
            | WorldEvent::ObjectDestroyed(o)
            | WorldEvent::ObjectTractored(o)
            | WorldEvent::ObjectReleased(o)
            | WorldEvent::AstronautDeath(o) => Some(o),
            WorldEvent::PlayerDeath | WorldEvent::RegionEntered => None,
        }
    }
}

/// Whether a handler consumed an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Handled,
    Unhandled,
}

/// Parties that can hold handler frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscriber {
    Game,
    Mission,
}

/// Identity of a pushed handler frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

#[derive(Debug, Clone)]
struct HandlerFrame<S> {
    id: FrameId,
    subscriber: S,
    kinds: Vec<EventKind>,
}

/// Stack of handler frames.
#[derive(Debug, Clone)]
pub struct EventBus<S> {
    frames: Vec<HandlerFrame<S>>,
    next_id: u64,
}

impl<S> Default for EventBus<S> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            next_id: 0,
        }
    }
}

impl<S: Clone> EventBus<S> {
    /// Push a frame handling `kinds` on behalf of `subscriber`.
    pub fn push_handlers(&mut self, subscriber: S, kinds: &[EventKind]) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id += 1;
        self.frames.push(HandlerFrame {
            id,
            subscriber,
            kinds: kinds.to_vec(),
        });
        id
    }

    /// Pop the most recently pushed frame.
    pub fn pop_handlers(&mut self) -> Option<S> {
        self.frames.pop().map(|f| f.subscriber)
    }

    /// Remove a specific frame wherever it sits in the stack. Removing a frame
    /// that is already gone is a no-op.
    pub fn remove_handlers(&mut self, id: FrameId) -> bool {
        let before = self.frames.len();
        self.frames.retain(|f| f.id != id);
        self.frames.len() != before
    }

    /// Subscribers for `kind`, most recently pushed first.
    pub fn route(&self, kind: EventKind) -> Vec<S> {
        self.frames
            .iter()
            .rev()
            .filter(|f| f.kinds.contains(&kind))
            .map(|f| f.subscriber.clone())
            .collect()
    }

    /// Offer `event` to each routed subscriber until one handles it.
    pub fn dispatch<F>(&self, event: &WorldEvent, mut handler: F) -> EventResult
    where
        F: FnMut(&S, &WorldEvent) -> EventResult,
    {
        for subscriber in self.route(event.kind()) {
            if handler(&subscriber, event) == EventResult::Handled {
                return EventResult::Handled;
            }
        }
        EventResult::Unhandled
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
