//! Game flow: mission sequencing, respawns, key handling and the frame loop.
//!
//! ## Fixed Timestep
//!
//! Hosts call [`Game::step`] with wall-clock time. The game accumulates it
//! and runs as many fixed updates as fit, so the simulation behaves the same
//! at any frame rate.
//!
//! ## Frame order
//!
//! 1. The world updates (physics, collisions, reactions).
//! 2. Events raised during the update are routed through the handler stack.
//! 3. The timer queue advances and due tasks run.
//! 4. Mission outcomes (finish, failure) are turned into follow-up tasks.
//!
//! Nothing here returns an error to the host. Broken mission definitions and
//! failed steps are logged and the frame loop carries on.

use crate::config::GameConfig;
use crate::error::{GameError, ScriptError};
use crate::events::{EventKind, EventResult, FrameId, Subscriber, WorldEvent};
use crate::hud::Colour;
use crate::interfaces::{AudioPlayer, Key, Renderer};
use crate::mission::campaign::campaign;
use crate::mission::{load_missions_file, Mission, MissionOutcome, MissionTimer, ScriptContext};
use crate::persist::MissionStateFile;
use crate::scheduler::{Clock, Scheduler};
use crate::ships;
use crate::snapshot::WorldSnapshot;
use crate::world::SpaceWorld;
use log::{error, info, warn};

/// Delay between the player's death and the respawn.
pub const RESPAWN_DELAY: f32 = 2.0;
/// Delay between finishing a mission and starting the next.
pub const NEXT_MISSION_DELAY: f32 = 5.0;
/// Delay between failing a mission and restarting it.
pub const FAILURE_RESTART_DELAY: f32 = 5.0;

/// Work the game schedules on its timer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameTask {
    Mission(MissionTimer),
    Respawn,
    RestartMission,
    NextMission,
}

/// Lets a mission schedule its timers on the game's queue.
struct MissionClock<'a> {
    scheduler: &'a mut Scheduler<GameTask>,
}

impl Clock<MissionTimer> for MissionClock<'_> {
    fn schedule_once(&mut self, task: MissionTimer, delay: f32) {
        self.scheduler.schedule_once(GameTask::Mission(task), delay);
    }

    fn schedule_periodic(&mut self, task: MissionTimer, interval: f32) {
        self.scheduler.schedule_periodic(GameTask::Mission(task), interval);
    }

    fn unschedule(&mut self, task: &MissionTimer) -> usize {
        self.scheduler.unschedule(&GameTask::Mission(*task))
    }
}

/// A game session: the world, the campaign and the flow between missions.
pub struct Game {
    world: SpaceWorld,
    missions: Vec<Mission>,
    /// Index of the selected mission; may point past the last one.
    mission_index: usize,
    /// The mission currently bound to the world, if any.
    active: Option<usize>,
    scheduler: Scheduler<GameTask>,
    state_file: MissionStateFile,
    /// Accumulated time for fixed timestep.
    accumulator: f32,
    frame: FrameId,
}

impl Game {
    /// Create a session with the missions named in the configuration, or the
    /// built-in campaign.
    pub fn new(config: GameConfig) -> Self {
        let missions = match &config.mission_definitions {
            Some(path) => load_missions_file(path).unwrap_or_else(|e| {
                warn!("could not load missions from {:?}: {}", path, e);
                campaign(config.seed)
            }),
            None => campaign(config.seed),
        };
        Self::with_missions(config, missions)
    }

    pub fn with_missions(config: GameConfig, missions: Vec<Mission>) -> Self {
        let state_file = MissionStateFile::new(config.mission_file.clone());
        let mut world = SpaceWorld::new(config);
        world.setup();
        let frame = world.bus.push_handlers(Subscriber::Game, &[EventKind::PlayerDeath]);
        info!("game created with {} missions", missions.len());
        Self {
            world,
            missions,
            mission_index: 0,
            active: None,
            scheduler: Scheduler::new(),
            state_file,
            accumulator: 0.0,
            frame,
        }
    }

    pub fn world(&self) -> &SpaceWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SpaceWorld {
        &mut self.world
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    /// 1-based number of the selected mission.
    pub fn mission_number(&self) -> usize {
        self.mission_index + 1
    }

    /// The running mission, if any.
    pub fn current_mission(&self) -> Option<&Mission> {
        self.active.and_then(|i| self.missions.get(i))
    }

    pub fn scheduler(&self) -> &Scheduler<GameTask> {
        &self.scheduler
    }

    pub fn handler_frame(&self) -> FrameId {
        self.frame
    }

    /// Select mission `number` (1-based) without starting it.
    pub fn set_mission(&mut self, number: usize) {
        self.mission_index = number.saturating_sub(1);
    }

    /// Start the selected mission.
    pub fn start(&mut self) {
        self.start_mission();
    }

    /// Start the mission recorded in the state file.
    pub fn resume(&mut self) {
        let number = self.state_file.load_or_default();
        info!("resuming at mission {}", number);
        self.set_mission(number);
        self.start_mission();
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Feed wall-clock time; runs zero or more fixed updates.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self.world.config().fixed_timestep;
        self.accumulator += dt;
        while self.accumulator >= fixed_dt {
            self.update(fixed_dt);
            self.accumulator -= fixed_dt;
        }
    }

    /// Run one frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.world.update(dt);
        self.dispatch_events();

        self.scheduler.advance(dt);
        while let Some(task) = self.scheduler.pop_due() {
            if let Err(e) = self.run_task(task) {
                error!("{:?} failed: {}", task, e);
            }
            self.process_outcomes();
        }
        self.process_outcomes();
    }

    pub fn draw(&mut self, renderer: &mut dyn Renderer) {
        self.world.draw(renderer);
    }

    pub fn flush_sounds(&mut self, audio: &mut dyn AudioPlayer) {
        self.world.flush_sounds(audio);
    }

    pub fn snapshot(&mut self) -> WorldSnapshot {
        self.world.snapshot()
    }

    fn dispatch_events(&mut self) {
        // Handlers may raise further events; deliver those too.
        loop {
            let events = self.world.drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.route_event(&event);
                self.process_outcomes();
            }
        }
    }

    fn route_event(&mut self, event: &WorldEvent) {
        let mut mission_seen = false;
        for subscriber in self.world.bus.route(event.kind()) {
            let result = match subscriber {
                Subscriber::Game => self.on_world_event(event),
                Subscriber::Mission if !mission_seen => {
                    mission_seen = true;
                    self.mission_event(event)
                }
                Subscriber::Mission => EventResult::Unhandled,
            };
            if result == EventResult::Handled {
                break;
            }
        }
    }

    fn mission_event(&mut self, event: &WorldEvent) -> EventResult {
        let Some(index) = self.active else {
            return EventResult::Unhandled;
        };
        match self.with_mission(index, |m, ctx| m.on_event(event, ctx)) {
            Some(Ok(result)) => result,
            Some(Err(e)) => {
                error!("mission failed handling {:?}: {}", event.kind(), e);
                EventResult::Unhandled
            }
            None => EventResult::Unhandled,
        }
    }

    fn on_world_event(&mut self, event: &WorldEvent) -> EventResult {
        match event {
            WorldEvent::PlayerDeath => {
                self.scheduler.schedule_once(GameTask::Respawn, RESPAWN_DELAY);
                self.scheduler.schedule_once(GameTask::RestartMission, RESPAWN_DELAY);
                EventResult::Handled
            }
            _ => EventResult::Unhandled,
        }
    }

    fn run_task(&mut self, task: GameTask) -> Result<(), GameError> {
        match task {
            GameTask::Mission(timer) => {
                if let Some(index) = self.active {
                    if let Some(result) = self.with_mission(index, |m, ctx| m.on_timer(timer, ctx)) {
                        result?;
                    }
                } else {
                    self.scheduler.unschedule(&task);
                }
            }
            GameTask::Respawn => self.respawn(),
            GameTask::RestartMission => self.restart_mission()?,
            GameTask::NextMission => self.next_mission(),
        }
        Ok(())
    }

    /// Run `f` with mission `index` bound to the world and the timer queue.
    fn with_mission<R, F>(&mut self, index: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut Mission, &mut ScriptContext<'_>) -> R,
    {
        let mission = self.missions.get_mut(index)?;
        let mut clock = MissionClock {
            scheduler: &mut self.scheduler,
        };
        let mut ctx = ScriptContext {
            world: &mut self.world,
            clock: &mut clock,
        };
        Some(f(mission, &mut ctx))
    }

    fn process_outcomes(&mut self) {
        let Some(index) = self.active else {
            return;
        };
        let outcomes = self
            .missions
            .get_mut(index)
            .map(Mission::take_outcomes)
            .unwrap_or_default();
        for outcome in outcomes {
            match outcome {
                MissionOutcome::Finished => self.on_mission_finish(),
                MissionOutcome::Failed => self.on_failure(),
            }
        }
    }

    // ------------------------------------------------------------------
    // Mission flow
    // ------------------------------------------------------------------

    fn start_mission(&mut self) {
        self.scheduler.unschedule(&GameTask::NextMission);
        self.scheduler.unschedule(&GameTask::RestartMission);

        if let Some(previous) = self.active.take() {
            self.with_mission(previous, |m, ctx| m.finish(ctx));
        }

        let index = self.mission_index;
        if index >= self.missions.len() {
            self.world.say("Well done! You have completed the game!", Colour::Gold);
            info!("campaign complete");
            return;
        }

        self.active = Some(index);
        let started = self.with_mission(index, |m, ctx| {
            m.setup(ctx);
            m.start(ctx)
        });
        if let Some(Err(e)) = started {
            error!("mission {} failed to start: {}", index + 1, e);
        }
        if let Err(e) = self.state_file.save(index + 1) {
            warn!("could not save mission state: {}", e);
        }
        self.process_outcomes();
    }

    fn on_mission_finish(&mut self) {
        self.world.say("Mission complete!", Colour::Gold);
        let bonus = self.world.config().mission_bonus;
        self.world.give_money(bonus);
        self.scheduler.unschedule(&GameTask::NextMission);
        self.scheduler.schedule_once(GameTask::NextMission, NEXT_MISSION_DELAY);
    }

    fn on_failure(&mut self) {
        self.scheduler.schedule_once(GameTask::RestartMission, FAILURE_RESTART_DELAY);
    }

    fn respawn(&mut self) {
        if self.world.spawn_player(false).is_some() {
            self.world.say("{control}: Please treat this ship more carefully!", Colour::Cyan);
            return;
        }
        // Game over
        if let Some(index) = self.active.take() {
            self.with_mission(index, |m, ctx| m.finish(ctx));
        }
        self.scheduler.unschedule(&GameTask::RestartMission);
        self.scheduler.unschedule(&GameTask::NextMission);
    }

    /// Restart the running mission, keeping its persistent objects.
    pub fn restart_mission(&mut self) -> Result<(), ScriptError> {
        // Death and a lost critical object can both have queued a restart
        self.scheduler.unschedule(&GameTask::RestartMission);
        self.scheduler.unschedule(&GameTask::NextMission);
        let Some(index) = self.active else {
            return Ok(());
        };
        info!("restarting mission {}", index + 1);
        let result = self
            .with_mission(index, |m, ctx| m.restart(ctx))
            .unwrap_or(Ok(()));
        self.process_outcomes();
        result
    }

    /// Skip the running mission and start the next one.
    pub fn next_mission(&mut self) {
        self.mission_index += 1;
        info!("skipping to mission {}", self.mission_index + 1);
        if let Some(index) = self.active.take() {
            if let Some(Err(e)) = self.with_mission(index, |m, ctx| m.skip(ctx)) {
                error!("error while skipping mission {}: {}", index + 1, e);
            }
            // Skipping finishes without paying out
            if let Some(m) = self.missions.get_mut(index) {
                m.take_outcomes();
            }
        }
        self.start_mission();
    }

    /// Undo the running mission and start the previous one.
    pub fn previous_mission(&mut self) {
        self.mission_index = self.mission_index.saturating_sub(1);
        info!("rewinding to mission {}", self.mission_index + 1);
        if let Some(index) = self.active.take() {
            self.with_mission(index, |m, ctx| {
                m.rewind(ctx);
                m.take_outcomes();
            });
        }
        self.start_mission();
    }

    /// Re-read mission definitions and restart the current mission.
    ///
    /// When the new definitions fail to load, the old ones stay in place and
    /// the running mission is left alone.
    pub fn reload_missions(&mut self) -> Result<(), ScriptError> {
        let config = self.world.config();
        let missions = match &config.mission_definitions {
            Some(path) => load_missions_file(path)?,
            None => campaign(config.seed),
        };
        if let Some(index) = self.active.take() {
            self.with_mission(index, |m, ctx| m.rewind(ctx));
        }
        self.missions = missions;
        info!("missions reloaded ({})", self.missions.len());
        self.start_mission();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn key_down(&mut self, key: Key) {
        self.world.input_mut().press(key);
        self.on_key_press(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.world.input_mut().release(key);
    }

    /// One-shot actions bound to key presses.
    pub fn on_key_press(&mut self, key: Key) {
        if key == Key::Z {
            self.world.fire_or_release();
            return;
        }
        if !self.world.config().cheats {
            return;
        }
        match key {
            Key::F3 => self.next_mission(),
            Key::F4 => self.previous_mission(),
            Key::F5 => {
                if let Err(e) = self.reload_missions() {
                    error!("mission reload failed: {}", e);
                }
            }
            Key::F6 | Key::F7 | Key::F8 => {
                let name = match key {
                    Key::F6 => "cutter",
                    Key::F7 => "lugger",
                    _ => "clipper",
                };
                if let Some(model) = ships::by_name(name) {
                    self.world.set_player_ship(model);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{MissionState, SpawnStep};
    use crate::registry::{ObjectClass, SpawnParams};
    use crate::ships::LUGGER;

    fn config(dir: &tempfile::TempDir) -> GameConfig {
        GameConfig {
            mission_file: dir.path().join(".mission"),
            ..GameConfig::without_asteroids()
        }
    }

    fn two_missions() -> Vec<Mission> {
        let mut first = Mission::new("First");
        first.say("hello", 1.0);
        let mut second = Mission::new("Second");
        second
            .spawn(SpawnStep::at(ObjectClass::Marker, 500.0, 500.0).transient())
            .player_must_collect(ObjectClass::Marker, 1);
        vec![first, second]
    }

    fn run(game: &mut Game, seconds: f32) {
        let frames = (seconds / 0.1).round() as usize;
        for _ in 0..frames {
            game.update(0.1);
        }
    }

    fn last_message(game: &Game) -> String {
        game.world()
            .hud
            .messages()
            .last()
            .map(|m| m.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_start_saves_mission_number() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::with_missions(config(&dir), two_missions());
        game.set_mission(2);
        game.start();

        assert_eq!(game.mission_number(), 2);
        assert_eq!(std::fs::read_to_string(dir.path().join(".mission")).unwrap(), "2");
        assert!(game.current_mission().unwrap().state().is_live());
    }

    #[test]
    fn test_resume_reads_state_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".mission"), "2").unwrap();
        let mut game = Game::with_missions(config(&dir), two_missions());
        game.resume();
        assert_eq!(game.current_mission().unwrap().name(), "Second");
    }

    #[test]
    fn test_finish_pays_bonus_and_moves_on() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::with_missions(config(&dir), two_missions());
        game.start();
        let money = game.world().money();

        run(&mut game, 1.5);
        assert_eq!(game.current_mission().unwrap().state(), &MissionState::Finished);
        assert_eq!(game.world().money(), money + 100);
        assert_eq!(game.scheduler().pending(&GameTask::NextMission), 1);

        run(&mut game, 5.0);
        assert_eq!(game.mission_number(), 2);
        assert_eq!(game.current_mission().unwrap().name(), "Second");
    }

    #[test]
    fn test_completing_the_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::with_missions(config(&dir), two_missions());
        game.set_mission(3);
        game.start();
        assert!(game.current_mission().is_none());
        assert_eq!(last_message(&game), "Well done! You have completed the game!");
    }

    #[test]
    fn test_player_death_respawns_and_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::with_missions(config(&dir), two_missions());
        game.set_mission(2);
        game.start();
        let money = game.world().money();

        let pos = game.world().player_position().unwrap();
        let rock = game
            .world_mut()
            .spawn_class(ObjectClass::Asteroid, &SpawnParams::at(pos))
            .unwrap();
        game.update(0.1);
        assert!(game.world().player().is_none());
        game.world_mut().kill(rock);
        assert_eq!(game.scheduler().pending(&GameTask::Respawn), 1);

        run(&mut game, 2.0);
        assert!(game.world().player().is_some());
        assert_eq!(game.world().money(), money - 50);
        assert!(game.current_mission().unwrap().state().is_live());
    }

    #[test]
    fn test_game_over_without_credits() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::with_missions(config(&dir), two_missions());
        game.set_mission(2);
        game.start();
        game.world_mut().give_money(-100);

        let pos = game.world().player_position().unwrap();
        game.world_mut()
            .spawn_class(ObjectClass::Asteroid, &SpawnParams::at(pos))
            .unwrap();
        game.update(0.1);
        run(&mut game, 2.5);

        assert!(game.world().player().is_none());
        assert!(game.current_mission().is_none());
        assert_eq!(last_message(&game), "Game over");
    }

    #[test]
    fn test_cheat_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&dir);
        cfg.cheats = true;
        let mut game = Game::with_missions(cfg, two_missions());
        game.start();

        game.on_key_press(Key::F3);
        assert_eq!(game.current_mission().unwrap().name(), "Second");
        let marker = game.current_mission().unwrap().nonpersistent_items()[0];

        game.on_key_press(Key::F4);
        assert_eq!(game.current_mission().unwrap().name(), "First");
        assert!(!game.world().is_alive(marker));

        game.on_key_press(Key::F7);
        assert_eq!(game.world().current_ship(), LUGGER);
    }

    #[test]
    fn test_cheat_keys_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::with_missions(config(&dir), two_missions());
        game.start();
        game.on_key_press(Key::F3);
        assert_eq!(game.mission_number(), 1);
    }

    #[test]
    fn test_bad_reload_keeps_missions() {
        let dir = tempfile::tempdir().unwrap();
        let defs = dir.path().join("missions.json");
        std::fs::write(&defs, "not json").unwrap();
        let mut cfg = config(&dir);
        cfg.mission_definitions = Some(defs);

        let mut game = Game::with_missions(cfg, two_missions());
        game.start();
        assert!(game.reload_missions().is_err());
        assert_eq!(game.missions().len(), 2);
        assert!(game.current_mission().unwrap().state().is_live());
    }

    #[test]
    fn test_fixed_timestep_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::with_missions(config(&dir), two_missions());
        game.step(0.5 / 60.0);
        assert_eq!(game.world().tick(), 0);
        game.step(3.6 / 60.0);
        assert_eq!(game.world().tick(), 4);
    }
}
