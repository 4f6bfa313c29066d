//! Mission scripting engine.
//!
//! A [`Mission`] is an ordered list of [`Step`]s plus a cursor. Running a
//! mission interprets steps one after another until one of them has to wait,
//! for a delay or for the player to do something. The mission then records
//! what it is waiting for in its [`MissionState`] and returns; a later timer
//! or world event resumes it.
//!
//! ```text
//! idle -> running -> waiting(condition) -> running -> ... -> finished
//!                          \-> failed (timeout, critical object lost)
//! ```
//!
//! The engine never blocks and owns no clock. Timers go through the
//! [`Clock`] in the [`ScriptContext`], and world events arrive through
//! [`Mission::on_event`].

pub mod campaign;
pub mod step;

pub use step::*;

use crate::components::{Name, Position, Velocity};
use crate::error::ScriptError;
use crate::events::{EventKind, EventResult, FrameId, ObjectInfo, Subscriber, WorldEvent};
use crate::hud::Colour;
use crate::interfaces::Sound;
use crate::registry::{ObjectClass, SpawnParams};
use crate::scheduler::Clock;
use crate::world::SpaceWorld;
use bevy_ecs::prelude::Entity;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Events a running mission listens to.
pub const MISSION_EVENTS: [EventKind; 7] = [
    EventKind::ObjectShot,
    EventKind::ItemCollected,
    EventKind::ObjectTractored,
    EventKind::RegionEntered,
    EventKind::AstronautDeath,
    EventKind::ObjectDestroyed,
    EventKind::ObjectReleased,
];

/// Timers a mission schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionTimer {
    /// A delay elapsed; resume the script.
    Advance,
    /// One second of the time limit elapsed.
    Countdown,
}

/// What a mission needs from its surroundings while it runs.
pub struct ScriptContext<'a> {
    pub world: &'a mut SpaceWorld,
    pub clock: &'a mut dyn Clock<MissionTimer>,
}

/// What a waiting mission is waiting for.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Delay,
    Collect { class: ObjectClass, remaining: u32 },
    Tractor { id: String },
    Release { id: String, region: Option<Region> },
    EnterRegion,
    Destroy { id: String },
    Earn { remaining: i64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum MissionState {
    #[default]
    Idle,
    Running,
    Waiting(Condition),
    Finished,
    Failed,
}

impl MissionState {
    /// Running or waiting: the mission reacts to events.
    pub fn is_live(&self) -> bool {
        matches!(self, MissionState::Running | MissionState::Waiting(_))
    }
}

/// Reported to the game flow when a mission ends by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionOutcome {
    Finished,
    Failed,
}

/// Serialized form of a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDef {
    pub name: String,
    pub steps: Vec<Step>,
}

/// A scripted mission and its run-time state.
#[derive(Debug, Clone, Default)]
pub struct Mission {
    name: String,
    steps: Vec<Step>,
    cursor: usize,
    state: MissionState,
    skipping: bool,
    frame: Option<FrameId>,
    /// Spawned objects that survive a restart, with the step that spawned them.
    persistent_items: Vec<(usize, Entity)>,
    /// Spawned objects and labels removed when the mission ends.
    nonpersistent_items: Vec<Entity>,
    /// Message parameters such as `astronaut.name`.
    params: HashMap<String, String>,
    shot_messages: HashMap<ObjectClass, (String, Colour)>,
    tractored_messages: HashMap<ObjectClass, (String, Colour)>,
    region_message: Option<(String, Colour)>,
    critical_objects: Vec<String>,
    time_limit: Option<i64>,
    outcomes: Vec<MissionOutcome>,
}

impl Mission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn from_def(def: MissionDef) -> Self {
        Self {
            name: def.name,
            steps: def.steps,
            ..Default::default()
        }
    }

    pub fn to_def(&self) -> MissionDef {
        MissionDef {
            name: self.name.clone(),
            steps: self.steps.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> &MissionState {
        &self.state
    }

    pub fn persistent_items(&self) -> Vec<Entity> {
        self.persistent_items.iter().map(|(_, e)| *e).collect()
    }

    pub fn nonpersistent_items(&self) -> &[Entity] {
        &self.nonpersistent_items
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Outcomes since the last call.
    pub fn take_outcomes(&mut self) -> Vec<MissionOutcome> {
        std::mem::take(&mut self.outcomes)
    }

    // ------------------------------------------------------------------
    // Script building
    // ------------------------------------------------------------------

    pub fn push(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn say(&mut self, message: &str, delay: f32) -> &mut Self {
        self.say_colour(message, Colour::Cyan, delay)
    }

    pub fn say_colour(&mut self, message: &str, colour: Colour, delay: f32) -> &mut Self {
        self.push(Step::Say {
            message: message.to_string(),
            colour,
            delay,
        })
    }

    pub fn goal(&mut self, title: &str) -> &mut Self {
        self.push(Step::Goal { title: title.to_string() })
    }

    pub fn spawn(&mut self, spawn: SpawnStep) -> &mut Self {
        self.push(Step::Spawn(spawn))
    }

    pub fn show_signpost(&mut self, id: &str) -> &mut Self {
        self.push(Step::ShowSignpost { id: id.to_string(), text: None })
    }

    pub fn player_must_collect(&mut self, class: ObjectClass, number: u32) -> &mut Self {
        self.push(Step::PlayerMustCollect { class, number })
    }

    pub fn player_must_tractor(&mut self, id: &str) -> &mut Self {
        self.push(Step::PlayerMustTractor { id: id.to_string() })
    }

    pub fn player_must_release(&mut self, id: &str) -> &mut Self {
        self.push(Step::PlayerMustRelease { id: id.to_string(), region: None })
    }

    pub fn player_must_release_in_region(&mut self, id: &str, region: Region) -> &mut Self {
        self.push(Step::PlayerMustRelease {
            id: id.to_string(),
            region: Some(region),
        })
    }

    pub fn player_must_enter_region(&mut self, region: Region) -> &mut Self {
        self.push(Step::PlayerMustEnterRegion { region })
    }

    pub fn player_must_destroy(&mut self, id: &str) -> &mut Self {
        self.push(Step::PlayerMustDestroy { id: id.to_string() })
    }

    pub fn player_must_earn(&mut self, credits: u32) -> &mut Self {
        self.push(Step::PlayerMustEarn { credits })
    }

    pub fn say_if_object_shot(&mut self, class: ObjectClass, message: &str, colour: Colour) -> &mut Self {
        self.push(Step::SayIfObjectShot {
            class,
            message: message.to_string(),
            colour,
        })
    }

    pub fn say_if_object_tractored(
        &mut self,
        class: ObjectClass,
        message: &str,
        colour: Colour,
    ) -> &mut Self {
        self.push(Step::SayIfObjectTractored {
            class,
            message: message.to_string(),
            colour,
        })
    }

    pub fn say_if_region_entered(&mut self, region: Region, message: &str, colour: Colour) -> &mut Self {
        self.push(Step::SayIfRegionEntered {
            region,
            message: message.to_string(),
            colour,
        })
    }

    pub fn fail_if_object_destroyed(&mut self, id: &str) -> &mut Self {
        self.push(Step::FailIfObjectDestroyed { id: id.to_string() })
    }

    pub fn set_time_limit(&mut self, seconds: u32) -> &mut Self {
        self.push(Step::SetTimeLimit { seconds })
    }

    pub fn clear_time_limit(&mut self) -> &mut Self {
        self.push(Step::ClearTimeLimit)
    }

    /// Steps added by `build` run under a time limit.
    pub fn with_time_limit<F>(&mut self, seconds: u32, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.set_time_limit(seconds);
        build(self);
        self.clear_time_limit()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Bind to the world: install handlers and reset per-run state.
    pub fn setup(&mut self, ctx: &mut ScriptContext<'_>) {
        if let Some(frame) = self.frame.take() {
            ctx.world.bus.remove_handlers(frame);
        }
        self.frame = Some(ctx.world.bus.push_handlers(Subscriber::Mission, &MISSION_EVENTS));

        self.cursor = 0;
        self.state = MissionState::Idle;
        self.skipping = false;
        self.params.clear();
        self.shot_messages.clear();
        self.tractored_messages.clear();
        self.region_message = None;
        self.critical_objects.clear();
        self.time_limit = None;
        self.outcomes.clear();
        ctx.world.hud.clear_messages();
        info!("mission: {}", self.name);
    }

    pub fn start(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        self.cursor = 0;
        self.state = MissionState::Running;
        self.next(ctx)
    }

    /// Run steps until one has to wait or the script ends.
    pub fn next(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        while self.state == MissionState::Running {
            let Some(step) = self.steps.get(self.cursor).cloned() else {
                self.state = MissionState::Finished;
                self.outcomes.push(MissionOutcome::Finished);
                info!("mission complete: {}", self.name);
                break;
            };
            self.cursor += 1;
            debug!("{} step {}: {:?}", self.name, self.cursor, step);
            self.run_step(&step, ctx)?;
        }
        Ok(())
    }

    fn advance(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        self.state = MissionState::Running;
        self.next(ctx)
    }

    /// Run every remaining step for its side effects, without waiting, then
    /// finish. Persistent objects end up as if the mission had been played.
    pub fn skip(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        self.skipping = true;
        self.state = MissionState::Running;
        ctx.clock.unschedule(&MissionTimer::Advance);
        let mut result = Ok(());
        while let Some(step) = self.steps.get(self.cursor).cloned() {
            self.cursor += 1;
            if let Err(e) = self.run_step(&step, ctx) {
                result = Err(e);
                break;
            }
        }
        self.skipping = false;
        ctx.world.hud.clear_messages();
        self.finish(ctx);
        self.state = MissionState::Finished;
        result
    }

    /// Tear down: cancel timers, remove non-persistent objects, clear the
    /// target region and uninstall handlers. Safe to call more than once.
    pub fn finish(&mut self, ctx: &mut ScriptContext<'_>) {
        ctx.clock.unschedule(&MissionTimer::Advance);
        self.cancel_time_limit(ctx);
        self.clear_items(ctx, true);
        self.params.clear();
        ctx.world.clear_target_region();
        if let Some(frame) = self.frame.take() {
            ctx.world.bus.remove_handlers(frame);
        }
        if self.state.is_live() {
            self.state = MissionState::Idle;
        }
    }

    /// Finish and also remove the persistent objects: a full revert.
    pub fn rewind(&mut self, ctx: &mut ScriptContext<'_>) {
        self.finish(ctx);
        self.clear_items(ctx, false);
        self.cursor = 0;
        self.state = MissionState::Idle;
    }

    /// Start again from the first step, keeping persistent objects.
    pub fn restart(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        self.finish(ctx);
        self.setup(ctx);
        self.start(ctx)
    }

    /// End the mission as failed. Handlers stay installed until restart.
    pub fn fail(&mut self, ctx: &mut ScriptContext<'_>) {
        if !self.state.is_live() {
            return;
        }
        ctx.world.say("{control}: Mission failed! Try again.", Colour::Red);
        ctx.clock.unschedule(&MissionTimer::Advance);
        self.cancel_time_limit(ctx);
        self.state = MissionState::Failed;
        self.outcomes.push(MissionOutcome::Failed);
        warn!("mission failed: {}", self.name);
    }

    fn clear_items(&mut self, ctx: &mut ScriptContext<'_>, nonpersistent_only: bool) {
        let mut items = std::mem::take(&mut self.nonpersistent_items);
        if !nonpersistent_only {
            items.extend(self.persistent_items.drain(..).map(|(_, e)| e));
        }
        for item in items {
            // Already dead is fine
            ctx.world.kill(item);
        }
    }

    fn cancel_time_limit(&mut self, ctx: &mut ScriptContext<'_>) {
        ctx.clock.unschedule(&MissionTimer::Countdown);
        ctx.world.hud.clear_countdown();
        self.time_limit = None;
    }

    // ------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------

    fn run_step(&mut self, step: &Step, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        match step {
            Step::Say { message, colour, delay } => {
                ctx.world.say_with(message, *colour, &self.params);
                self.cue(Sound::Message, ctx);
                self.wait(*delay, ctx);
            }
            Step::Goal { title } => {
                let message = format!("New mission: {}", title);
                ctx.world.say_with(&message, Colour::Green, &self.params);
                self.cue(Sound::Goal, ctx);
            }
            Step::Spawn(spawn) => {
                self.do_spawn(self.cursor - 1, spawn, ctx)?;
                self.wait(spawn.delay, ctx);
            }
            Step::ShowSignpost { id, text } => {
                let target = ctx
                    .world
                    .get_by_id(id)
                    .ok_or_else(|| ScriptError::UnknownObject(id.clone()))?;
                let text = match text {
                    Some(text) => text.clone(),
                    None => display_name(ctx.world, target),
                };
                let sign = ctx.world.spawn_label(ObjectClass::Signpost, text, target, (0.0, 0.0));
                self.nonpersistent_items.push(sign);
            }
            Step::PlayerMustCollect { class, number } => self.block(Condition::Collect {
                class: *class,
                remaining: (*number).max(1),
            }),
            Step::PlayerMustTractor { id } => self.block(Condition::Tractor { id: id.clone() }),
            Step::PlayerMustRelease { id, region } => self.block(Condition::Release {
                id: id.clone(),
                region: *region,
            }),
            Step::PlayerMustEnterRegion { region } => {
                ctx.world.set_target_region(region.center(), region.radius);
                self.block(Condition::EnterRegion);
            }
            Step::PlayerMustDestroy { id } => self.block(Condition::Destroy { id: id.clone() }),
            Step::PlayerMustEarn { credits } => self.block(Condition::Earn {
                remaining: *credits as i64,
            }),
            Step::SayIfObjectShot { class, message, colour } => {
                self.shot_messages.insert(*class, (message.clone(), *colour));
            }
            Step::SayIfObjectTractored { class, message, colour } => {
                self.tractored_messages.insert(*class, (message.clone(), *colour));
            }
            Step::SayIfRegionEntered { region, message, colour } => {
                ctx.world.set_target_region(region.center(), region.radius);
                self.region_message = Some((message.clone(), *colour));
            }
            Step::FailIfObjectDestroyed { id } => self.critical_objects.push(id.clone()),
            Step::SetTimeLimit { seconds } => {
                self.time_limit = Some(*seconds as i64);
                ctx.world.hud.set_countdown(*seconds as i32);
                if !self.skipping {
                    ctx.clock.unschedule(&MissionTimer::Countdown);
                    ctx.clock.schedule_periodic(MissionTimer::Countdown, 1.0);
                }
            }
            Step::ClearTimeLimit => self.cancel_time_limit(ctx),
        }
        Ok(())
    }

    fn block(&mut self, condition: Condition) {
        if !self.skipping {
            self.state = MissionState::Waiting(condition);
        }
    }

    fn wait(&mut self, delay: f32, ctx: &mut ScriptContext<'_>) {
        if self.skipping || delay <= 0.0 {
            return;
        }
        self.state = MissionState::Waiting(Condition::Delay);
        ctx.clock.schedule_once(MissionTimer::Advance, delay);
    }

    fn cue(&self, sound: Sound, ctx: &mut ScriptContext<'_>) {
        if !self.skipping {
            let at = ctx.world.camera();
            ctx.world.play(sound, at);
        }
    }

    /// Spawn the object of step `index`. A persistent object the same step
    /// created on an earlier run is reused while it is still alive.
    fn do_spawn(
        &mut self,
        index: usize,
        spawn: &SpawnStep,
        ctx: &mut ScriptContext<'_>,
    ) -> Result<(), ScriptError> {
        let world = &*ctx.world;
        self.persistent_items.retain(|(_, e)| world.is_alive(*e));
        let kept = self
            .persistent_items
            .iter()
            .find(|(step, _)| *step == index)
            .map(|(_, e)| *e);

        let entity = match kept {
            Some(entity) if spawn.persistent => entity,
            _ => {
                if let Some(id) = &spawn.id {
                    if let Some(existing) = ctx.world.get_by_id(id) {
                        ctx.world.kill(existing);
                    }
                }
                let entity = self.spawn_object(spawn, ctx)?;
                if spawn.persistent {
                    self.persistent_items.push((index, entity));
                } else {
                    self.nonpersistent_items.push(entity);
                }
                entity
            }
        };

        let signpost = match &spawn.signpost {
            Some(Signpost::Text(text)) => Some(text.clone()),
            Some(Signpost::UseName(true)) => Some(display_name(ctx.world, entity)),
            Some(Signpost::UseName(false)) | None => None,
        };
        if let Some(text) = signpost {
            let sign = ctx.world.spawn_label(ObjectClass::Signpost, text, entity, (0.0, 0.0));
            self.nonpersistent_items.push(sign);
        }

        let name = ctx.world.ecs().get::<Name>(entity).map(|n| n.0.clone());
        if let Some(name) = &name {
            let label = ctx
                .world
                .spawn_label(ObjectClass::Label, name.clone(), entity, (30.0, 15.0));
            self.nonpersistent_items.push(label);
        }

        if let Some(id) = &spawn.id {
            ctx.world.set_id(entity, id);
            self.params
                .insert(format!("{}.name", id), name.unwrap_or_default());
        }
        Ok(())
    }

    fn spawn_object(&self, spawn: &SpawnStep, ctx: &mut ScriptContext<'_>) -> Result<Entity, ScriptError> {
        let position = match spawn.at {
            Placement::At(x, y) => Position::new(x, y),
            Placement::AboveMoonbase => ctx.world.above_moonbase(),
        };
        let velocity = spawn
            .velocity
            .map(|(vx, vy)| Velocity::new(vx, vy))
            .unwrap_or_default();
        let params = SpawnParams::at(position)
            .with_velocity(velocity)
            .with_rotation(spawn.rotation)
            .with_destination(spawn.destination.clone())
            .with_name(spawn.name.clone());
        Ok(ctx.world.spawn_class(spawn.class, &params)?)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Timer callback.
    pub fn on_timer(
        &mut self,
        timer: MissionTimer,
        ctx: &mut ScriptContext<'_>,
    ) -> Result<(), ScriptError> {
        match timer {
            MissionTimer::Advance => {
                if self.state == MissionState::Waiting(Condition::Delay) {
                    return self.advance(ctx);
                }
            }
            MissionTimer::Countdown => {
                let Some(remaining) = self.time_limit.as_mut() else {
                    ctx.clock.unschedule(&MissionTimer::Countdown);
                    return Ok(());
                };
                *remaining -= 1;
                let remaining = *remaining;
                if remaining < 0 {
                    self.cancel_time_limit(ctx);
                    ctx.world.say("You ran out of time!", Colour::Red);
                    self.fail(ctx);
                } else {
                    ctx.world.hud.set_countdown(remaining as i32);
                }
            }
        }
        Ok(())
    }

    /// World event callback. Missions observe events without consuming them.
    pub fn on_event(
        &mut self,
        event: &WorldEvent,
        ctx: &mut ScriptContext<'_>,
    ) -> Result<EventResult, ScriptError> {
        if !self.state.is_live() {
            return Ok(EventResult::Unhandled);
        }
        match event {
            WorldEvent::RegionEntered => self.on_region_entered(ctx)?,
            WorldEvent::ItemCollected { item, .. } => self.on_item_collected(item, ctx)?,
            WorldEvent::ObjectShot(item) => {
                if let Some((message, colour)) = self.shot_messages.remove(&item.class) {
                    ctx.world.say_with(&message, colour, &self.params);
                }
            }
            WorldEvent::ObjectDestroyed(item) => self.on_object_destroyed(item, ctx)?,
            WorldEvent::ObjectTractored(item) => self.on_object_tractored(item, ctx)?,
            WorldEvent::ObjectReleased(item) => self.on_object_released(item, ctx)?,
            WorldEvent::AstronautDeath(astronaut) => {
                let name = astronaut.name.as_deref().unwrap_or("an astronaut");
                let message = format!("{{control}}: Oh my god! You killed {}! You bastard!", name);
                ctx.world.say(&message, Colour::Cyan);
            }
            WorldEvent::PlayerDeath => {}
        }
        Ok(EventResult::Unhandled)
    }

    fn on_region_entered(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        if let Some((message, colour)) = self.region_message.take() {
            ctx.world.say_with(&message, colour, &self.params);
        }
        if self.state == MissionState::Waiting(Condition::EnterRegion) {
            return self.advance(ctx);
        }
        Ok(())
    }

    fn on_item_collected(&mut self, item: &ObjectInfo, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        match &mut self.state {
            MissionState::Waiting(Condition::Collect { class, remaining }) if *class == item.class => {
                *remaining = remaining.saturating_sub(1);
                let left = *remaining;
                if left == 0 {
                    return self.advance(ctx);
                }
                let message = format!("Good work! You need to collect {} more.", left);
                ctx.world.say(&message, Colour::Green);
            }
            MissionState::Waiting(Condition::Earn { remaining }) => {
                *remaining -= item.value as i64;
                let left = *remaining;
                if left <= 0 {
                    return self.advance(ctx);
                }
                let message = format!("Good work! You need to collect {} more credits.", left);
                ctx.world.say(&message, Colour::Cyan);
            }
            _ => {}
        }
        Ok(())
    }

    fn on_object_destroyed(&mut self, item: &ObjectInfo, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        let Some(id) = &item.id else {
            return Ok(());
        };
        if self.critical_objects.contains(id) {
            ctx.world.say("{control}: Mission critical object was destroyed!", Colour::Red);
            self.fail(ctx);
        } else if matches!(&self.state, MissionState::Waiting(Condition::Destroy { id: target }) if target == id)
        {
            ctx.world.say("{control}: All targets destroyed!", Colour::Cyan);
            return self.advance(ctx);
        }
        Ok(())
    }

    fn on_object_tractored(&mut self, item: &ObjectInfo, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        if let Some((message, colour)) = self.tractored_messages.remove(&item.class) {
            ctx.world.say_with(&message, colour, &self.params);
        }
        let wanted = matches!(
            &self.state,
            MissionState::Waiting(Condition::Tractor { id }) if item.id.as_ref() == Some(id)
        );
        if wanted {
            return self.advance(ctx);
        }
        Ok(())
    }

    fn on_object_released(&mut self, item: &ObjectInfo, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        let MissionState::Waiting(Condition::Release { id, region }) = &self.state else {
            return Ok(());
        };
        if item.id.as_ref() != Some(id) {
            return Ok(());
        }
        if let Some(region) = region {
            if !region.contains(item.position) {
                return Ok(());
            }
        }
        self.advance(ctx)
    }
}

/// Name of an object, or its class name if it has none.
fn display_name(world: &SpaceWorld, entity: Entity) -> String {
    if let Some(name) = world.ecs().get::<Name>(entity) {
        return name.0.clone();
    }
    world
        .object_info(entity)
        .map(|info| info.class.display_name().to_string())
        .unwrap_or_default()
}

/// Parse a JSON array of missions.
pub fn load_missions(json: &str) -> Result<Vec<Mission>, ScriptError> {
    let defs: Vec<MissionDef> = serde_json::from_str(json)?;
    if defs.is_empty() {
        return Err(ScriptError::NoMissions);
    }
    Ok(defs.into_iter().map(Mission::from_def).collect())
}

pub fn load_missions_file(path: impl AsRef<Path>) -> Result<Vec<Mission>, ScriptError> {
    let contents = std::fs::read_to_string(path)?;
    load_missions(&contents)
}

/// Serialize missions to pretty JSON, the format [`load_missions`] reads.
pub fn missions_to_json(missions: &[Mission]) -> Result<String, ScriptError> {
    let defs: Vec<MissionDef> = missions.iter().map(Mission::to_def).collect();
    Ok(serde_json::to_string_pretty(&defs)?)
}
