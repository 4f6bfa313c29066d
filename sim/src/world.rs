//! Space world - the entity registry and per-frame update.
//!
//! `SpaceWorld` owns the ECS world and the system schedule, the id map, the
//! event queue and the handler bus. Systems only read and compute; anything
//! that creates or destroys entities (kills, contact reactions, spawns) is
//! applied here after the schedule has run, so the spatial index, the id map
//! and tether links are always updated together.

use crate::collision::{CollisionGroups, Contact, ContactBuffer, Reaction, Role};
use crate::components::*;
use crate::config::{GameConfig, MOONBASE_NAME};
use crate::error::SpawnError;
use crate::events::{EventBus, ObjectInfo, Subscriber, WorldEvent};
use crate::hud::{format_message, Colour, Hud};
use crate::interfaces::{AudioPlayer, DrawItem, InputState, Renderer, Sound, SoundCue};
use crate::registry::{self, ObjectClass, ObjectRegistry, SpawnParams, BULLET_SPEED};
use crate::ships::{ShipModel, CUTTER};
use crate::spatial::{Rect, SpatialIndex};
use crate::systems::*;
use bevy_ecs::prelude::*;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

/// Speed at which a fragment leaves a shot rock.
pub const EJECT_SPEED: f32 = 50.0;
/// Random extra speed added to an ejected fragment.
pub const EJECT_RANDOMNESS: f32 = 30.0;
/// Area (as r²) a rock loses per fragment.
pub const FRAGMENT_AREA: f32 = 81.0;
/// Rocks that shrink below this radius break up completely.
pub const MIN_ROCK_RADIUS: f32 = 10.0;

const MOON_SPIN: f32 = 5.0;
const MOONBASE_OFFSET: (f32, f32) = (0.0, 130.0);
const ABOVE_MOONBASE: (f32, f32) = (0.0, 220.0);
const SHIP_LABEL_OFFSET: (f32, f32) = (0.0, 20.0);
const MOONBASE_LABEL_OFFSET: (f32, f32) = (30.0, 15.0);

const ASTRONAUT_NAMES: &[&str] = &[
    "Sally", "Ivan", "Yuri", "Valentina", "Neil", "Buzz", "Michael", "Helen", "Chris", "Eileen",
    "Svetlana", "Pete", "Gene", "Jim", "Kalpana", "Alexei",
];

/// Circle the player is asked to fly into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRegion {
    pub center: Position,
    pub radius: f32,
    inside: bool,
}

impl TargetRegion {
    pub fn contains(&self, pos: Position) -> bool {
        pos.distance2_to(&self.center) < self.radius * self.radius
    }

    /// Whether the player was inside at the last check.
    pub fn player_inside(&self) -> bool {
        self.inside
    }
}

/// Per-model counters for ship names ("Lugger 1", "Lugger 2", ...).
#[derive(Debug, Default)]
struct NameBook {
    ships: HashMap<&'static str, u32>,
}

/// The simulation: entities, schedule, and the game state around them.
pub struct SpaceWorld {
    world: World,
    schedule: Schedule,
    config: GameConfig,
    registry: ObjectRegistry,
    ids: HashMap<String, Entity>,
    events: Vec<WorldEvent>,
    /// Handler frames for world events.
    pub bus: EventBus<Subscriber>,
    pub hud: Hud,
    money: i64,
    camera: Position,
    target_region: Option<TargetRegion>,
    player: Option<Entity>,
    player_label: Option<Entity>,
    player_name: String,
    current_ship: ShipModel,
    moon: Option<Entity>,
    names: NameBook,
    rng: StdRng,
    sounds: Vec<SoundCue>,
    tick: u64,
    time: f64,
}

impl SpaceWorld {
    /// Empty world with resources and systems installed.
    pub fn new(config: GameConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(SpatialIndex::new(config.cell_size));
        world.insert_resource(ActiveSet::default());
        world.insert_resource(ContactBuffer::default());
        world.insert_resource(KillQueue::default());
        world.insert_resource(SpawnQueue::default());
        world.insert_resource(InputState::default());
        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SimTick::default());
        world.insert_resource(config.clone());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                player_motion_system,
                drift_system,
                mounted_system,
                follower_system,
                lifetime_system,
                droid_system,
                fat_bounds_system,
                crate::collision::collision_gather_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            registry: ObjectRegistry::standard(),
            ids: HashMap::new(),
            events: Vec::new(),
            bus: EventBus::default(),
            hud: Hud::default(),
            money: 0,
            camera: config.player_spawn,
            target_region: None,
            player: None,
            player_label: None,
            player_name: String::new(),
            current_ship: CUTTER,
            moon: None,
            names: NameBook::default(),
            rng: StdRng::seed_from_u64(config.seed),
            sounds: Vec::new(),
            tick: 0,
            time: 0.0,
            config,
        }
    }

    /// Populate a new game: moon and moonbase, asteroid field, starting
    /// money and a free ship.
    pub fn setup(&mut self) {
        self.spawn_moon();
        self.generate_asteroids(self.config.asteroid_count);
        self.give_money(self.config.initial_money);
        self.spawn_player(true);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn ecs(&self) -> &World {
        &self.world
    }

    pub fn ecs_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn registry_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    pub fn index(&self) -> &SpatialIndex {
        self.world.resource::<SpatialIndex>()
    }

    pub fn input_mut(&mut self) -> Mut<'_, InputState> {
        self.world.resource_mut::<InputState>()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn money(&self) -> i64 {
        self.money
    }

    pub fn camera(&self) -> Position {
        self.camera
    }

    pub fn target_region(&self) -> Option<&TargetRegion> {
        self.target_region.as_ref()
    }

    pub fn moon(&self) -> Option<Entity> {
        self.moon
    }

    pub fn current_ship(&self) -> ShipModel {
        self.current_ship
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// The player ship, if it is alive.
    pub fn player(&self) -> Option<Entity> {
        self.player.filter(|e| self.is_alive(*e))
    }

    pub fn player_position(&self) -> Option<Position> {
        self.player().and_then(|e| self.world.get::<Position>(e).copied())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world.entities().contains(entity)
    }

    pub fn position_of(&self, entity: Entity) -> Option<Position> {
        self.world.get::<Position>(entity).copied()
    }

    /// Number of live entities of `class`.
    pub fn count_class(&mut self, class: ObjectClass) -> usize {
        let mut query = self.world.query::<&Class>();
        query.iter(&self.world).filter(|c| c.0 == class).count()
    }

    // ------------------------------------------------------------------
    // Entity lifecycle
    // ------------------------------------------------------------------

    /// Spawn a bundle. Collidable bodies are registered in the spatial index.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.world.spawn(bundle).id();
        self.register_bounds(entity);
        entity
    }

    /// Spawn an object by class through the registry.
    pub fn spawn_class(
        &mut self,
        class: ObjectClass,
        params: &SpawnParams,
    ) -> Result<Entity, SpawnError> {
        let factory = self.registry.factory(class)?;
        let entity = factory(self, params);
        debug!("spawned {:?} as {:?} at ({:.0}, {:.0})", class, entity, params.position.x, params.position.y);
        Ok(entity)
    }

    pub fn spawn_label(
        &mut self,
        class: ObjectClass,
        text: impl Into<String>,
        target: Entity,
        offset: (f32, f32),
    ) -> Entity {
        self.spawn(LabelBundle::new(class, text, target, offset))
    }

    fn register_bounds(&mut self, entity: Entity) {
        let (Some(pos), Some(collider)) = (
            self.world.get::<Position>(entity).copied(),
            self.world.get::<Collider>(entity).copied(),
        ) else {
            return;
        };
        let bounds = FatBounds::compute(pos, collider.radius, self.config.fat_margin);
        self.world.entity_mut(entity).insert(bounds);
        self.world.resource_mut::<SpatialIndex>().insert(bounds.rect, entity);
    }

    /// Re-register after a position or radius was changed outside the
    /// schedule.
    fn refresh_bounds(&mut self, entity: Entity) {
        if let Some(old) = self.world.get::<FatBounds>(entity).copied() {
            self.world.resource_mut::<SpatialIndex>().remove(old.rect, entity);
        }
        self.register_bounds(entity);
    }

    /// Remove an entity from the world, the index and the id map.
    ///
    /// Tether links are broken first. Returns false if it was already dead.
    pub fn kill(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            debug!("kill: {:?} is already dead", entity);
            return false;
        }
        if let Some(tether) = self.world.get::<Tether>(entity).copied() {
            self.release(entity, tether.item);
        }
        if let Some(tethered) = self.world.get::<Tethered>(entity).copied() {
            self.release(tethered.by, entity);
        }
        if let Some(bounds) = self.world.get::<FatBounds>(entity).copied() {
            self.world.resource_mut::<SpatialIndex>().remove(bounds.rect, entity);
        }
        if let Some(id) = self.world.get::<StableId>(entity).map(|s| s.0.clone()) {
            if self.ids.get(&id) == Some(&entity) {
                self.ids.remove(&id);
            }
        }
        self.world.despawn(entity)
    }

    /// Give an entity a stable id. A later entity with the same id replaces
    /// the earlier one in lookups.
    pub fn set_id(&mut self, entity: Entity, id: &str) {
        if !self.is_alive(entity) {
            return;
        }
        if let Some(previous) = self.world.get::<StableId>(entity).map(|s| s.0.clone()) {
            if self.ids.get(&previous) == Some(&entity) {
                self.ids.remove(&previous);
            }
        }
        self.world.entity_mut(entity).insert(StableId(id.to_string()));
        self.ids.insert(id.to_string(), entity);
    }

    pub fn get_by_id(&self, id: &str) -> Option<Entity> {
        self.ids.get(id).copied().filter(|e| self.is_alive(*e))
    }

    /// Snapshot of an object's identity for events and messages.
    pub fn object_info(&self, entity: Entity) -> Option<ObjectInfo> {
        if !self.is_alive(entity) {
            return None;
        }
        let class = self.world.get::<Class>(entity)?.0;
        let value = match (
            self.world.get::<Cargo>(entity),
            self.world.get::<Pickup>(entity),
        ) {
            (Some(cargo), _) => cargo.value,
            (None, Some(pickup)) => pickup.value,
            (None, None) => 0,
        };
        Some(ObjectInfo {
            entity: Some(entity),
            class,
            id: self.world.get::<StableId>(entity).map(|s| s.0.clone()),
            name: self.world.get::<Name>(entity).map(|n| n.0.clone()),
            position: self.position_of(entity).unwrap_or_default(),
            value,
        })
    }

    pub fn next_ship_name(&mut self, model: &'static str) -> String {
        let n = self.names.ships.entry(model).or_insert(0);
        *n += 1;
        format!("{} {}", model, n)
    }

    pub fn next_astronaut_name(&mut self) -> String {
        ASTRONAUT_NAMES
            .choose(&mut self.rng)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "Astronaut".to_string())
    }

    // ------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------

    /// Advance the world by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.world.resource_mut::<SimTick>().increment();
        self.refresh_active_set();

        self.schedule.run(&mut self.world);

        let expired = std::mem::take(&mut self.world.resource_mut::<KillQueue>().0);
        for entity in expired {
            self.kill(entity);
        }

        let contacts = std::mem::take(&mut self.world.resource_mut::<ContactBuffer>().contacts);
        for contact in contacts {
            self.resolve(contact);
        }

        let spawns = std::mem::take(&mut self.world.resource_mut::<SpawnQueue>().0);
        for request in spawns {
            match request {
                SpawnRequest::Bullet { owner, position, velocity } => {
                    registry::bullet(self, owner, position, velocity);
                    self.play(Sound::Laser, position);
                }
            }
        }

        if let Some(pos) = self.player_position() {
            self.camera = pos;
        }
        self.check_target_region();
        self.hud.update(dt);

        self.tick += 1;
        self.time += dt as f64;
    }

    /// Collidables inside the cull square around the camera.
    fn refresh_active_set(&mut self) {
        let size = self.config.cull_size;
        let cull = Rect::from_center(self.camera.x, self.camera.y, size, size);
        let active: HashSet<Entity> = self
            .world
            .resource::<SpatialIndex>()
            .query(cull)
            .iter()
            .collect();
        self.world.resource_mut::<ActiveSet>().replace(active);
    }

    fn resolve(&mut self, contact: Contact) {
        // An earlier reaction this frame may have removed either party
        if !self.is_alive(contact.mover) || !self.is_alive(contact.other) {
            return;
        }
        let Contact { mover, other, reaction } = contact;
        match reaction {
            Reaction::Pickup => self.collect(mover, other),
            Reaction::SwapShip => self.swap_ship(mover, other),
            Reaction::Tractor => self.attach(mover, other),
            Reaction::ExplodeMover => self.explode(mover),
            Reaction::Deliver => self.collect(other, mover),
            Reaction::ExplodeBoth => {
                self.explode(other);
                self.explode(mover);
            }
            Reaction::Shot => self.shoot(mover, other),
            Reaction::DestroyOther => self.destroy(other),
        }
    }

    // ------------------------------------------------------------------
    // Reactions
    // ------------------------------------------------------------------

    fn collect(&mut self, collector: Entity, item: Entity) {
        let (Some(collector), Some(item_info)) = (self.object_info(collector), self.object_info(item))
        else {
            return;
        };
        if item_info.value > 0 {
            self.give_money(item_info.value as i64);
            self.play(Sound::Ding, item_info.position);
        }
        self.events.push(WorldEvent::ItemCollected { collector, item: item_info });
        self.kill(item);
    }

    fn swap_ship(&mut self, player: Entity, ship: Entity) {
        let Some(swappable) = self.world.get::<Swappable>(ship).copied() else {
            return;
        };
        if swappable.swapped {
            return;
        }
        if let Some(mut s) = self.world.get_mut::<Swappable>(ship) {
            s.swapped = true;
        }
        let collector = self.object_info(player);
        let item = self.object_info(ship);
        let pos = self.position_of(ship).unwrap_or_default();
        let heading = self.world.get::<Heading>(ship).copied().unwrap_or_default();
        self.world
            .entity_mut(player)
            .insert((pos, heading, Velocity::default()));
        self.set_player_ship(swappable.model);
        if let (Some(collector), Some(item)) = (collector, item) {
            self.events.push(WorldEvent::ItemCollected { collector, item });
        }
        self.play(Sound::Pickup, pos);
        self.kill(ship);
    }

    fn attach(&mut self, ship: Entity, item: Entity) {
        if self.world.get::<Tether>(ship).is_some() || self.world.get::<Tethered>(item).is_some() {
            return;
        }
        self.world.entity_mut(ship).insert(Tether { item });
        self.world.entity_mut(item).insert(Tethered { by: ship });
        if let Some(info) = self.object_info(item) {
            self.play(Sound::Pickup, info.position);
            self.events.push(WorldEvent::ObjectTractored(info));
        }
    }

    fn release(&mut self, ship: Entity, item: Entity) {
        if self.world.get::<Tether>(ship).map(|t| t.item) != Some(item) {
            return;
        }
        self.world.entity_mut(ship).remove::<Tether>();
        if self.is_alive(item) {
            self.world.entity_mut(item).remove::<Tethered>();
            if let Some(info) = self.object_info(item) {
                self.events.push(WorldEvent::ObjectReleased(info));
            }
        }
    }

    /// Drop whatever `ship` is towing. Returns false if it tows nothing.
    pub fn release_tether(&mut self, ship: Entity) -> bool {
        let Some(tether) = self.world.get::<Tether>(ship).copied() else {
            return false;
        };
        self.release(ship, tether.item);
        if let Some(pos) = self.position_of(ship) {
            self.play(Sound::Drop, pos);
        }
        true
    }

    fn explode(&mut self, entity: Entity) {
        if self.player == Some(entity) {
            self.kill_player(entity);
        } else {
            self.destroy(entity);
        }
    }

    fn kill_player(&mut self, player: Entity) {
        if let Some(pos) = self.position_of(player) {
            self.spawn_explosion(pos);
        }
        if self.kill(player) {
            info!("{} was destroyed", self.player_name);
            self.events.push(WorldEvent::PlayerDeath);
        }
    }

    /// Explode a non-player object.
    fn destroy(&mut self, entity: Entity) {
        let Some(info) = self.object_info(entity) else {
            return;
        };
        self.spawn_explosion(info.position);
        let astronaut = info.class == ObjectClass::Astronaut;
        self.events.push(WorldEvent::ObjectDestroyed(info.clone()));
        if astronaut {
            self.events.push(WorldEvent::AstronautDeath(info));
        }
        self.kill(entity);
    }

    fn shoot(&mut self, bullet: Entity, target: Entity) {
        let impact = self.position_of(bullet).unwrap_or_default();
        self.kill(bullet);
        let Some(info) = self.object_info(target) else {
            return;
        };
        self.events.push(WorldEvent::ObjectShot(info));
        let Some(role) = self.world.get::<Role>(target).copied() else {
            return;
        };
        match role {
            Role::Rock => self.fragment(target, impact),
            Role::Debris | Role::Cargo | Role::Hostile => self.destroy(target),
            Role::Player => self.explode(target),
            _ => {}
        }
    }

    /// Break a fragment off a rock on the side the shot came from.
    fn fragment(&mut self, rock: Entity, impact: Position) {
        let (Some(data), Some(pos), Some(collider)) = (
            self.world.get::<Rock>(rock).copied(),
            self.position_of(rock),
            self.world.get::<Collider>(rock).copied(),
        ) else {
            return;
        };
        let radius = collider.radius;
        let (mut nx, mut ny) = (impact.x - pos.x, impact.y - pos.y);
        let len = (nx * nx + ny * ny).sqrt();
        if len < 1e-4 {
            nx = 0.0;
            ny = 1.0;
        } else {
            nx /= len;
            ny /= len;
        }

        // Clear of the rock so the fragment does not hit it straight away
        let clearance = radius + data.yields.nominal_radius() + 1.0;
        let jitter = self.rng.gen_range(0.0..EJECT_RANDOMNESS);
        let angle = self.rng.gen_range(0.0..360.0);
        let (jx, jy) = rotate(jitter, 0.0, angle);
        let params = SpawnParams::at(pos.offset(nx * clearance, ny * clearance))
            .with_velocity(Velocity::new(nx * EJECT_SPEED + jx, ny * EJECT_SPEED + jy));
        self.spawn_debris(data.yields, &params);

        let shrunk = (radius * radius - FRAGMENT_AREA).max(0.0).sqrt();
        if shrunk < MIN_ROCK_RADIUS {
            self.destroy(rock);
            self.spawn_debris(data.yields, &SpawnParams::at(pos));
        } else if let Some(mut collider) = self.world.get_mut::<Collider>(rock) {
            collider.radius = shrunk;
        }
    }

    fn spawn_debris(&mut self, class: ObjectClass, params: &SpawnParams) {
        if let Err(e) = self.spawn_class(class, params) {
            warn!("could not spawn fragment: {}", e);
        }
    }

    fn spawn_explosion(&mut self, position: Position) {
        registry::explosion(self, position);
        self.play(Sound::Explosion, position);
    }

    // ------------------------------------------------------------------
    // Player, money and messages
    // ------------------------------------------------------------------

    /// Spawn the player's ship at the spawn point.
    ///
    /// Unless `freebie`, the respawn cost is charged first; with too little
    /// money the game is over and `None` is returned.
    pub fn spawn_player(&mut self, freebie: bool) -> Option<Entity> {
        if !freebie {
            let cost = self.config.respawn_cost;
            if self.money < cost {
                self.money = 0;
                self.hud.set_money(0);
                self.say("You don't have enough credits to continue.", Colour::Red);
                self.say("Game over", Colour::Red);
                info!("game over");
                return None;
            }
            self.give_money(-cost);
        }

        let model = self.current_ship;
        let name = self.next_ship_name(model.name);
        let spawn = self.config.player_spawn;
        let body = BodyBundle::new(
            ObjectClass::Player,
            Role::Player,
            spawn,
            Collider::new(model.radius, CollisionGroups::PLAYER, CollisionGroups::PLAYER_MASK),
        )
        .with_velocity(Velocity::new(0.0, 5.0));
        let player = self.spawn((body, Player, Ship(model), Name(name.clone()), Probe));
        self.player_label = Some(self.spawn_label(ObjectClass::Label, name.clone(), player, SHIP_LABEL_OFFSET));
        self.player = Some(player);
        self.player_name = name;
        self.camera = spawn;
        info!("spawned {} ({})", self.player_name, model.name);
        Some(player)
    }

    /// Change the model the player flies (and respawns in).
    pub fn set_player_ship(&mut self, model: ShipModel) {
        self.current_ship = model;
        let Some(player) = self.player() else {
            return;
        };
        let name = self.next_ship_name(model.name);
        let mut ship = self.world.entity_mut(player);
        ship.insert((Ship(model), Name(name.clone())));
        if let Some(mut collider) = ship.get_mut::<Collider>() {
            collider.radius = model.radius;
        }
        if let Some(label) = self.player_label.filter(|e| self.is_alive(*e)) {
            self.world.entity_mut(label).insert(Name(name.clone()));
        }
        self.player_name = name;
        self.refresh_bounds(player);
    }

    pub fn give_money(&mut self, amount: i64) {
        self.money += amount;
        self.hud.set_money(self.money);
    }

    /// Expand `{name}`, `{control}` and any of `params` in `template`.
    pub fn format(&self, template: &str, params: &HashMap<String, String>) -> String {
        format_message(template, |key| match key {
            "name" => Some(self.player_name.clone()),
            "control" => Some(MOONBASE_NAME.to_string()),
            _ => params.get(key).cloned(),
        })
    }

    pub fn say(&mut self, message: &str, colour: Colour) {
        self.say_with(message, colour, &HashMap::new());
    }

    pub fn say_with(&mut self, message: &str, colour: Colour, params: &HashMap<String, String>) {
        let text = self.format(message, params);
        info!("message: {}", text);
        self.hud.append_message(text, colour);
    }

    /// Z key: drop the towed item, or fire if nothing is towed.
    pub fn fire_or_release(&mut self) {
        let Some(player) = self.player() else {
            return;
        };
        if self.release_tether(player) {
            return;
        }
        let (Some(pos), Some(heading), Some(vel)) = (
            self.position_of(player),
            self.world.get::<Heading>(player).copied(),
            self.world.get::<Velocity>(player).copied(),
        ) else {
            return;
        };
        let (dx, dy) = heading.direction();
        let velocity = Velocity::new(vel.vx + dx * BULLET_SPEED, vel.vy + dy * BULLET_SPEED);
        registry::bullet(self, player, pos, velocity);
        self.play(Sound::Laser, pos);
    }

    // ------------------------------------------------------------------
    // Events, regions and sound
    // ------------------------------------------------------------------

    pub fn emit(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    /// Events raised since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_target_region(&mut self, center: Position, radius: f32) {
        self.target_region = Some(TargetRegion { center, radius, inside: false });
    }

    pub fn clear_target_region(&mut self) {
        self.target_region = None;
    }

    /// Raise `RegionEntered` on the frame the player crosses into the region.
    fn check_target_region(&mut self) {
        let player = self.player_position();
        if let Some(region) = self.target_region.as_mut() {
            let inside = player.map(|p| region.contains(p)).unwrap_or(false);
            if inside && !region.inside {
                self.events.push(WorldEvent::RegionEntered);
            }
            region.inside = inside;
        }
    }

    pub fn play(&mut self, sound: Sound, position: Position) {
        self.sounds.push(SoundCue { sound, position });
    }

    pub fn flush_sounds(&mut self, audio: &mut dyn AudioPlayer) {
        for cue in self.sounds.drain(..) {
            audio.play(cue);
        }
    }

    // ------------------------------------------------------------------
    // Scenery
    // ------------------------------------------------------------------

    fn spawn_moon(&mut self) {
        let moon = self.spawn(
            BodyBundle::new(
                ObjectClass::Moon,
                Role::Moon,
                Position::new(0.0, 0.0),
                Collider::passive(registry::MOON_RADIUS, CollisionGroups::MOON),
            )
            .with_spin(MOON_SPIN),
        );
        let base = self.spawn((
            BodyBundle::new(
                ObjectClass::MoonBase,
                Role::Collector,
                Position::new(MOONBASE_OFFSET.0, MOONBASE_OFFSET.1),
                Collider::passive(registry::MOONBASE_RADIUS, CollisionGroups::BASE),
            ),
            Collector,
            Mounted { parent: moon, offset: MOONBASE_OFFSET },
            Name(MOONBASE_NAME.to_string()),
        ));
        self.set_id(base, "moonbase");
        self.spawn_label(ObjectClass::Label, MOONBASE_NAME, base, MOONBASE_LABEL_OFFSET);
        self.moon = Some(moon);
    }

    /// Point 220 units above the moonbase, following the moon's rotation.
    pub fn above_moonbase(&self) -> Position {
        let Some(moon) = self.moon else {
            return Position::new(ABOVE_MOONBASE.0, ABOVE_MOONBASE.1);
        };
        let centre = self.position_of(moon).unwrap_or_default();
        let heading = self.world.get::<Heading>(moon).map(|h| h.0).unwrap_or(0.0);
        let (x, y) = rotate(ABOVE_MOONBASE.0, ABOVE_MOONBASE.1, -heading);
        centre.offset(x, y)
    }

    /// Scatter `count` random asteroids, keeping clear of the moon.
    pub fn generate_asteroids(&mut self, count: usize) {
        let extent = self.config.asteroid_field_extent;
        let exclusion = self.config.asteroid_exclusion_radius;
        if count == 0 {
            return;
        }
        if extent * std::f32::consts::SQRT_2 <= exclusion {
            warn!("asteroid field of extent {} lies inside the exclusion radius", extent);
            return;
        }
        for _ in 0..count {
            let class = match self.rng.gen_range(0..13) {
                0 => ObjectClass::IceAsteroid,
                1 => ObjectClass::CheeseAsteroid,
                2 => ObjectClass::MetalAsteroid,
                _ => ObjectClass::Asteroid,
            };
            let position = loop {
                let x = self.rng.gen_range(-extent..extent);
                let y = self.rng.gen_range(-extent..extent);
                if x * x + y * y > exclusion * exclusion {
                    break Position::new(x, y);
                }
            };
            self.spawn_debris(class, &SpawnParams::at(position));
        }
        debug!("generated {} asteroids", count);
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Hand everything in the viewport to the renderer, then the HUD.
    pub fn draw(&mut self, renderer: &mut dyn Renderer) {
        renderer.begin(self.camera);
        let view = Rect::from_center(
            self.camera.x,
            self.camera.y,
            self.config.viewport_width,
            self.config.viewport_height,
        );
        let mut visible: Vec<Entity> = self
            .world
            .resource::<SpatialIndex>()
            .query(view)
            .iter()
            .collect();
        let mut floating = self.world.query_filtered::<Entity, (With<Position>, Without<Collider>)>();
        visible.extend(floating.iter(&self.world));

        for entity in visible {
            if let Some(item) = self.draw_item(entity) {
                renderer.draw(&item);
            }
        }
        renderer.draw_hud(&self.hud);
    }

    fn draw_item(&self, entity: Entity) -> Option<DrawItem> {
        let class = self.world.get::<Class>(entity)?.0;
        let position = self.position_of(entity)?;
        let colour = if let Some(ship) = self.world.get::<Ship>(entity) {
            ship.0.colour
        } else if let Some(parked) = self.world.get::<Swappable>(entity) {
            parked.model.colour
        } else if class == ObjectClass::Signpost {
            Colour::Gold
        } else {
            Colour::White
        };
        Some(DrawItem {
            entity,
            class,
            position,
            rotation: self.world.get::<Heading>(entity).map(|h| h.0).unwrap_or(0.0),
            radius: self.world.get::<Collider>(entity).map(|c| c.radius).unwrap_or(0.0),
            text: self.world.get::<Name>(entity).map(|n| n.0.clone()),
            colour,
            tether: self
                .world
                .get::<Tether>(entity)
                .and_then(|t| self.position_of(t.item)),
        })
    }
}
