//! Object classes and the factory table that spawns them.
//!
//! Missions refer to objects by [`ObjectClass`]; the [`ObjectRegistry`] maps
//! each spawnable class to a factory that assembles its components.

use crate::collision::{CollisionGroups, Role};
use crate::components::*;
use crate::error::SpawnError;
use crate::ships::{ShipModel, CLIPPER, LUGGER};
use crate::world::SpaceWorld;
use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ASTEROID_RADIUS: f32 = 32.0;
pub const DANGEROUS_ASTEROID_RADIUS: f32 = 40.0;
pub const FRAGMENT_RADIUS: f32 = 8.0;
pub const COLLECTABLE_RADIUS: f32 = 9.0;
pub const CRATE_RADIUS: f32 = 12.0;
pub const MOON_RADIUS: f32 = 140.0;
pub const MOONBASE_RADIUS: f32 = 50.0;
pub const BULLET_RADIUS: f32 = 3.0;
pub const BULLET_SPEED: f32 = 400.0;
pub const BULLET_LIFETIME: f32 = 1.5;
pub const EXPLOSION_LIFETIME: f32 = 0.6;
pub const CARGO_MASS: f32 = 0.5;

/// Every kind of object the world knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    Asteroid,
    AsteroidFragment,
    IceAsteroid,
    CheeseAsteroid,
    MetalAsteroid,
    DangerousAsteroid,
    Ice,
    Cheese,
    Metal,
    Marker,
    FixedMarker,
    Coin,
    Astronaut,
    CommsStation,
    SpaceDock,
    SolarFarm,
    Battery,
    Satellite,
    FrozenFood,
    MedicalCrate,
    Lugger,
    Clipper,
    Droid,
    Moon,
    MoonBase,
    Player,
    Bullet,
    Explosion,
    Label,
    Signpost,
}

impl ObjectClass {
    /// Collision radius the factory gives this class.
    pub fn nominal_radius(self) -> f32 {
        use ObjectClass::*;
        match self {
            Asteroid | IceAsteroid | CheeseAsteroid | MetalAsteroid => ASTEROID_RADIUS,
            DangerousAsteroid => DANGEROUS_ASTEROID_RADIUS,
            AsteroidFragment => FRAGMENT_RADIUS,
            Ice | Cheese | Metal | Astronaut | Coin => COLLECTABLE_RADIUS,
            Battery | Satellite | FrozenFood | MedicalCrate | Marker => CRATE_RADIUS,
            CommsStation => 40.0,
            SpaceDock => 60.0,
            SolarFarm => 50.0,
            Lugger => LUGGER.radius,
            Clipper => CLIPPER.radius,
            Droid => 16.0,
            Moon => MOON_RADIUS,
            MoonBase => MOONBASE_RADIUS,
            Bullet => BULLET_RADIUS,
            Player | FixedMarker | Explosion | Label | Signpost => 0.0,
        }
    }

    /// Human-readable name, used when a signpost has no better text.
    pub fn display_name(self) -> &'static str {
        use ObjectClass::*;
        match self {
            Asteroid | AsteroidFragment | DangerousAsteroid => "Asteroid",
            IceAsteroid => "Ice Asteroid",
            CheeseAsteroid => "Cheese Asteroid",
            MetalAsteroid => "Metal Asteroid",
            Ice => "Ice",
            Cheese => "Cheese",
            Metal => "Metal",
            Marker | FixedMarker => "Marker",
            Coin => "Coin",
            Astronaut => "Astronaut",
            CommsStation => "Comm Station",
            SpaceDock => "Space Dock",
            SolarFarm => "Solar Farm",
            Battery => "Battery",
            Satellite => "Satellite",
            FrozenFood => "Frozen Food",
            MedicalCrate => "Medical Supplies",
            Lugger => "Lugger",
            Clipper => "Clipper",
            Droid => "Droid",
            Moon => "Moon",
            MoonBase => "Moonbase",
            Player => "Ship",
            Bullet => "Bullet",
            Explosion => "Explosion",
            Label => "Label",
            Signpost => "Signpost",
        }
    }

    /// Asset name the host resolves through its resource loader.
    pub fn sprite_name(self) -> &'static str {
        use ObjectClass::*;
        match self {
            Asteroid | DangerousAsteroid => "asteroid",
            AsteroidFragment => "asteroid-fragment",
            IceAsteroid => "ice-asteroid",
            CheeseAsteroid => "cheese-asteroid",
            MetalAsteroid => "metal-asteroid",
            Ice => "ice",
            Cheese => "cheese",
            Metal => "metal",
            Marker | FixedMarker => "marker",
            Coin => "coin",
            Astronaut => "astronaut",
            CommsStation => "comms-station",
            SpaceDock => "space-dock",
            SolarFarm => "solar-farm",
            Battery => "battery",
            Satellite => "satellite",
            FrozenFood => "frozen-food",
            MedicalCrate => "medical-crate",
            Lugger => "lugger",
            Clipper => "clipper",
            Droid => "droid",
            Moon => "moon",
            MoonBase => "moonbase",
            Player => "ship",
            Bullet => "bullet",
            Explosion => "explosion",
            Label | Signpost => "",
        }
    }
}

/// Spawn-time parameters handed to a factory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpawnParams {
    pub position: Position,
    pub velocity: Velocity,
    /// Initial heading in degrees.
    pub rotation: f32,
    /// Cargo destination filter (stable id of the collector).
    pub destination: Option<String>,
    pub name: Option<String>,
}

impl SpawnParams {
    pub fn at(position: Position) -> Self {
        Self { position, ..Default::default() }
    }

    pub fn with_velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_destination(mut self, destination: Option<String>) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

/// Builds one object from its spawn parameters.
pub type Factory = fn(&mut SpaceWorld, &SpawnParams) -> Entity;

/// Class -> factory table.
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    factories: HashMap<ObjectClass, Factory>,
}

impl ObjectRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The registry with every script-spawnable class.
    pub fn standard() -> Self {
        use ObjectClass::*;
        let mut registry = Self::empty();
        registry.register(Asteroid, asteroid);
        registry.register(IceAsteroid, ice_asteroid);
        registry.register(CheeseAsteroid, cheese_asteroid);
        registry.register(MetalAsteroid, metal_asteroid);
        registry.register(DangerousAsteroid, dangerous_asteroid);
        registry.register(AsteroidFragment, asteroid_fragment);
        registry.register(Ice, ice);
        registry.register(Cheese, cheese);
        registry.register(Metal, metal);
        registry.register(Astronaut, astronaut);
        registry.register(Battery, battery);
        registry.register(FrozenFood, frozen_food);
        registry.register(MedicalCrate, medical_crate);
        registry.register(Satellite, satellite);
        registry.register(Marker, marker);
        registry.register(FixedMarker, fixed_marker);
        registry.register(Coin, coin);
        registry.register(CommsStation, comms_station);
        registry.register(SpaceDock, space_dock);
        registry.register(SolarFarm, solar_farm);
        registry.register(Lugger, lugger);
        registry.register(Clipper, clipper);
        registry.register(Droid, droid);
        registry
    }

    pub fn register(&mut self, class: ObjectClass, factory: Factory) {
        self.factories.insert(class, factory);
    }

    pub fn is_registered(&self, class: ObjectClass) -> bool {
        self.factories.contains_key(&class)
    }

    pub fn factory(&self, class: ObjectClass) -> Result<Factory, SpawnError> {
        self.factories
            .get(&class)
            .copied()
            .ok_or(SpawnError::NotSpawnable(class))
    }
}

// ============================================================================
// FACTORIES
// ============================================================================

fn random_spin(world: &mut SpaceWorld) -> (f32, f32) {
    let rng = world.rng();
    (rng.gen_range(0.0..360.0), rng.gen_range(-30.0..30.0))
}

fn rock(world: &mut SpaceWorld, p: &SpawnParams, class: ObjectClass, yields: ObjectClass) -> Entity {
    let (heading, spin) = random_spin(world);
    let body = BodyBundle::new(
        class,
        Role::Rock,
        p.position,
        Collider::passive(class.nominal_radius(), CollisionGroups::SOLID),
    )
    .with_velocity(p.velocity)
    .with_heading(heading)
    .with_spin(spin);
    world.spawn((body, Rock { yields }))
}

fn asteroid(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    rock(world, p, ObjectClass::Asteroid, ObjectClass::AsteroidFragment)
}

fn ice_asteroid(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    rock(world, p, ObjectClass::IceAsteroid, ObjectClass::Ice)
}

fn cheese_asteroid(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    rock(world, p, ObjectClass::CheeseAsteroid, ObjectClass::Cheese)
}

fn metal_asteroid(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    rock(world, p, ObjectClass::MetalAsteroid, ObjectClass::Metal)
}

/// A rock on a collision course: it probes and flattens installations.
fn dangerous_asteroid(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    let (heading, spin) = random_spin(world);
    let body = BodyBundle::new(
        ObjectClass::DangerousAsteroid,
        Role::Rock,
        p.position,
        Collider::new(
            DANGEROUS_ASTEROID_RADIUS,
            CollisionGroups::SOLID,
            CollisionGroups::RAMMER_MASK,
        ),
    )
    .with_velocity(p.velocity)
    .with_heading(heading)
    .with_spin(spin);
    world.spawn((body, Rock { yields: ObjectClass::AsteroidFragment }, Probe))
}

fn asteroid_fragment(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    let (heading, spin) = random_spin(world);
    let body = BodyBundle::new(
        ObjectClass::AsteroidFragment,
        Role::Debris,
        p.position,
        Collider::passive(FRAGMENT_RADIUS, CollisionGroups::SOLID),
    )
    .with_velocity(p.velocity)
    .with_heading(heading)
    .with_spin(spin);
    world.spawn(body)
}

fn cargo(world: &mut SpaceWorld, p: &SpawnParams, class: ObjectClass, value: u32) -> Entity {
    let body = BodyBundle::new(
        class,
        Role::Cargo,
        p.position,
        Collider::new(
            class.nominal_radius(),
            CollisionGroups::CARGO,
            CollisionGroups::CARGO_MASK,
        ),
    )
    .with_velocity(p.velocity)
    .with_heading(p.rotation);
    let entity = world.spawn((
        body,
        Cargo { value, destination: p.destination.clone() },
        Mass(CARGO_MASS),
        Probe,
    ));
    if let Some(name) = &p.name {
        world.ecs_mut().entity_mut(entity).insert(Name(name.clone()));
    }
    entity
}

fn ice(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    cargo(world, p, ObjectClass::Ice, 10)
}

fn cheese(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    cargo(world, p, ObjectClass::Cheese, 15)
}

fn metal(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    cargo(world, p, ObjectClass::Metal, 20)
}

fn battery(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    cargo(world, p, ObjectClass::Battery, 30)
}

fn frozen_food(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    cargo(world, p, ObjectClass::FrozenFood, 40)
}

fn medical_crate(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    cargo(world, p, ObjectClass::MedicalCrate, 30)
}

fn satellite(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    let p = SpawnParams {
        name: p.name.clone().or_else(|| Some("Apollo Uplink".to_string())),
        ..p.clone()
    };
    cargo(world, &p, ObjectClass::Satellite, 0)
}

/// Astronauts always have a name; one is drawn from the name book if the
/// script did not supply it.
fn astronaut(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    let name = match &p.name {
        Some(name) => name.clone(),
        None => world.next_astronaut_name(),
    };
    let p = SpawnParams { name: Some(name), ..p.clone() };
    cargo(world, &p, ObjectClass::Astronaut, 50)
}

fn pickup(world: &mut SpaceWorld, p: &SpawnParams, class: ObjectClass, value: u32) -> Entity {
    let body = BodyBundle::new(
        class,
        Role::Pickup,
        p.position,
        Collider::passive(class.nominal_radius(), CollisionGroups::PICKUP),
    )
    .with_velocity(p.velocity)
    .with_heading(p.rotation);
    world.spawn((body, Pickup { value }))
}

fn marker(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    pickup(world, p, ObjectClass::Marker, 0)
}

fn coin(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    pickup(world, p, ObjectClass::Coin, 10)
}

/// A visual waypoint nothing can touch.
fn fixed_marker(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    let body = BodyBundle::new(
        ObjectClass::FixedMarker,
        Role::Structure,
        p.position,
        Collider::passive(CRATE_RADIUS, CollisionGroups::empty()),
    );
    world.spawn(body)
}

fn comms_station(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    let body = BodyBundle::new(
        ObjectClass::CommsStation,
        Role::Collector,
        p.position,
        Collider::passive(ObjectClass::CommsStation.nominal_radius(), CollisionGroups::BASE),
    )
    .with_heading(p.rotation)
    .with_spin(10.0);
    let name = p.name.clone().unwrap_or_else(|| "Comm Station".to_string());
    world.spawn((body, Collector, Name(name)))
}

fn structure(world: &mut SpaceWorld, p: &SpawnParams, class: ObjectClass) -> Entity {
    let body = BodyBundle::new(
        class,
        Role::Structure,
        p.position,
        Collider::passive(class.nominal_radius(), CollisionGroups::STRUCTURE),
    )
    .with_heading(p.rotation);
    let entity = world.spawn(body);
    if let Some(name) = &p.name {
        world.ecs_mut().entity_mut(entity).insert(Name(name.clone()));
    }
    entity
}

fn space_dock(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    structure(world, p, ObjectClass::SpaceDock)
}

fn solar_farm(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    structure(world, p, ObjectClass::SolarFarm)
}

fn parked_ship(world: &mut SpaceWorld, p: &SpawnParams, class: ObjectClass, model: ShipModel) -> Entity {
    let name = match &p.name {
        Some(name) => name.clone(),
        None => world.next_ship_name(model.name),
    };
    let body = BodyBundle::new(
        class,
        Role::Swappable,
        p.position,
        Collider::passive(model.radius, CollisionGroups::PICKUP),
    )
    .with_heading(p.rotation);
    world.spawn((body, Swappable { model, swapped: false }, Name(name)))
}

fn lugger(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    parked_ship(world, p, ObjectClass::Lugger, LUGGER)
}

fn clipper(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    parked_ship(world, p, ObjectClass::Clipper, CLIPPER)
}

fn droid(world: &mut SpaceWorld, p: &SpawnParams) -> Entity {
    let body = BodyBundle::new(
        ObjectClass::Droid,
        Role::Hostile,
        p.position,
        Collider::passive(ObjectClass::Droid.nominal_radius(), CollisionGroups::SOLID),
    )
    .with_velocity(p.velocity)
    .with_heading(p.rotation);
    let name = p.name.clone().unwrap_or_else(|| "Droid".to_string());
    world.spawn((body, crate::components::Droid { cooldown: 1.0 }, Name(name)))
}

/// Projectile fired by `owner`. Not in the registry: scripts cannot spawn it.
pub fn bullet(world: &mut SpaceWorld, owner: Entity, position: Position, velocity: Velocity) -> Entity {
    let body = BodyBundle::new(
        ObjectClass::Bullet,
        Role::Projectile,
        position,
        Collider::new(BULLET_RADIUS, CollisionGroups::PROJECTILE, CollisionGroups::BULLET_MASK),
    )
    .with_velocity(velocity);
    world.spawn((body, Projectile { owner }, Lifetime(BULLET_LIFETIME), Probe))
}

/// Short-lived, non-collidable effect.
pub fn explosion(world: &mut SpaceWorld, position: Position) -> Entity {
    world.spawn((
        Class(ObjectClass::Explosion),
        position,
        Lifetime(EXPLOSION_LIFETIME),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn world() -> SpaceWorld {
        SpaceWorld::new(GameConfig::without_asteroids())
    }

    #[test]
    fn test_unregistered_class_is_rejected() {
        let mut w = world();
        let err = w
            .spawn_class(ObjectClass::Moon, &SpawnParams::default())
            .unwrap_err();
        assert_eq!(err, SpawnError::NotSpawnable(ObjectClass::Moon));
        assert!(!ObjectRegistry::standard().is_registered(ObjectClass::Bullet));
    }

    #[test]
    fn test_ice_is_towable_cargo() {
        let mut w = world();
        let e = w
            .spawn_class(
                ObjectClass::Ice,
                &SpawnParams::at(Position::new(10.0, 20.0))
                    .with_destination(Some("moonbase".into())),
            )
            .unwrap();
        let ecs = w.ecs();
        assert_eq!(ecs.get::<Role>(e), Some(&Role::Cargo));
        assert_eq!(ecs.get::<Cargo>(e).unwrap().destination.as_deref(), Some("moonbase"));
        assert_eq!(ecs.get::<Collider>(e).unwrap().radius, COLLECTABLE_RADIUS);
        assert!(ecs.get::<Probe>(e).is_some());
        assert!(ecs.get::<FatBounds>(e).is_some());
    }

    #[test]
    fn test_astronaut_gets_a_name() {
        let mut w = world();
        let e = w
            .spawn_class(ObjectClass::Astronaut, &SpawnParams::default())
            .unwrap();
        let name = &w.ecs().get::<Name>(e).unwrap().0;
        assert!(!name.is_empty());

        let named = w
            .spawn_class(
                ObjectClass::Astronaut,
                &SpawnParams::default().with_name(Some("Sally".into())),
            )
            .unwrap();
        assert_eq!(w.ecs().get::<Name>(named).unwrap().0, "Sally");
    }

    #[test]
    fn test_parked_ships_are_numbered() {
        let mut w = world();
        let a = w.spawn_class(ObjectClass::Lugger, &SpawnParams::default()).unwrap();
        let b = w.spawn_class(ObjectClass::Lugger, &SpawnParams::default()).unwrap();
        assert_eq!(w.ecs().get::<Name>(a).unwrap().0, "Lugger 1");
        assert_eq!(w.ecs().get::<Name>(b).unwrap().0, "Lugger 2");
        assert_eq!(w.ecs().get::<Swappable>(a).unwrap().model, LUGGER);
    }
}
