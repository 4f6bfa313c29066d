//! Collision model - group/mask filtering, circle overlap and reaction dispatch.
//!
//! ## Mask direction
//!
//! A contact exists when the *mover's* mask intersects the *other's* group and
//! the two circles overlap. Only entities carrying [`Probe`] act as movers, so
//! the filter is evaluated once per pair, from the mover's side. The distance
//! test itself is symmetric.
//!
//! ## Gather / resolve
//!
//! 1. **Gather** - `collision_gather_system` is read-only on entities. For each
//!    active probe it queries the spatial index with the probe's own fat
//!    bounds, runs the narrow-phase circle test and records at most one
//!    [`Contact`] (first match wins, in index iteration order).
//! 2. **Resolve** - `SpaceWorld` applies the contacts after the schedule has
//!    run, skipping any whose participants died earlier in the same pass.
//!
//! ## Parallel Feature
//!
//! When compiled with `--features parallel`, the gather phase uses rayon to
//! process probes across multiple threads.

use crate::components::*;
use crate::spatial::{Rect, SpatialIndex};
use crate::systems::bounds::ActiveSet;
use bevy_ecs::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

bitflags! {
    /// Collision group bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionGroups: u32 {
        /// Rocks, fragments, hostile drones.
        const SOLID = 0x1;
        /// Collectors (moonbase, comm stations).
        const BASE = 0x2;
        const PLAYER = 0x4;
        const CARGO = 0x8;
        const PROJECTILE = 0x10;
        /// Markers, coins and parked ships.
        const PICKUP = 0x20;
        const MOON = 0x40;
        /// Space dock, solar farm and similar installations.
        const STRUCTURE = 0x80;
    }
}

impl CollisionGroups {
    pub const PLAYER_MASK: Self = Self::SOLID
        .union(Self::CARGO)
        .union(Self::PICKUP)
        .union(Self::MOON);
    pub const CARGO_MASK: Self = Self::SOLID.union(Self::CARGO).union(Self::BASE);
    pub const BULLET_MASK: Self = Self::SOLID
        .union(Self::CARGO)
        .union(Self::PLAYER)
        .union(Self::BASE)
        .union(Self::MOON)
        .union(Self::STRUCTURE);
    pub const RAMMER_MASK: Self = Self::BASE.union(Self::STRUCTURE);
}

/// What kind of thing an entity is, for reaction dispatch.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Player,
    /// Asteroid that fragments when shot.
    Rock,
    /// Rock fragment; destroyed by a single shot.
    Debris,
    Cargo,
    Pickup,
    Swappable,
    Collector,
    Structure,
    Hostile,
    Projectile,
    Moon,
}

/// Reaction to a contact between a mover and another body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reaction {
    /// Player flies through a marker or coin.
    Pickup,
    /// Player docks with a parked ship.
    SwapShip,
    /// Player grabs cargo with the tractor beam.
    Tractor,
    /// The mover blows up.
    ExplodeMover,
    /// Cargo reaches a collector that accepts it.
    Deliver,
    /// Two pieces of cargo smash into each other.
    ExplodeBoth,
    /// A projectile hits the other body.
    Shot,
    /// A ramming rock flattens an installation.
    DestroyOther,
}

/// Dispatch table keyed by (mover, other).
pub fn reaction(mover: Role, other: Role) -> Option<Reaction> {
    use Role::*;
    match (mover, other) {
        (Player, Pickup) => Some(Reaction::Pickup),
        (Player, Swappable) => Some(Reaction::SwapShip),
        (Player, Cargo) => Some(Reaction::Tractor),
        (Player, Rock | Debris | Hostile | Moon | Structure | Collector) => {
            Some(Reaction::ExplodeMover)
        }
        (Cargo, Collector) => Some(Reaction::Deliver),
        (Cargo, Cargo) => Some(Reaction::ExplodeBoth),
        (Cargo, Rock | Debris | Hostile | Moon | Structure) => Some(Reaction::ExplodeMover),
        (Projectile, Projectile) => None,
        (Projectile, _) => Some(Reaction::Shot),
        (Rock, Structure | Collector) => Some(Reaction::DestroyOther),
        _ => None,
    }
}

/// True iff two circles overlap (strictly).
#[inline]
pub fn circles_overlap(a: Position, ar: f32, b: Position, br: f32) -> bool {
    let r = ar + br;
    a.distance2_to(&b) < r * r
}

/// Mask-filtered overlap test, evaluated from `a`'s side.
pub fn colliding(a_pos: Position, a: &Collider, b_pos: Position, b: &Collider) -> bool {
    a.mask.intersects(b.group) && circles_overlap(a_pos, a.radius, b_pos, b.radius)
}

/// A detected contact awaiting resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub mover: Entity,
    pub other: Entity,
    pub reaction: Reaction,
}

/// Contacts gathered this tick.
#[derive(Resource, Debug, Default)]
pub struct ContactBuffer {
    pub contacts: Vec<Contact>,
}

/// Per-probe data copied out of the ECS so the narrow phase can run off-thread.
#[derive(Debug, Clone)]
struct ProbeData {
    entity: Entity,
    pos: Position,
    collider: Collider,
    role: Role,
    rect: Rect,
    owner: Option<Entity>,
    cargo: Option<Cargo>,
}

type ProbeQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Position,
        &'static Collider,
        &'static Role,
        &'static FatBounds,
        Option<&'static Projectile>,
        Option<&'static Cargo>,
    ),
    With<Probe>,
>;

type BodyQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static Position,
        &'static Collider,
        &'static Role,
        Option<&'static StableId>,
    ),
>;

/// Collision gather system - finds at most one contact per active probe.
///
/// ## Data Access (READ-ONLY on entities)
/// - Reads: SpatialIndex, ActiveSet, Position, Collider, Role, FatBounds,
///   Projectile, Cargo, StableId
/// - Writes: ContactBuffer (resource only)
pub fn collision_gather_system(
    index: Res<SpatialIndex>,
    active: Res<ActiveSet>,
    mut buffer: ResMut<ContactBuffer>,
    probes: ProbeQuery,
    bodies: BodyQuery,
) {
    buffer.contacts.clear();

    let movers: Vec<ProbeData> = probes
        .iter()
        .filter(|(entity, ..)| active.contains(*entity))
        .map(|(entity, pos, collider, role, bounds, projectile, cargo)| ProbeData {
            entity,
            pos: *pos,
            collider: *collider,
            role: *role,
            rect: bounds.rect,
            owner: projectile.map(|p| p.owner),
            cargo: cargo.cloned(),
        })
        .collect();

    #[cfg(feature = "parallel")]
    {
        let found: Vec<Contact> = movers
            .par_iter()
            .filter_map(|probe| find_contact(probe, &index, &bodies))
            .collect();
        buffer.contacts.extend(found);
    }

    #[cfg(not(feature = "parallel"))]
    {
        for probe in &movers {
            if let Some(contact) = find_contact(probe, &index, &bodies) {
                buffer.contacts.push(contact);
            }
        }
    }
}

/// Broad phase over the probe's fat bounds, then the narrow-phase test.
/// Pure, so it can be called in parallel.
fn find_contact(probe: &ProbeData, index: &SpatialIndex, bodies: &BodyQuery) -> Option<Contact> {
    for other in index.query(probe.rect).iter() {
        if other == probe.entity || Some(other) == probe.owner {
            continue;
        }
        let Ok((pos, collider, role, id)) = bodies.get(other) else {
            continue;
        };
        if !colliding(probe.pos, &probe.collider, *pos, collider) {
            continue;
        }
        let Some(reaction) = reaction(probe.role, *role) else {
            continue;
        };
        if reaction == Reaction::Deliver {
            let accepted = probe
                .cargo
                .as_ref()
                .map(|c| c.accepted_by(id.map(|s| s.0.as_str())))
                .unwrap_or(false);
            if !accepted {
                continue;
            }
        }
        return Some(Contact {
            mover: probe.entity,
            other,
            reaction,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ObjectClass;

    fn collider(radius: f32, group: CollisionGroups, mask: CollisionGroups) -> Collider {
        Collider::new(radius, group, mask)
    }

    #[test]
    fn test_distance_test_is_symmetric() {
        let a = collider(8.0, CollisionGroups::PLAYER, CollisionGroups::all());
        let b = collider(32.0, CollisionGroups::SOLID, CollisionGroups::all());
        let pa = Position::new(0.0, 0.0);
        for d in [10.0, 39.0, 39.99, 40.0, 41.0, 100.0] {
            let pb = Position::new(d, 0.0);
            assert_eq!(colliding(pa, &a, pb, &b), colliding(pb, &b, pa, &a), "d = {}", d);
        }
        assert!(colliding(pa, &a, Position::new(39.9, 0.0), &b));
        // Touching circles do not collide
        assert!(!colliding(pa, &a, Position::new(40.0, 0.0), &b));
    }

    #[test]
    fn test_mask_is_checked_from_mover_side() {
        let player = collider(8.0, CollisionGroups::PLAYER, CollisionGroups::PLAYER_MASK);
        let base = collider(50.0, CollisionGroups::BASE, CollisionGroups::empty());
        let cargo = collider(9.0, CollisionGroups::CARGO, CollisionGroups::CARGO_MASK);
        let p = Position::default();

        assert!(!colliding(p, &player, p, &base));
        assert!(colliding(p, &cargo, p, &base));
        // Cargo never reacts to the player towing it
        assert!(!colliding(p, &cargo, p, &player));
        assert!(colliding(p, &player, p, &cargo));
    }

    #[test]
    fn test_reaction_table() {
        assert_eq!(reaction(Role::Player, Role::Pickup), Some(Reaction::Pickup));
        assert_eq!(reaction(Role::Player, Role::Swappable), Some(Reaction::SwapShip));
        assert_eq!(reaction(Role::Player, Role::Cargo), Some(Reaction::Tractor));
        assert_eq!(reaction(Role::Player, Role::Rock), Some(Reaction::ExplodeMover));
        assert_eq!(reaction(Role::Cargo, Role::Collector), Some(Reaction::Deliver));
        assert_eq!(reaction(Role::Cargo, Role::Cargo), Some(Reaction::ExplodeBoth));
        assert_eq!(reaction(Role::Projectile, Role::Structure), Some(Reaction::Shot));
        assert_eq!(reaction(Role::Rock, Role::Structure), Some(Reaction::DestroyOther));
        assert_eq!(reaction(Role::Rock, Role::Rock), None);
        assert_eq!(reaction(Role::Collector, Role::Cargo), None);
    }

    fn setup_world() -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(SpatialIndex::new(300.0));
        world.insert_resource(ActiveSet::default());
        world.insert_resource(ContactBuffer::default());
        let mut schedule = Schedule::default();
        schedule.add_systems(collision_gather_system);
        (world, schedule)
    }

    fn add_body(world: &mut World, bundle: BodyBundle, probe: bool) -> Entity {
        let pos = bundle.position;
        let radius = bundle.collider.radius;
        let bounds = FatBounds::compute(pos, radius, 16.0);
        let e = world.spawn((bundle, bounds)).id();
        if probe {
            world.entity_mut(e).insert(Probe);
        }
        world.resource_mut::<SpatialIndex>().insert(bounds.rect, e);
        world.resource_mut::<ActiveSet>().insert(e);
        e
    }

    fn cargo_body(x: f32, destination: Option<&str>, world: &mut World) -> Entity {
        let e = add_body(
            world,
            BodyBundle::new(
                ObjectClass::Ice,
                Role::Cargo,
                Position::new(x, 0.0),
                collider(9.0, CollisionGroups::CARGO, CollisionGroups::CARGO_MASK),
            ),
            true,
        );
        world.entity_mut(e).insert(Cargo {
            value: 10,
            destination: destination.map(String::from),
        });
        e
    }

    #[test]
    fn test_gather_finds_player_rock_contact() {
        let (mut world, mut schedule) = setup_world();
        let player = add_body(
            &mut world,
            BodyBundle::new(
                ObjectClass::Player,
                Role::Player,
                Position::new(0.0, 0.0),
                collider(8.0, CollisionGroups::PLAYER, CollisionGroups::PLAYER_MASK),
            ),
            true,
        );
        let rock = add_body(
            &mut world,
            BodyBundle::new(
                ObjectClass::Asteroid,
                Role::Rock,
                Position::new(30.0, 0.0),
                Collider::passive(32.0, CollisionGroups::SOLID),
            ),
            false,
        );

        schedule.run(&mut world);

        let contacts = &world.resource::<ContactBuffer>().contacts;
        assert_eq!(
            contacts,
            &vec![Contact { mover: player, other: rock, reaction: Reaction::ExplodeMover }]
        );
    }

    #[test]
    fn test_destination_filter() {
        let (mut world, mut schedule) = setup_world();
        let station = add_body(
            &mut world,
            BodyBundle::new(
                ObjectClass::CommsStation,
                Role::Collector,
                Position::new(0.0, 0.0),
                Collider::passive(40.0, CollisionGroups::BASE),
            ),
            false,
        );
        world
            .entity_mut(station)
            .insert((Collector, StableId("comm-station-4".into())));

        let wrong = cargo_body(20.0, Some("moonbase"), &mut world);
        schedule.run(&mut world);
        assert!(world.resource::<ContactBuffer>().contacts.is_empty());

        world.despawn(wrong);
        let rect = FatBounds::compute(Position::new(20.0, 0.0), 9.0, 16.0).rect;
        world.resource_mut::<SpatialIndex>().remove(rect, wrong);

        let any = cargo_body(-20.0, None, &mut world);
        schedule.run(&mut world);
        let contacts = &world.resource::<ContactBuffer>().contacts;
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].mover, any);
        assert_eq!(contacts[0].reaction, Reaction::Deliver);
    }

    #[test]
    fn test_inactive_probes_are_frozen() {
        let (mut world, mut schedule) = setup_world();
        let a = cargo_body(0.0, None, &mut world);
        let b = cargo_body(10.0, None, &mut world);
        world.resource_mut::<ActiveSet>().clear();

        schedule.run(&mut world);
        assert!(world.resource::<ContactBuffer>().contacts.is_empty());

        world.resource_mut::<ActiveSet>().insert(a);
        schedule.run(&mut world);
        let contacts = &world.resource::<ContactBuffer>().contacts;
        assert_eq!(
            contacts,
            &vec![Contact { mover: a, other: b, reaction: Reaction::ExplodeBoth }]
        );
    }

    #[test]
    fn test_projectile_skips_owner() {
        let (mut world, mut schedule) = setup_world();
        let player = add_body(
            &mut world,
            BodyBundle::new(
                ObjectClass::Player,
                Role::Player,
                Position::new(0.0, 0.0),
                collider(8.0, CollisionGroups::PLAYER, CollisionGroups::PLAYER_MASK),
            ),
            false,
        );
        let bullet = add_body(
            &mut world,
            BodyBundle::new(
                ObjectClass::Bullet,
                Role::Projectile,
                Position::new(2.0, 0.0),
                collider(3.0, CollisionGroups::PROJECTILE, CollisionGroups::BULLET_MASK),
            ),
            true,
        );
        world.entity_mut(bullet).insert(Projectile { owner: player });

        schedule.run(&mut world);
        assert!(world.resource::<ContactBuffer>().contacts.is_empty());
    }
}
