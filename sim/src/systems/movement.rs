//! Movement systems - ship controls, tractor beam physics and drifting bodies.

use crate::components::*;
use crate::interfaces::{InputState, Key};
use crate::systems::bounds::ActiveSet;
use bevy_ecs::prelude::*;

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// Resource tracking the current simulation tick.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 += 1;
    }
}

/// Tractor beam spring constant.
pub const TETHER_FORCE: f32 = 0.5;
/// Damping of the towed item's velocity towards the ship's.
pub const TETHER_DAMPING: f32 = 0.9;
/// Squared slack length; inside it the beam pulls nothing.
pub const TETHER_SLACK2: f32 = 900.0;

type PlayerQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut Position,
        &'static mut Velocity,
        &'static mut Heading,
        &'static Ship,
        Option<&'static Tether>,
    ),
    With<Player>,
>;

type TowedQuery<'w, 's> =
    Query<'w, 's, (&'static Position, &'static mut Velocity, &'static Mass), Without<Player>>;

/// Thrust, rotation and tractor beam for the player ship.
///
/// The ship is integrated with the average of the old and new velocity; the
/// towed item only gets its velocity changed here and is moved by
/// [`drift_system`].
pub fn player_motion_system(
    dt: Res<DeltaTime>,
    input: Res<InputState>,
    mut players: PlayerQuery,
    mut towed: TowedQuery,
) {
    let delta = dt.0;
    for (mut pos, mut vel, mut heading, ship, tether) in players.iter_mut() {
        let model = ship.0;
        let u = *vel;

        if input.is_held(Key::Up) {
            let (dx, dy) = heading.direction();
            vel.vx += dx * model.acceleration * delta;
            vel.vy += dy * model.acceleration * delta;
        }
        if input.is_held(Key::Left) {
            heading.0 -= model.rotation * delta;
        }
        if input.is_held(Key::Right) {
            heading.0 += model.rotation * delta;
        }

        if let Some(tether) = tether {
            if let Ok((item_pos, mut item_vel, item_mass)) = towed.get_mut(tether.item) {
                let ax = pos.x - item_pos.x;
                let ay = pos.y - item_pos.y;
                if ax * ax + ay * ay > TETHER_SLACK2 {
                    let ix = ax * TETHER_FORCE * delta;
                    let iy = ay * TETHER_FORCE * delta;
                    item_vel.vx += ix / item_mass.0;
                    item_vel.vy += iy / item_mass.0;
                    vel.vx -= ix / model.mass;
                    vel.vy -= iy / model.mass;
                }
                item_vel.vx -= TETHER_DAMPING * (item_vel.vx - vel.vx) * delta;
                item_vel.vy -= TETHER_DAMPING * (item_vel.vy - vel.vy) * delta;
            }
        }

        let speed = vel.magnitude();
        if speed > model.max_speed {
            let k = model.max_speed / speed;
            vel.vx *= k;
            vel.vy *= k;
        }

        pos.x += 0.5 * (u.vx + vel.vx) * delta;
        pos.y += 0.5 * (u.vy + vel.vy) * delta;
    }
}

type DriftQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Position,
        &'static Velocity,
        Option<&'static mut Heading>,
        Option<&'static Spin>,
        Has<Collider>,
    ),
    (Without<Player>, Without<Mounted>, Without<Follow>),
>;

/// Applies velocity and spin to everything that is not the player.
///
/// Collidable bodies outside the active set are frozen.
pub fn drift_system(dt: Res<DeltaTime>, active: Res<ActiveSet>, mut bodies: DriftQuery) {
    let delta = dt.0;
    for (entity, mut pos, vel, heading, spin, collidable) in bodies.iter_mut() {
        if collidable && !active.contains(entity) {
            continue;
        }
        pos.x += vel.vx * delta;
        pos.y += vel.vy * delta;
        if let (Some(mut heading), Some(spin)) = (heading, spin) {
            heading.0 += spin.0 * delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ships::CUTTER;

    fn setup(input: InputState, dt: f32) -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(DeltaTime(dt));
        world.insert_resource(input);
        world.insert_resource(ActiveSet::default());
        let mut schedule = Schedule::default();
        schedule.add_systems((player_motion_system, drift_system).chain());
        (world, schedule)
    }

    fn spawn_player(world: &mut World) -> Entity {
        world
            .spawn((
                Player,
                Position::new(0.0, 0.0),
                Velocity::default(),
                Heading(0.0),
                Ship(CUTTER),
            ))
            .id()
    }

    #[test]
    fn test_thrust_accelerates_along_heading() {
        let mut input = InputState::default();
        input.press(Key::Up);
        let (mut world, mut schedule) = setup(input, 0.1);
        let player = spawn_player(&mut world);

        schedule.run(&mut world);

        let vel = world.get::<Velocity>(player).unwrap();
        assert!(vel.vx.abs() < 1e-4);
        assert!((vel.vy - CUTTER.acceleration * 0.1).abs() < 1e-3);
        // Trapezoidal integration: half the final velocity over the step.
        let pos = world.get::<Position>(player).unwrap();
        assert!((pos.y - 0.5 * vel.vy * 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut input = InputState::default();
        input.press(Key::Up);
        let (mut world, mut schedule) = setup(input, 0.5);
        let player = spawn_player(&mut world);
        world.get_mut::<Velocity>(player).unwrap().vy = CUTTER.max_speed;

        schedule.run(&mut world);

        let vel = world.get::<Velocity>(player).unwrap();
        assert!(vel.magnitude() <= CUTTER.max_speed + 1e-3);
    }

    #[test]
    fn test_tether_pulls_item_toward_ship() {
        let (mut world, mut schedule) = setup(InputState::default(), 0.5);
        let player = spawn_player(&mut world);
        let item = world
            .spawn((
                Position::new(0.0, -100.0),
                Velocity::default(),
                Mass(0.5),
                Collider::passive(9.0, crate::collision::CollisionGroups::CARGO),
            ))
            .id();
        world.entity_mut(player).insert(Tether { item });
        world.resource_mut::<ActiveSet>().insert(item);

        schedule.run(&mut world);

        let item_vel = world.get::<Velocity>(item).unwrap();
        assert!(item_vel.vy > 0.0);
        let ship_vel = world.get::<Velocity>(player).unwrap();
        assert!(ship_vel.vy < 0.0);
        assert!(world.get::<Position>(item).unwrap().y > -100.0);
    }

    #[test]
    fn test_inactive_collidables_are_frozen() {
        let (mut world, mut schedule) = setup(InputState::default(), 0.5);
        let collider = Collider::passive(32.0, crate::collision::CollisionGroups::SOLID);
        let frozen = world
            .spawn((Position::new(0.0, 0.0), Velocity::new(10.0, 0.0), collider))
            .id();
        let awake = world
            .spawn((Position::new(0.0, 0.0), Velocity::new(10.0, 0.0), collider))
            .id();
        let label = world.spawn((Position::new(0.0, 0.0), Velocity::new(10.0, 0.0))).id();
        world.resource_mut::<ActiveSet>().insert(awake);

        schedule.run(&mut world);

        assert_eq!(world.get::<Position>(frozen).unwrap().x, 0.0);
        assert_eq!(world.get::<Position>(awake).unwrap().x, 5.0);
        assert_eq!(world.get::<Position>(label).unwrap().x, 5.0);
    }
}
