//! Hostile droids that shoot at the player.

use crate::components::*;
use crate::registry::BULLET_SPEED;
use crate::systems::bounds::ActiveSet;
use bevy_ecs::prelude::*;

use super::movement::DeltaTime;

pub const DROID_RANGE: f32 = 400.0;
/// Seconds between shots.
pub const DROID_FIRE_INTERVAL: f32 = 1.5;

/// Deferred spawn produced by a system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnRequest {
    Bullet {
        owner: Entity,
        position: Position,
        velocity: Velocity,
    },
}

#[derive(Resource, Debug, Default)]
pub struct SpawnQueue(pub Vec<SpawnRequest>);

/// Turns active droids towards the player and fires when in range.
pub fn droid_system(
    dt: Res<DeltaTime>,
    active: Res<ActiveSet>,
    players: Query<&Position, With<Player>>,
    mut droids: Query<(Entity, &Position, &mut Heading, &mut Droid)>,
    mut spawns: ResMut<SpawnQueue>,
) {
    let Some(target) = players.iter().next() else {
        return;
    };
    for (entity, pos, mut heading, mut droid) in droids.iter_mut() {
        if !active.contains(entity) {
            continue;
        }
        let dx = target.x - pos.x;
        let dy = target.y - pos.y;
        if dx * dx + dy * dy > DROID_RANGE * DROID_RANGE {
            continue;
        }
        heading.0 = dx.atan2(dy).to_degrees();

        droid.cooldown -= dt.0;
        if droid.cooldown > 0.0 {
            continue;
        }
        droid.cooldown = DROID_FIRE_INTERVAL;
        let aim = Velocity::new(dx, dy).normalized();
        spawns.0.push(SpawnRequest::Bullet {
            owner: entity,
            position: *pos,
            velocity: Velocity::new(aim.vx * BULLET_SPEED, aim.vy * BULLET_SPEED),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (World, Schedule, Entity) {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0));
        world.insert_resource(ActiveSet::default());
        world.insert_resource(SpawnQueue::default());
        world.spawn((Player, Position::new(0.0, 300.0)));
        let droid = world
            .spawn((Position::new(0.0, 0.0), Heading(180.0), Droid { cooldown: 1.0 }))
            .id();
        world.resource_mut::<ActiveSet>().insert(droid);
        let mut schedule = Schedule::default();
        schedule.add_systems(droid_system);
        (world, schedule, droid)
    }

    #[test]
    fn test_droid_aims_and_fires() {
        let (mut world, mut schedule, droid) = setup();
        schedule.run(&mut world);

        assert!(world.get::<Heading>(droid).unwrap().0.abs() < 1e-3);
        let spawns = &world.resource::<SpawnQueue>().0;
        assert_eq!(spawns.len(), 1);
        let SpawnRequest::Bullet { owner, velocity, .. } = spawns[0];
        assert_eq!(owner, droid);
        assert!((velocity.vy - BULLET_SPEED).abs() < 1e-3);

        // Cooling down
        world.resource_mut::<SpawnQueue>().0.clear();
        schedule.run(&mut world);
        assert!(world.resource::<SpawnQueue>().0.is_empty());
    }

    #[test]
    fn test_droid_ignores_distant_player() {
        let (mut world, mut schedule, droid) = setup();
        world.get_mut::<Position>(droid).unwrap().y = -1000.0;
        schedule.run(&mut world);
        assert!(world.resource::<SpawnQueue>().0.is_empty());
    }
}
