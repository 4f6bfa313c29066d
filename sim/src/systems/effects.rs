//! Attachments and short-lived effects.
//!
//! Entities that must die as a result of these systems are queued on the
//! [`KillQueue`]; the world kills them after the schedule has run so the
//! spatial index and id map stay consistent.

use crate::components::*;
use bevy_ecs::prelude::*;

use super::movement::DeltaTime;

/// Entities to kill once the schedule has finished.
#[derive(Resource, Debug, Default)]
pub struct KillQueue(pub Vec<Entity>);

/// Keeps mounted bodies at their offset, rotated with the parent.
pub fn mounted_system(
    parents: Query<(&Position, &Heading), Without<Mounted>>,
    mut mounted: Query<(&mut Position, &Mounted)>,
) {
    for (mut pos, mount) in mounted.iter_mut() {
        if let Ok((parent_pos, heading)) = parents.get(mount.parent) {
            let (ox, oy) = rotate(mount.offset.0, mount.offset.1, -heading.0);
            pos.x = parent_pos.x + ox;
            pos.y = parent_pos.y + oy;
        }
    }
}

/// Moves labels and signposts onto their target; orphans are queued for
/// removal.
pub fn follower_system(
    targets: Query<&Position, Without<Follow>>,
    mut followers: Query<(Entity, &mut Position, &Follow)>,
    mut kills: ResMut<KillQueue>,
) {
    for (entity, mut pos, follow) in followers.iter_mut() {
        match targets.get(follow.target) {
            Ok(target) => {
                pos.x = target.x + follow.offset.0;
                pos.y = target.y + follow.offset.1;
            }
            Err(_) => kills.0.push(entity),
        }
    }
}

pub fn lifetime_system(
    dt: Res<DeltaTime>,
    mut query: Query<(Entity, &mut Lifetime)>,
    mut kills: ResMut<KillQueue>,
) {
    for (entity, mut lifetime) in query.iter_mut() {
        lifetime.0 -= dt.0;
        if lifetime.0 <= 0.0 {
            kills.0.push(entity);
        }
    }
}
