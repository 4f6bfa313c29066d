//! Active set and fat-bounds maintenance.

use crate::components::*;
use crate::config::GameConfig;
use crate::spatial::SpatialIndex;
use bevy_ecs::prelude::*;
use std::collections::HashSet;

/// Collidable entities inside the cull rect around the camera this frame.
///
/// Only these are moved and only these probe for contacts.
#[derive(Resource, Debug, Default, Clone)]
pub struct ActiveSet(HashSet<Entity>);

impl ActiveSet {
    pub fn insert(&mut self, entity: Entity) {
        self.0.insert(entity);
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }

    pub fn replace(&mut self, entities: HashSet<Entity>) {
        self.0 = entities;
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Re-registers bodies whose fat rect no longer contains their circle.
pub fn fat_bounds_system(
    config: Res<GameConfig>,
    mut index: ResMut<SpatialIndex>,
    mut bodies: Query<(Entity, &Position, &Collider, &mut FatBounds)>,
) {
    let margin = config.fat_margin;
    for (entity, pos, collider, mut bounds) in bodies.iter_mut() {
        if !bounds.is_stale(*pos, collider.radius, margin) {
            continue;
        }
        index.remove(bounds.rect, entity);
        *bounds = FatBounds::compute(*pos, collider.radius, margin);
        index.insert(bounds.rect, entity);
    }
}
