//! Serializable view of the world for hosts, tools and debugging.

use crate::components::*;
use crate::hud::Message;
use crate::registry::ObjectClass;
use crate::world::SpaceWorld;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// One object in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    /// Entity bits; stable for the lifetime of the object.
    pub id: u64,
    pub class: ObjectClass,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub radius: f32,
    pub name: Option<String>,
    pub stable_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub time: f64,
    pub money: i64,
    pub camera: Position,
    pub player: Option<u64>,
    pub objects: Vec<ObjectSnapshot>,
    pub messages: Vec<Message>,
    pub countdown: Option<String>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

impl SpaceWorld {
    pub fn snapshot(&mut self) -> WorldSnapshot {
        let mut query = self.ecs_mut().query::<(
            Entity,
            &Class,
            &Position,
            Option<&Heading>,
            Option<&Collider>,
            Option<&Name>,
            Option<&StableId>,
        )>();
        let objects = query
            .iter(self.ecs())
            .map(|(entity, class, pos, heading, collider, name, id)| ObjectSnapshot {
                id: entity.to_bits(),
                class: class.0,
                x: pos.x,
                y: pos.y,
                rotation: heading.map(|h| h.0).unwrap_or(0.0),
                radius: collider.map(|c| c.radius).unwrap_or(0.0),
                name: name.map(|n| n.0.clone()),
                stable_id: id.map(|s| s.0.clone()),
            })
            .collect();

        WorldSnapshot {
            tick: self.tick(),
            time: self.time(),
            money: self.money(),
            camera: self.camera(),
            player: self.player().map(|e| e.to_bits()),
            objects,
            messages: self.hud.messages().to_vec(),
            countdown: self.hud.countdown_text(),
        }
    }
}
