//! Seams between the simulation and its host.
//!
//! The host owns the window, sprites, fonts and audio. It feeds key state in
//! through [`InputState`] and receives draw items and sound cues back through
//! the [`Renderer`] and [`AudioPlayer`] traits.

use crate::components::Position;
use crate::hud::{Colour, Hud};
use crate::registry::ObjectClass;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Keys the game reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Left,
    Right,
    /// Fire, or release the tractor beam.
    Z,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
}

/// Keys currently held down, polled by the ship controls every tick.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    Laser,
    Pickup,
    Drop,
    Ding,
    Message,
    Goal,
    Explosion,
}

impl Sound {
    pub fn asset_name(self) -> &'static str {
        match self {
            Sound::Laser => "laser.wav",
            Sound::Pickup => "pickup.wav",
            Sound::Drop => "drop.wav",
            Sound::Ding => "ding.wav",
            Sound::Message => "message.wav",
            Sound::Goal => "goal.wav",
            Sound::Explosion => "explosion.wav",
        }
    }
}

/// A sound to play at a world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundCue {
    pub sound: Sound,
    pub position: Position,
}

pub trait AudioPlayer {
    fn play(&mut self, cue: SoundCue);
}

/// Everything a host needs to draw one object.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub entity: Entity,
    pub class: ObjectClass,
    pub position: Position,
    /// Degrees clockwise.
    pub rotation: f32,
    pub radius: f32,
    pub text: Option<String>,
    pub colour: Colour,
    /// Other end of a tractor beam.
    pub tether: Option<Position>,
}

pub trait Renderer {
    /// Called once per frame with the camera centre.
    fn begin(&mut self, _camera: Position) {}
    fn draw(&mut self, item: &DrawItem);
    fn draw_hud(&mut self, _hud: &Hud) {}
}

/// Opaque asset handle minted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u32);

pub trait ResourceLoader {
    fn load(&mut self, name: &str) -> Handle;
}

/// Memoises loader calls so each asset is loaded once.
#[derive(Debug, Default)]
pub struct HandleCache {
    handles: HashMap<String, Handle>,
}

impl HandleCache {
    pub fn get_or_load(&mut self, name: &str, loader: &mut dyn ResourceLoader) -> Handle {
        if let Some(handle) = self.handles.get(name) {
            return *handle;
        }
        let handle = loader.load(name);
        self.handles.insert(name.to_string(), handle);
        handle
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
