//! Moonbase Apollo - Simulation Core
//!
//! The simulation behind a 2D space-arcade game: a ship flies around a moon,
//! shoots asteroids, tows cargo home with a tractor beam and works through a
//! campaign of scripted missions.
//! Uses `bevy_ecs` for the entity-component-system architecture.
//!
//! Rendering, audio and input plumbing are left to the host, which talks to
//! the core through the traits in [`interfaces`] and through [`Game`].

pub mod collision;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod hud;
pub mod interfaces;
pub mod mission;
pub mod persist;
pub mod registry;
pub mod scheduler;
pub mod ships;
pub mod snapshot;
pub mod spatial;
pub mod systems;
pub mod world;

pub use collision::{CollisionGroups, Contact, Reaction, Role};
pub use components::*;
pub use config::{GameConfig, MOONBASE_NAME};
pub use error::{ConfigError, GameError, PersistError, ScriptError, SpawnError};
pub use events::{EventBus, EventKind, EventResult, ObjectInfo, Subscriber, WorldEvent};
pub use game::{Game, GameTask};
pub use hud::{Colour, Hud};
pub use interfaces::{AudioPlayer, DrawItem, Key, Renderer, ResourceLoader, Sound};
pub use mission::{Mission, MissionOutcome, MissionState, Region, SpawnStep, Step};
pub use registry::{ObjectClass, ObjectRegistry, SpawnParams};
pub use scheduler::{Clock, Scheduler};
pub use ships::ShipModel;
pub use snapshot::{ObjectSnapshot, WorldSnapshot};
pub use spatial::{Rect, SpatialIndex};
pub use systems::*;
pub use world::SpaceWorld;
