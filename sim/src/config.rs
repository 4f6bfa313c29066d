//! Game configuration.
//!
//! Every tunable lives in [`GameConfig`]. It is inserted into the ECS world as
//! a resource and can be loaded from / saved to JSON.

use crate::components::Position;
use crate::error::ConfigError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Display name of the home base, used for `{control}` in messages.
pub const MOONBASE_NAME: &str = "Moonbase Apollo";

/// Configuration for the simulation and game flow.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed timestep in seconds (1/60 for 60 Hz).
    pub fixed_timestep: f32,
    /// Spatial index cell size in world units.
    pub cell_size: f32,
    /// Fat-bounds margin around each collider.
    pub fat_margin: f32,
    /// Side of the square around the camera in which collidables update.
    pub cull_size: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Number of random asteroids generated at startup.
    pub asteroid_count: usize,
    /// Half side of the square the asteroid field is scattered over.
    pub asteroid_field_extent: f32,
    /// Asteroids are kept at least this far from the moon.
    pub asteroid_exclusion_radius: f32,
    pub player_spawn: Position,
    pub initial_money: i64,
    pub respawn_cost: i64,
    pub mission_bonus: i64,
    /// Where the current mission number is persisted.
    pub mission_file: PathBuf,
    /// Optional JSON mission definitions replacing the built-in campaign.
    pub mission_definitions: Option<PathBuf>,
    /// Enable the F3-F8 debug keys.
    pub cheats: bool,
    /// Seed for asteroid placement and other randomness.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            cell_size: 300.0,
            fat_margin: 16.0,
            cull_size: 3000.0,
            viewport_width: 1024.0,
            viewport_height: 600.0,
            asteroid_count: 700,
            asteroid_field_extent: 5000.0,
            asteroid_exclusion_radius: 632.0,
            player_spawn: Position::new(0.0, 180.0),
            initial_money: 100,
            respawn_cost: 50,
            mission_bonus: 100,
            mission_file: PathBuf::from(".mission"),
            mission_definitions: None,
            cheats: false,
            seed: 0x5EED,
        }
    }
}

impl GameConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// A small, empty sky for tests and demos.
    pub fn without_asteroids() -> Self {
        Self {
            asteroid_count: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(config.cell_size, 300.0);
        assert_eq!(config.respawn_cost, 50);
        assert_eq!(config.mission_file, PathBuf::from(".mission"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");

        let config = GameConfig {
            cheats: true,
            asteroid_count: 12,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(GameConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, r#"{ "initial_money": 500 }"#).unwrap();

        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.initial_money, 500);
        assert_eq!(config.respawn_cost, 50);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GameConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GameConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
