//! Error taxonomy.
//!
//! Gameplay outcomes (mission failure, a missed collision, a double kill) are
//! not errors. These types cover malformed definitions and I/O only.

use crate::registry::ObjectClass;

/// Spawning an object by class failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// The class exists but cannot be spawned by scripts.
    #[error("class {0:?} cannot be spawned by a script")]
    NotSpawnable(ObjectClass),
}

/// A mission definition could not be loaded or executed.
#[derive(thiserror::Error, Debug)]
pub enum ScriptError {
    /// Mission definitions did not parse.
    #[error("mission definition parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Mission definitions could not be read.
    #[error("mission definition I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A spawn step failed.
    #[error("spawn failed: {0}")]
    Spawn(#[from] SpawnError),

    /// A step referenced an object id that does not exist.
    #[error("no object with id {0:?}")]
    UnknownObject(String),

    /// A definition file contained no missions.
    #[error("no missions defined")]
    NoMissions,
}

/// Mission-index state file errors.
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed mission index {0:?}")]
    Parse(String),
}

/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can go wrong inside one frame of the game loop.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
