//! Persisted mission progress.
//!
//! The only on-disk state: the 1-based number of the mission last started,
//! written as a plain decimal integer.

use crate::error::PersistError;
use log::warn;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MissionStateFile {
    path: PathBuf,
}

impl MissionStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored mission number; 1 when no file exists yet.
    pub fn load(&self) -> Result<usize, PersistError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(1),
            Err(e) => return Err(e.into()),
        };
        let trimmed = contents.trim();
        match trimmed.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(PersistError::Parse(trimmed.to_string())),
        }
    }

    /// Like [`MissionStateFile::load`], but falls back to mission 1 on error.
    pub fn load_or_default(&self) -> usize {
        self.load().unwrap_or_else(|e| {
            warn!("ignoring mission state file {:?}: {}", self.path, e);
            1
        })
    }

    pub fn save(&self, mission: usize) -> Result<(), PersistError> {
        std::fs::write(&self.path, mission.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_first_mission() {
        let dir = tempfile::tempdir().unwrap();
        let state = MissionStateFile::new(dir.path().join(".mission"));
        assert_eq!(state.load().unwrap(), 1);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let state = MissionStateFile::new(dir.path().join(".mission"));
        state.save(4).unwrap();
        assert_eq!(std::fs::read_to_string(state.path()).unwrap(), "4");
        assert_eq!(state.load().unwrap(), 4);
    }

    #[test]
    fn test_malformed_contents() {
        let dir = tempfile::tempdir().unwrap();
        let state = MissionStateFile::new(dir.path().join(".mission"));
        std::fs::write(state.path(), "four").unwrap();
        assert!(matches!(state.load(), Err(PersistError::Parse(_))));
        assert_eq!(state.load_or_default(), 1);

        std::fs::write(state.path(), " 7\n").unwrap();
        assert_eq!(state.load().unwrap(), 7);
    }
}
