// crates/input_core/src/profile.rs
//! Named profiles on disk: one JSON file per name holding the override blob
//! and the three flag sets.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProfileError;
use crate::input::flags::FlagSets;

const PROFILE_EXTENSION: &str = "json";

/// Persisted shape of a profile. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileRecord {
    pub binding_overrides: String,
    pub analog_keyboards: Vec<String>,
    pub analog_gamepads: Vec<String>,
    pub inverted_y_inputs: Vec<String>,
}

impl ProfileRecord {
    pub fn new(binding_overrides: impl Into<String>, flags: &FlagSets) -> Self {
        Self {
            binding_overrides: binding_overrides.into(),
            analog_keyboards: flags.analog_keyboard.iter().cloned().collect(),
            analog_gamepads: flags.analog_gamepad.iter().cloned().collect(),
            inverted_y_inputs: flags.inverted_y.iter().cloned().collect(),
        }
    }

    pub fn flag_sets(&self) -> FlagSets {
        FlagSets {
            analog_keyboard: self.analog_keyboards.iter().cloned().collect(),
            analog_gamepad: self.analog_gamepads.iter().cloned().collect(),
            inverted_y: self.inverted_y_inputs.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `name`. Names must be usable as a plain file stem.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, ProfileError> {
        let valid = !name.trim().is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', ':', '\0']);
        if !valid {
            return Err(ProfileError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{PROFILE_EXTENSION}")))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }

    /// Reads a profile. Missing, unreadable and corrupt files all come back
    /// as `None`; the latter two are logged.
    pub fn load(&self, name: &str) -> Option<ProfileRecord> {
        let path = match self.path_for(name) {
            Ok(path) => path,
            Err(err) => {
                warn!("Cannot load input profile: {err}");
                return None;
            }
        };

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!("Failed to read input profile '{name}': {err}");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Failed to parse input profile '{name}': {err}");
                None
            }
        }
    }

    /// Writes the whole record, replacing whatever was stored.
    pub fn save(&self, name: &str, record: &ProfileRecord) -> Result<(), ProfileError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|source| ProfileError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).map_err(|source| ProfileError::Io { path: path.clone(), source })?;

        debug!("Saved input profile '{name}' to {}", path.display());
        Ok(())
    }

    /// Saved profile names, sorted.
    pub fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!("Failed to list input profiles in {}: {err}", self.dir.display());
                }
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == PROFILE_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Returns whether a file was removed.
    pub fn delete(&self, name: &str) -> Result<bool, ProfileError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ProfileError::Io { path, source }),
        }
    }

    /// Whether saving `overrides` and `flags` under `name` would change what
    /// is stored. Never writes.
    pub fn would_change(&self, name: &str, overrides: &str, flags: &FlagSets) -> bool {
        let Some(stored) = self.load(name) else {
            return true;
        };

        stored.binding_overrides != overrides || stored.flag_sets() != *flags
    }
}
