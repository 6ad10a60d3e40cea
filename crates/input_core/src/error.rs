// crates/input_core/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

use input_shared::ConfigError;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid profile name '{0}'")]
    InvalidName(String),

    #[error("profile I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("profile JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unknown input '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("override blob is malformed: {0}")]
    OverrideBlob(#[source] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("definition watcher failed: {0}")]
    Watch(#[from] notify::Error),
}
