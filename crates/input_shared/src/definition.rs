// crates/input_shared/src/definition.rs
//! Authoring-side description of logical inputs.
//!
//! Definitions are immutable once loaded; the controller builds its binding
//! graph from them exactly once per (re)build.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input_types::CompositePart;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access input definitions file: {0}")]
    Io(#[from] std::io::Error),

    #[error("input definitions file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a logical input produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BindingKind {
    /// Discrete on/off with edge, hold and repeat semantics.
    #[default]
    Button,
    /// Vector built from four directional parts or from one analog source.
    Composite2D,
}

/// Control paths of one device family for one action.
///
/// `primary` is the button path (Button kind) or the analog fallback path
/// (Composite2D). `up`/`down`/`left`/`right` drive the digital composite.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingSet {
    pub primary: String,
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
}

impl BindingSet {
    pub fn button(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            ..Default::default()
        }
    }

    pub fn four_way(
        up: impl Into<String>,
        down: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            up: up.into(),
            down: down.into(),
            left: left.into(),
            right: right.into(),
            ..Default::default()
        }
    }

    pub fn with_primary(mut self, primary: impl Into<String>) -> Self {
        self.primary = primary.into();
        self
    }

    pub fn part(&self, part: CompositePart) -> &str {
        match part {
            CompositePart::Up => &self.up,
            CompositePart::Down => &self.down,
            CompositePart::Left => &self.left,
            CompositePart::Right => &self.right,
        }
    }

    pub fn has_primary(&self) -> bool {
        !self.primary.is_empty()
    }

    /// A composite exists for this family only when `up` is set.
    pub fn has_four_way(&self) -> bool {
        !self.up.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputDefinition {
    pub id: String,
    pub kind: BindingKind,
    pub keyboard: BindingSet,
    pub gamepad: BindingSet,
    /// Composite2D only: mouse delta may replace the keyboard composite.
    pub allow_analog_keyboard: bool,
    /// Composite2D only: the gamepad primary stick may replace the gamepad composite.
    pub allow_analog_gamepad: bool,
    /// Without a saved profile, start in mouse mode (needs `allow_analog_keyboard`).
    pub default_use_mouse_for_keyboard: bool,
}

impl InputDefinition {
    pub fn button(id: impl Into<String>, keyboard: BindingSet, gamepad: BindingSet) -> Self {
        Self {
            id: id.into(),
            kind: BindingKind::Button,
            keyboard,
            gamepad,
            ..Default::default()
        }
    }

    pub fn composite(id: impl Into<String>, keyboard: BindingSet, gamepad: BindingSet) -> Self {
        Self {
            id: id.into(),
            kind: BindingKind::Composite2D,
            keyboard,
            gamepad,
            ..Default::default()
        }
    }

    pub fn with_analog_keyboard(mut self, default_use_mouse: bool) -> Self {
        self.allow_analog_keyboard = true;
        self.default_use_mouse_for_keyboard = default_use_mouse;
        self
    }

    pub fn with_analog_gamepad(mut self) -> Self {
        self.allow_analog_gamepad = true;
        self
    }

    /// Whether a profile-less start puts this action in analog keyboard mode.
    pub fn seeds_analog_keyboard(&self) -> bool {
        self.kind == BindingKind::Composite2D
            && self.allow_analog_keyboard
            && self.default_use_mouse_for_keyboard
    }
}

/// The definitions file: an ordered list of logical inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub inputs: Vec<InputDefinition>,
}

impl InputConfig {
    pub fn new(inputs: Vec<InputDefinition>) -> Self {
        Self { inputs }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
