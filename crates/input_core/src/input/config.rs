// crates/input_core/src/input/config.rs

use std::path::PathBuf;

use input_shared::{BindingSet, InputDefinition};

use crate::input::action_state::RepeatSettings;
use crate::input::rebind::ConflictPolicy;

/// Directory name under the platform data dir that holds profile files.
pub const PROFILES_SUBDIR: &str = "InputProfiles";
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_REBIND_TIMEOUT_SECS: f64 = 5.0;

/// Centralized default definitions.
/// Used when the host does not ship its own definitions file.
pub struct InputDefaults;

impl InputDefaults {
    /// Move (WASD / dpad / left stick), Look (arrows / mouse / right stick),
    /// Jump and Interact.
    pub fn definitions() -> Vec<InputDefinition> {
        vec![
            InputDefinition::composite(
                "Move",
                BindingSet::four_way("<Keyboard>/w", "<Keyboard>/s", "<Keyboard>/a", "<Keyboard>/d"),
                BindingSet::four_way(
                    "<Gamepad>/dpad/up",
                    "<Gamepad>/dpad/down",
                    "<Gamepad>/dpad/left",
                    "<Gamepad>/dpad/right",
                )
                .with_primary("<Gamepad>/leftStick"),
            )
            .with_analog_gamepad(),
            InputDefinition::composite(
                "Look",
                BindingSet::four_way(
                    "<Keyboard>/upArrow",
                    "<Keyboard>/downArrow",
                    "<Keyboard>/leftArrow",
                    "<Keyboard>/rightArrow",
                ),
                BindingSet::button("<Gamepad>/rightStick"),
            )
            .with_analog_keyboard(true)
            .with_analog_gamepad(),
            InputDefinition::button(
                "Jump",
                BindingSet::button("<Keyboard>/space"),
                BindingSet::button("<Gamepad>/buttonSouth"),
            ),
            InputDefinition::button(
                "Interact",
                BindingSet::button("<Keyboard>/e"),
                BindingSet::button("<Gamepad>/buttonWest"),
            ),
        ]
    }
}

/// Controller-level settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub profiles_dir: PathBuf,
    /// Profile loaded by `init`.
    pub default_profile: String,
    /// `None` lets captures wait forever.
    pub rebind_timeout: Option<f64>,
    pub conflict_policy: ConflictPolicy,
    /// Repeat timing every action starts with.
    pub default_repeat: RepeatSettings,
}

impl ControllerConfig {
    /// Platform data dir when available, else a directory next to the
    /// working directory.
    pub fn default_profiles_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("input_controller").join(PROFILES_SUBDIR))
            .unwrap_or_else(|| PathBuf::from(PROFILES_SUBDIR))
    }

    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = dir.into();
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            profiles_dir: Self::default_profiles_dir(),
            default_profile: DEFAULT_PROFILE.to_string(),
            rebind_timeout: Some(DEFAULT_REBIND_TIMEOUT_SECS),
            conflict_policy: ConflictPolicy::Allow,
            default_repeat: RepeatSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_definitions_have_unique_ids() {
        let defs = InputDefaults::definitions();
        let ids: HashSet<_> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), defs.len());
        assert!(defs.iter().any(|d| d.seeds_analog_keyboard()));
    }

    #[test]
    fn default_config_uses_five_second_timeout() {
        let config = ControllerConfig::default();
        assert_eq!(config.default_profile, "default");
        assert_eq!(config.rebind_timeout, Some(5.0));
        assert!(config.profiles_dir.ends_with(PROFILES_SUBDIR));
    }
}
