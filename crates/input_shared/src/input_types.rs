// crates/input_shared/src/input_types.rs
//! Compact input vocabulary shared by the controller core, the device backends
//! and the demo host.
//!
//! Controls are addressed by path strings of the form `<Layout>/control`,
//! e.g. `<Keyboard>/w`, `<Gamepad>/leftStick`, `<Mouse>/delta`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable integer index of a registered action.
pub type ActionId = u32;

/// Path of the composite slot that heads a 4-way digital binding.
pub const COMPOSITE_2D_PATH: &str = "2DVector";

/// Path used by the analog keyboard fallback.
pub const MOUSE_DELTA_PATH: &str = "<Mouse>/delta";

/// Device family a user rebinds or displays bindings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputDevice {
    Keyboard,
    Gamepad,
}

impl InputDevice {
    /// Layout prefix carried by every control path of this family.
    pub fn path_prefix(self) -> &'static str {
        match self {
            InputDevice::Keyboard => ControlDevice::Keyboard.path_prefix(),
            InputDevice::Gamepad => ControlDevice::Gamepad.path_prefix(),
        }
    }

    /// True when an activation coming from `device` may satisfy a capture for
    /// this family. The mouse never satisfies either.
    pub fn accepts(self, device: ControlDevice) -> bool {
        matches!(
            (self, device),
            (InputDevice::Keyboard, ControlDevice::Keyboard)
                | (InputDevice::Gamepad, ControlDevice::Gamepad)
        )
    }
}

impl fmt::Display for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputDevice::Keyboard => f.write_str("Keyboard"),
            InputDevice::Gamepad => f.write_str("Gamepad"),
        }
    }
}

/// Physical device a control path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlDevice {
    Keyboard,
    Mouse,
    Gamepad,
}

impl ControlDevice {
    pub fn path_prefix(self) -> &'static str {
        match self {
            ControlDevice::Keyboard => "<Keyboard>",
            ControlDevice::Mouse => "<Mouse>",
            ControlDevice::Gamepad => "<Gamepad>",
        }
    }

    /// Resolves the device of a control path from its layout prefix.
    pub fn from_path(path: &str) -> Option<Self> {
        [ControlDevice::Keyboard, ControlDevice::Mouse, ControlDevice::Gamepad]
            .into_iter()
            .find(|device| path.starts_with(device.path_prefix()))
    }
}

/// Shape of a physical control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Keys, face buttons, shoulders, dpad directions.
    Button,
    /// Two-axis sticks.
    Stick,
    /// Relative motion such as mouse delta.
    Delta,
}

/// A single "this control just became active" report from a device backend.
/// Interactive rebinding listens for these.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlActivation {
    pub path: String,
    pub device: ControlDevice,
    pub kind: ControlKind,
}

impl ControlActivation {
    /// Builds an activation, deriving the device from the path prefix.
    /// Returns `None` for paths with an unknown layout.
    pub fn new(path: impl Into<String>, kind: ControlKind) -> Option<Self> {
        let path = path.into();
        let device = ControlDevice::from_path(&path)?;
        Some(Self { path, device, kind })
    }
}

/// Named part of a 4-way composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositePart {
    Up,
    Down,
    Left,
    Right,
}

impl CompositePart {
    pub const ALL: [CompositePart; 4] = [
        CompositePart::Up,
        CompositePart::Down,
        CompositePart::Left,
        CompositePart::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CompositePart::Up => "up",
            CompositePart::Down => "down",
            CompositePart::Left => "left",
            CompositePart::Right => "right",
        }
    }

    /// Case-insensitive lookup by part name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|part| part.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CompositePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Human readable name for a control path.
///
/// `<Keyboard>/leftShift` -> `Left Shift`, `<Gamepad>/dpad/up` -> `Dpad Up`.
pub fn display_name(path: &str) -> String {
    let control = match path.find('>') {
        Some(idx) => &path[idx + 1..],
        None => path,
    };

    control
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(humanize_segment)
        .collect::<Vec<_>>()
        .join(" ")
}

fn humanize_segment(segment: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in segment.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
