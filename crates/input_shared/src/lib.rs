// crates/input_shared/src/lib.rs

pub mod definition;
pub mod input_types;

pub use definition::{BindingKind, BindingSet, ConfigError, InputConfig, InputDefinition};
pub use input_types::{
    display_name, ActionId, CompositePart, ControlActivation, ControlDevice, ControlKind,
    InputDevice, COMPOSITE_2D_PATH, MOUSE_DELTA_PATH,
};

// Vector type used for every 2D value the controller produces.
pub use glam::Vec2;
