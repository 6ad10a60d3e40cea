// crates/input_core/src/lib.rs

pub mod controller;
pub mod error;
pub mod frame_clock;
pub mod hot_reload;
pub mod input;
pub mod profile;

// Re-export the façade so hosts only need `input_core::InputController`
pub use controller::{BoundSlot, InputController};
pub use error::{InputError, ProfileError};
pub use frame_clock::FrameClock;
pub use hot_reload::DefinitionWatcher;
pub use input::{
    ActionEdge, ActionState, CancelReason, ConflictPolicy, ControllerConfig, DeviceState,
    InputBackend, InputDefaults, InputPoller, ObserverToken, RebindPhase,
};
pub use profile::{ProfileRecord, ProfileStore};
