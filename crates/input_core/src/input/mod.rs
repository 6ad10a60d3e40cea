// crates/input_core/src/input/mod.rs
pub mod action_state;
pub mod backend;
pub mod builder;
pub mod config;
pub mod flags;
pub mod graph;
pub mod poller;
pub mod rebind;
pub mod registry;
pub mod signal;

// Re-export core types to keep the API at `crate::input::*`
pub use action_state::{ActionEdge, ActionHandles, ActionState, RepeatSettings};
pub use backend::{DeviceState, InputBackend, STICK_ACTIVATION_THRESHOLD};
pub use builder::{BindingGraphBuilder, BuiltInputs};
pub use config::{ControllerConfig, InputDefaults};
pub use flags::{FlagChange, FlagKind, FlagSets, ProfileFlagStore};
pub use graph::{BindingGraph, BindingSlot, SlotRef, StableId, SubAction, SubActionHandle, SubActionRole};
pub use poller::InputPoller;
pub use rebind::{CancelReason, ConflictPolicy, RebindPhase, RebindRequest, RebindingCoordinator};
pub use registry::{ActionEntry, ActionRegistry};
pub use signal::{ObserverToken, Signal};
