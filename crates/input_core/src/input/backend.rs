// crates/input_core/src/input/backend.rs
//! The seam between the controller and whatever delivers device events.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::Vec2;

use input_shared::{ControlActivation, ControlKind};

/// Sticks count as "activated" for capture once they leave this radius.
pub const STICK_ACTIVATION_THRESHOLD: f32 = 0.5;

/// What the controller needs from a device backend: the current value of a
/// control path and a queue of fresh activations for interactive capture.
pub trait InputBackend {
    /// Is the button-like control at `path` currently down?
    fn is_pressed(&self, path: &str) -> bool;

    /// Current vector value of a stick or delta control.
    fn read_vector(&self, path: &str) -> Vec2;

    /// Pops the oldest activation not yet consumed.
    fn next_activation(&mut self) -> Option<ControlActivation>;

    /// Called once the controller has consumed a frame. Per-frame values
    /// (deltas) reset here.
    fn end_frame(&mut self) {}
}

/// In-memory device state keyed by control path.
///
/// Real backends translate platform events into calls on this type; tests and
/// headless hosts drive it directly.
#[derive(Debug, Default)]
pub struct DeviceState {
    pressed: HashSet<String>,
    vectors: HashMap<String, Vec2>,
    deltas: HashMap<String, Vec2>,
    activations: VecDeque<ControlActivation>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a button down. A fresh press also queues an activation.
    pub fn press(&mut self, path: &str) {
        if self.pressed.insert(path.to_string()) {
            self.queue(path, ControlKind::Button);
        }
    }

    pub fn release(&mut self, path: &str) {
        self.pressed.remove(path);
    }

    /// Sets an absolute stick value. Crossing the activation radius outward
    /// queues a stick activation.
    pub fn set_stick(&mut self, path: &str, value: Vec2) {
        let before = self.vectors.insert(path.to_string(), value).unwrap_or(Vec2::ZERO);
        let limit = STICK_ACTIVATION_THRESHOLD * STICK_ACTIVATION_THRESHOLD;
        if before.length_squared() < limit && value.length_squared() >= limit {
            self.queue(path, ControlKind::Stick);
        }
    }

    /// Accumulates relative motion for this frame.
    pub fn add_delta(&mut self, path: &str, delta: Vec2) {
        let total = self.deltas.entry(path.to_string()).or_insert(Vec2::ZERO);
        let was_idle = *total == Vec2::ZERO;
        *total += delta;
        if was_idle && delta != Vec2::ZERO {
            self.queue(path, ControlKind::Delta);
        }
    }

    pub fn push_activation(&mut self, activation: ControlActivation) {
        self.activations.push_back(activation);
    }

    pub fn pending_activations(&self) -> usize {
        self.activations.len()
    }

    /// Drops all held state, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.pressed.clear();
        self.vectors.clear();
        self.deltas.clear();
        self.activations.clear();
    }

    fn queue(&mut self, path: &str, kind: ControlKind) {
        if let Some(activation) = ControlActivation::new(path, kind) {
            self.activations.push_back(activation);
        }
    }
}

impl InputBackend for DeviceState {
    fn is_pressed(&self, path: &str) -> bool {
        self.pressed.contains(path)
    }

    fn read_vector(&self, path: &str) -> Vec2 {
        self.deltas
            .get(path)
            .or_else(|| self.vectors.get(path))
            .copied()
            .unwrap_or(Vec2::ZERO)
    }

    fn next_activation(&mut self) -> Option<ControlActivation> {
        self.activations.pop_front()
    }

    fn end_frame(&mut self) {
        self.deltas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_shared::ControlDevice;

    #[test]
    fn fresh_presses_queue_one_activation() {
        let mut devices = DeviceState::new();
        devices.press("<Keyboard>/space");
        devices.press("<Keyboard>/space");

        let activation = devices.next_activation().unwrap();
        assert_eq!(activation.path, "<Keyboard>/space");
        assert_eq!(activation.device, ControlDevice::Keyboard);
        assert_eq!(activation.kind, ControlKind::Button);
        assert!(devices.next_activation().is_none());
        assert!(devices.is_pressed("<Keyboard>/space"));
    }

    #[test]
    fn stick_activates_when_crossing_threshold() {
        let mut devices = DeviceState::new();
        devices.set_stick("<Gamepad>/leftStick", Vec2::new(0.2, 0.0));
        assert_eq!(devices.pending_activations(), 0);

        devices.set_stick("<Gamepad>/leftStick", Vec2::new(0.9, 0.0));
        assert_eq!(devices.pending_activations(), 1);

        devices.set_stick("<Gamepad>/leftStick", Vec2::new(1.0, 0.0));
        assert_eq!(devices.pending_activations(), 1);
        assert_eq!(devices.read_vector("<Gamepad>/leftStick"), Vec2::X);
    }

    #[test]
    fn deltas_reset_at_end_of_frame() {
        let mut devices = DeviceState::new();
        devices.add_delta("<Mouse>/delta", Vec2::new(2.0, 0.0));
        devices.add_delta("<Mouse>/delta", Vec2::new(1.0, 1.0));
        assert_eq!(devices.read_vector("<Mouse>/delta"), Vec2::new(3.0, 1.0));

        devices.end_frame();
        assert_eq!(devices.read_vector("<Mouse>/delta"), Vec2::ZERO);
    }
}
