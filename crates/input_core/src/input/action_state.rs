// crates/input_core/src/input/action_state.rs
//! Per-action runtime state: source blending, edges, repeat and mode flags.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use input_shared::{BindingKind, CompositePart, InputDevice};

use crate::input::backend::InputBackend;
use crate::input::graph::{BindingGraph, SubActionHandle};
use crate::input::signal::{ObserverToken, Signal};

/// Edge notifications, emitted in declaration order within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionEdge {
    Pressed,
    Held,
    Repeated,
    Released,
}

/// Auto-repeat timing in seconds. An interval of zero disables repeat.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepeatSettings {
    pub start_delay: f64,
    pub interval: f64,
}

impl RepeatSettings {
    pub fn new(start_delay: f64, interval: f64) -> Self {
        Self {
            start_delay: start_delay.max(0.0),
            interval: interval.max(0.0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0.0
    }
}

/// The sub-actions an action reads from. Absent entries were not synthesized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionHandles {
    pub button: Option<SubActionHandle>,
    pub keyboard_keys: Option<SubActionHandle>,
    pub keyboard_mouse: Option<SubActionHandle>,
    pub gamepad_buttons: Option<SubActionHandle>,
    pub gamepad_stick: Option<SubActionHandle>,
}

impl ActionHandles {
    pub fn iter(&self) -> impl Iterator<Item = SubActionHandle> {
        [
            self.button,
            self.keyboard_keys,
            self.keyboard_mouse,
            self.gamepad_buttons,
            self.gamepad_stick,
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug)]
pub struct ActionState {
    kind: BindingKind,
    handles: ActionHandles,

    value_1d: f32,
    value_2d: Vec2,
    is_held: bool,
    is_pressed: bool,
    is_released: bool,
    is_repeated: bool,

    invert_y: bool,
    use_analog_keyboard: bool,
    use_analog_gamepad: bool,
    enabled: bool,

    repeat: RepeatSettings,
    next_repeat_at: f64,

    edges: Signal<ActionEdge>,
}

impl ActionState {
    pub fn new(kind: BindingKind, handles: ActionHandles) -> Self {
        Self {
            kind,
            handles,
            value_1d: 0.0,
            value_2d: Vec2::ZERO,
            is_held: false,
            is_pressed: false,
            is_released: false,
            is_repeated: false,
            invert_y: false,
            use_analog_keyboard: false,
            use_analog_gamepad: false,
            enabled: false,
            repeat: RepeatSettings::default(),
            next_repeat_at: 0.0,
            edges: Signal::new(),
        }
    }

    // --- Accessors ---

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn handles(&self) -> &ActionHandles {
        &self.handles
    }

    pub fn value_1d(&self) -> f32 {
        self.value_1d
    }

    pub fn value_2d(&self) -> Vec2 {
        self.value_2d
    }

    pub fn is_held(&self) -> bool {
        self.is_held
    }

    /// True only on the tick the action went down.
    pub fn is_pressed(&self) -> bool {
        self.is_pressed
    }

    /// True only on the tick the action went up.
    pub fn is_released(&self) -> bool {
        self.is_released
    }

    pub fn is_repeated(&self) -> bool {
        self.is_repeated
    }

    pub fn invert_y(&self) -> bool {
        self.invert_y
    }

    pub fn use_analog_keyboard(&self) -> bool {
        self.use_analog_keyboard
    }

    pub fn use_analog_gamepad(&self) -> bool {
        self.use_analog_gamepad
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn repeat(&self) -> RepeatSettings {
        self.repeat
    }

    // --- Configuration ---

    pub fn set_invert_y(&mut self, invert: bool) {
        self.invert_y = invert;
    }

    pub fn set_repeat(&mut self, start_delay: f64, interval: f64) {
        self.repeat = RepeatSettings::new(start_delay, interval);
    }

    /// Selects the analog or digital source per device family and applies
    /// the enabled set right away. Modes without a matching sub-action fall
    /// back to digital.
    pub fn set_modes(&mut self, graph: &mut BindingGraph, analog_keyboard: bool, analog_gamepad: bool) {
        if self.kind != BindingKind::Composite2D {
            return;
        }
        self.use_analog_keyboard = analog_keyboard && self.handles.keyboard_mouse.is_some();
        self.use_analog_gamepad = analog_gamepad && self.handles.gamepad_stick.is_some();
        self.sync_enabled_set(graph);
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ActionEdge) + 'static) -> ObserverToken {
        self.edges.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        self.edges.unsubscribe(token)
    }

    /// Hands the observer list to a replacement state after a rebuild.
    pub fn take_observers(&mut self) -> Signal<ActionEdge> {
        std::mem::take(&mut self.edges)
    }

    pub fn set_observers(&mut self, observers: Signal<ActionEdge>) {
        self.edges = observers;
    }

    // --- Lifecycle ---

    pub fn enable(&mut self, graph: &mut BindingGraph) {
        self.enabled = true;
        self.sync_enabled_set(graph);
    }

    pub fn disable(&mut self, graph: &mut BindingGraph) {
        self.enabled = false;
        self.sync_enabled_set(graph);
        self.clear_outputs();
    }

    /// Reconciles the graph's enabled sub-actions with the current modes.
    /// Only mismatches cause an enable/disable, so this is cheap to call
    /// every tick.
    pub fn sync_enabled_set(&self, graph: &mut BindingGraph) {
        let (keyboard, gamepad) = self.wanted_sources();
        for handle in self.handles.iter() {
            let on = self.enabled && (keyboard == Some(handle) || gamepad == Some(handle));
            if graph.is_enabled(handle) != on {
                if on {
                    graph.enable(handle);
                } else {
                    graph.disable(handle);
                }
            }
        }
    }

    /// Recomputes every output from the graph for the current frame.
    pub fn tick(&mut self, graph: &mut BindingGraph, backend: &dyn InputBackend, now: f64) {
        if !self.enabled {
            return;
        }
        self.sync_enabled_set(graph);

        match self.kind {
            BindingKind::Button => {
                let down = self
                    .handles
                    .button
                    .is_some_and(|handle| graph.read_button(handle, backend));
                self.value_2d = Vec2::ZERO;
                self.value_1d = if down { 1.0 } else { 0.0 };
                self.update_edges(down, now, true);
            }
            BindingKind::Composite2D => {
                let (keyboard, gamepad) = self.wanted_sources();
                let read = |handle: Option<SubActionHandle>| {
                    handle.map_or(Vec2::ZERO, |handle| graph.read_vector(handle, backend))
                };
                let kb = read(keyboard);
                let gp = read(gamepad);

                let mut value = if kb.length_squared() >= gp.length_squared() { kb } else { gp };
                if self.invert_y {
                    value.y = -value.y;
                }

                self.value_2d = value;
                self.value_1d = value.length();
                self.update_edges(value != Vec2::ZERO, now, false);
            }
        }
    }

    /// Sub-action an interactive rebind of `(device, part)` should capture
    /// into, given the modes the caller considers active.
    pub fn rebind_target(
        &self,
        device: InputDevice,
        part: Option<CompositePart>,
        use_analog_keyboard: bool,
        use_analog_gamepad: bool,
    ) -> Option<SubActionHandle> {
        match self.kind {
            BindingKind::Button => self.handles.button,
            BindingKind::Composite2D => match device {
                // Mouse delta has no discrete parts to rebind.
                InputDevice::Keyboard if use_analog_keyboard => None,
                InputDevice::Keyboard => self.handles.keyboard_keys,
                InputDevice::Gamepad if part.is_none() && use_analog_gamepad => {
                    self.handles.gamepad_stick
                }
                InputDevice::Gamepad => self.handles.gamepad_buttons,
            },
        }
    }

    /// (keyboard source, gamepad source) for the current modes.
    fn wanted_sources(&self) -> (Option<SubActionHandle>, Option<SubActionHandle>) {
        match self.kind {
            BindingKind::Button => (self.handles.button, None),
            BindingKind::Composite2D => {
                let keyboard = if self.use_analog_keyboard {
                    self.handles.keyboard_mouse
                } else {
                    self.handles.keyboard_keys
                };
                let gamepad = if self.use_analog_gamepad {
                    self.handles.gamepad_stick
                } else {
                    self.handles.gamepad_buttons
                };
                (keyboard, gamepad)
            }
        }
    }

    fn update_edges(&mut self, down: bool, now: f64, allow_repeat: bool) {
        let was_held = self.is_held;
        self.is_pressed = down && !was_held;
        self.is_released = !down && was_held;
        self.is_held = down;
        self.is_repeated = false;

        if allow_repeat && self.repeat.is_enabled() && down {
            if self.is_pressed {
                self.next_repeat_at = now + self.repeat.start_delay;
            }
            if now >= self.next_repeat_at {
                self.is_repeated = true;
                self.next_repeat_at += self.repeat.interval;
            }
        }

        if self.is_pressed {
            self.edges.emit(&ActionEdge::Pressed);
        }
        if self.is_held {
            self.edges.emit(&ActionEdge::Held);
        }
        if self.is_repeated {
            self.edges.emit(&ActionEdge::Repeated);
        }
        if self.is_released {
            self.edges.emit(&ActionEdge::Released);
        }
    }

    fn clear_outputs(&mut self) {
        self.value_1d = 0.0;
        self.value_2d = Vec2::ZERO;
        self.is_held = false;
        self.is_pressed = false;
        self.is_released = false;
        self.is_repeated = false;
    }
}
