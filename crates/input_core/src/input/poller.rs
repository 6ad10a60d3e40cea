// crates/input_core/src/input/poller.rs

use glam::Vec2;
use gilrs::{Axis, Button, EventType, Gilrs};
use tracing::{debug, warn};
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use input_shared::{ControlActivation, MOUSE_DELTA_PATH};

use crate::input::backend::{DeviceState, InputBackend};

/// Device backend fed by winit (keyboard, mouse) and gilrs (gamepads).
/// This keeps raw device handling out of the controller and the app.
pub struct InputPoller {
    devices: DeviceState,
    gilrs: Option<Gilrs>,
    left_stick: Vec2,
    right_stick: Vec2,
}

impl InputPoller {
    /// Opens gamepad support when the platform allows it. Keyboard and mouse
    /// keep working without it.
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(err) => {
                warn!("Gamepad support unavailable: {err}");
                None
            }
        };
        Self {
            gilrs,
            ..Self::without_gamepads()
        }
    }

    pub fn without_gamepads() -> Self {
        Self {
            devices: DeviceState::new(),
            gilrs: None,
            left_stick: Vec2::ZERO,
            right_stick: Vec2::ZERO,
        }
    }

    pub fn devices(&self) -> &DeviceState {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut DeviceState {
        &mut self.devices
    }

    /// Process a single winit WindowEvent and update device state.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                self.handle_keyboard_input(key_event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(path) = mouse_button_path(*button) {
                    match state {
                        ElementState::Pressed => self.devices.press(&path),
                        ElementState::Released => self.devices.release(&path),
                    }
                }
            }
            WindowEvent::Focused(false) => {
                debug!("Window lost focus, releasing held controls");
                self.devices.clear();
                self.left_stick = Vec2::ZERO;
                self.right_stick = Vec2::ZERO;
            }
            _ => {}
        }
    }

    /// Raw mouse motion. Screen space grows downward; control space grows up.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.devices
                .add_delta(MOUSE_DELTA_PATH, Vec2::new(*dx as f32, -*dy as f32));
        }
    }

    /// Drains pending gilrs events into device state. Call once per frame
    /// before ticking the controller.
    pub fn poll_gamepads(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return;
        };

        while let Some(event) = gilrs.next_event() {
            match event.event {
                EventType::ButtonPressed(button, _) => {
                    if let Some(path) = gamepad_button_path(button) {
                        self.devices.press(&path);
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(path) = gamepad_button_path(button) {
                        self.devices.release(&path);
                    }
                }
                EventType::AxisChanged(axis, value, _) => {
                    let (stick, path) = match axis {
                        Axis::LeftStickX | Axis::LeftStickY => (&mut self.left_stick, "<Gamepad>/leftStick"),
                        Axis::RightStickX | Axis::RightStickY => (&mut self.right_stick, "<Gamepad>/rightStick"),
                        _ => continue,
                    };
                    match axis {
                        Axis::LeftStickX | Axis::RightStickX => stick.x = value,
                        _ => stick.y = value,
                    }
                    self.devices.set_stick(path, *stick);
                }
                EventType::Connected => debug!("Gamepad {:?} connected", event.id),
                EventType::Disconnected => debug!("Gamepad {:?} disconnected", event.id),
                _ => {}
            }
        }
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        if key_event.repeat {
            return;
        }
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return;
        };
        let Some(path) = key_path(code) else {
            return;
        };
        match key_event.state {
            ElementState::Pressed => self.devices.press(&path),
            ElementState::Released => self.devices.release(&path),
        }
    }
}

impl Default for InputPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for InputPoller {
    fn is_pressed(&self, path: &str) -> bool {
        self.devices.is_pressed(path)
    }

    fn read_vector(&self, path: &str) -> Vec2 {
        self.devices.read_vector(path)
    }

    fn next_activation(&mut self) -> Option<ControlActivation> {
        self.devices.next_activation()
    }

    fn end_frame(&mut self) {
        self.devices.end_frame();
    }
}

/// Control path of a physical key, e.g. `KeyW` -> `<Keyboard>/w`.
pub fn key_path(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::KeyA => "a",
        KeyCode::KeyB => "b",
        KeyCode::KeyC => "c",
        KeyCode::KeyD => "d",
        KeyCode::KeyE => "e",
        KeyCode::KeyF => "f",
        KeyCode::KeyG => "g",
        KeyCode::KeyH => "h",
        KeyCode::KeyI => "i",
        KeyCode::KeyJ => "j",
        KeyCode::KeyK => "k",
        KeyCode::KeyL => "l",
        KeyCode::KeyM => "m",
        KeyCode::KeyN => "n",
        KeyCode::KeyO => "o",
        KeyCode::KeyP => "p",
        KeyCode::KeyQ => "q",
        KeyCode::KeyR => "r",
        KeyCode::KeyS => "s",
        KeyCode::KeyT => "t",
        KeyCode::KeyU => "u",
        KeyCode::KeyV => "v",
        KeyCode::KeyW => "w",
        KeyCode::KeyX => "x",
        KeyCode::KeyY => "y",
        KeyCode::KeyZ => "z",
        KeyCode::Digit0 => "0",
        KeyCode::Digit1 => "1",
        KeyCode::Digit2 => "2",
        KeyCode::Digit3 => "3",
        KeyCode::Digit4 => "4",
        KeyCode::Digit5 => "5",
        KeyCode::Digit6 => "6",
        KeyCode::Digit7 => "7",
        KeyCode::Digit8 => "8",
        KeyCode::Digit9 => "9",
        KeyCode::Space => "space",
        KeyCode::Enter => "enter",
        KeyCode::Escape => "escape",
        KeyCode::Tab => "tab",
        KeyCode::Backspace => "backspace",
        KeyCode::ShiftLeft => "leftShift",
        KeyCode::ShiftRight => "rightShift",
        KeyCode::ControlLeft => "leftCtrl",
        KeyCode::ControlRight => "rightCtrl",
        KeyCode::AltLeft => "leftAlt",
        KeyCode::AltRight => "rightAlt",
        KeyCode::ArrowUp => "upArrow",
        KeyCode::ArrowDown => "downArrow",
        KeyCode::ArrowLeft => "leftArrow",
        KeyCode::ArrowRight => "rightArrow",
        KeyCode::F1 => "f1",
        KeyCode::F2 => "f2",
        KeyCode::F3 => "f3",
        KeyCode::F4 => "f4",
        KeyCode::F5 => "f5",
        KeyCode::F6 => "f6",
        KeyCode::F7 => "f7",
        KeyCode::F8 => "f8",
        KeyCode::F9 => "f9",
        KeyCode::F10 => "f10",
        KeyCode::F11 => "f11",
        KeyCode::F12 => "f12",
        _ => return None,
    };
    Some(format!("<Keyboard>/{name}"))
}

pub fn mouse_button_path(button: MouseButton) -> Option<String> {
    let name = match button {
        MouseButton::Left => "leftButton",
        MouseButton::Right => "rightButton",
        MouseButton::Middle => "middleButton",
        MouseButton::Back => "backButton",
        MouseButton::Forward => "forwardButton",
        MouseButton::Other(_) => return None,
    };
    Some(format!("<Mouse>/{name}"))
}

pub fn gamepad_button_path(button: Button) -> Option<String> {
    let name = match button {
        Button::South => "buttonSouth",
        Button::East => "buttonEast",
        Button::North => "buttonNorth",
        Button::West => "buttonWest",
        Button::LeftTrigger => "leftShoulder",
        Button::RightTrigger => "rightShoulder",
        Button::LeftTrigger2 => "leftTrigger",
        Button::RightTrigger2 => "rightTrigger",
        Button::Select => "select",
        Button::Start => "start",
        Button::LeftThumb => "leftStickPress",
        Button::RightThumb => "rightStickPress",
        Button::DPadUp => "dpad/up",
        Button::DPadDown => "dpad/down",
        Button::DPadLeft => "dpad/left",
        Button::DPadRight => "dpad/right",
        _ => return None,
    };
    Some(format!("<Gamepad>/{name}"))
}
