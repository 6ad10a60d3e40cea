// crates/input_demo/src/app.rs

use std::collections::HashSet;
use std::error::Error;
use std::path::PathBuf;

use tracing::{debug, info, warn};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use input_core::{
    ControllerConfig, DefinitionWatcher, FrameClock, InputController, InputPoller,
};
use input_shared::{InputDefinition, InputDevice};

const TITLE: &str = "Input demo";

/// Owns the controller and runs the platform (winit) event loop.
pub struct DemoApp {
    controller: InputController<InputPoller>,
    watcher: Option<DefinitionWatcher>,
    profile: String,
    logged: HashSet<String>,
    title: String,
    // Settings revision the dirty marker was computed for.
    dirty: Option<(u64, bool)>,
}

impl DemoApp {
    pub fn new(
        definitions: Vec<InputDefinition>,
        definitions_path: Option<PathBuf>,
        profile: Option<String>,
    ) -> Self {
        let config = ControllerConfig::default();
        let profile = profile.unwrap_or_else(|| config.default_profile.clone());

        let mut controller = InputController::new(config, definitions, InputPoller::new());
        controller.init();
        if controller.current_profile() != Some(profile.as_str()) {
            controller.profile_load(&profile);
        }

        let watcher = definitions_path.and_then(|path| match DefinitionWatcher::new(path) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                warn!("Definition hot reload disabled: {err}");
                None
            }
        });

        let mut app = Self {
            controller,
            watcher,
            profile,
            logged: HashSet::new(),
            title: String::new(),
            dirty: None,
        };
        app.log_new_actions();
        app
    }

    pub fn run(mut self) -> Result<(), Box<dyn Error>> {
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(960.0, 540.0))
            .build(&event_loop)?;

        let mut clock = FrameClock::new();
        info!("F1 rebind Jump (keyboard), F2 rebind Move (gamepad stick), F3 toggle mouse look,");
        info!("F4 invert look, F5 save, F6 reset, F7 list bindings, Esc cancel rebind");

        event_loop.run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event: win_event, .. } => match win_event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    // Hotkeys never reach the poller, so they cannot be captured by a rebind.
                    WindowEvent::KeyboardInput {
                        event: ref key_event,
                        ..
                    } if self.handle_hotkey(key_event) => {}
                    other => self.controller.backend_mut().handle_window_event(&other),
                },

                Event::DeviceEvent { event, .. } => {
                    self.controller.backend_mut().handle_device_event(&event);
                }

                Event::AboutToWait => {
                    self.reload_definitions();
                    self.controller.backend_mut().poll_gamepads();

                    let frame_dt = clock.tick();
                    self.controller.tick(frame_dt);

                    let title = self.status_title();
                    if title != self.title {
                        window.set_title(&title);
                        self.title = title;
                    }
                }

                Event::LoopExiting => self.controller.shutdown(),

                _ => {}
            }
        })?;
        Ok(())
    }

    /// Returns true when the key is one of the demo's hotkeys.
    fn handle_hotkey(&mut self, event: &KeyEvent) -> bool {
        let PhysicalKey::Code(code) = event.physical_key else {
            return false;
        };
        let is_hotkey = matches!(
            code,
            KeyCode::F1
                | KeyCode::F2
                | KeyCode::F3
                | KeyCode::F4
                | KeyCode::F5
                | KeyCode::F6
                | KeyCode::F7
                | KeyCode::Escape
        );
        if !is_hotkey {
            return false;
        }
        if event.state != ElementState::Pressed || event.repeat {
            return true;
        }

        match code {
            KeyCode::F1 => self.start_rebind("Jump", InputDevice::Keyboard),
            KeyCode::F2 => self.start_rebind("Move", InputDevice::Gamepad),
            KeyCode::F3 => {
                let on = self.controller.is_analog_keyboard("Look", None);
                let now = self.controller.is_analog_keyboard("Look", Some(!on));
                info!("Look uses {}", if now { "the mouse" } else { "keys" });
            }
            KeyCode::F4 => {
                let on = self.controller.is_inverted_y("Look", None);
                let now = self.controller.is_inverted_y("Look", Some(!on));
                info!("Look inverted: {now}");
            }
            KeyCode::F5 => {
                // Failures are logged by the controller.
                if self.controller.profile_save(&self.profile).is_ok() {
                    info!("Profiles on disk: {:?}", self.controller.profiles());
                }
                self.dirty = None;
            }
            KeyCode::F6 => {
                self.controller.reset_bindings_to_default(Some(&self.profile));
                info!("Bindings reset to defaults");
                self.dirty = None;
            }
            KeyCode::F7 => self.list_bindings(),
            KeyCode::Escape => self.controller.rebind_cancel(),
            _ => {}
        }
        true
    }

    fn start_rebind(&mut self, id: &str, device: InputDevice) {
        info!("Press a {device} control for '{id}'");
        let bound = id.to_string();
        let cancelled = id.to_string();
        self.controller.rebind(
            id,
            device,
            None,
            move |path| info!("'{bound}' now bound to {path}"),
            move |reason| info!("Rebind of '{cancelled}' cancelled: {reason:?}"),
        );
    }

    fn list_bindings(&self) {
        for def in self.controller.definitions() {
            let keyboard = self
                .controller
                .binding_display(&def.id, InputDevice::Keyboard, None)
                .unwrap_or_default();
            let gamepad = self
                .controller
                .binding_display(&def.id, InputDevice::Gamepad, None)
                .unwrap_or_default();
            info!("{:<12} keyboard: {:<12} gamepad: {}", def.id, keyboard, gamepad);
        }
    }

    fn reload_definitions(&mut self) {
        let Some(config) = self.watcher.as_mut().and_then(DefinitionWatcher::poll) else {
            return;
        };
        self.controller.rebuild(config.inputs);
        self.log_new_actions();
    }

    /// Logs edges of every action not already observed. Observers survive
    /// rebuilds, so only new ids are subscribed.
    fn log_new_actions(&mut self) {
        let current: HashSet<&str> = self.controller.actions().map(|(id, _)| id).collect();
        self.logged.retain(|id| current.contains(id.as_str()));

        let fresh: Vec<String> = self
            .controller
            .actions()
            .map(|(id, _)| id.to_string())
            .filter(|id| !self.logged.contains(id))
            .collect();

        for id in fresh {
            let name = id.clone();
            match self
                .controller
                .subscribe(&id, move |edge| debug!("{name}: {edge:?}"))
            {
                Ok(_) => {
                    self.logged.insert(id);
                }
                Err(err) => warn!("Could not observe '{id}': {err}"),
            }
        }
    }

    fn status_title(&mut self) -> String {
        if self.controller.is_rebinding() {
            return match self.controller.rebind_remaining() {
                Some(left) => format!("{TITLE} - press a control ({:.0}s)", left.ceil()),
                None => format!("{TITLE} - press a control"),
            };
        }

        // The dirty check reads the profile file, so only redo it when settings move.
        let revision = self.controller.settings_revision();
        let dirty = match self.dirty {
            Some((seen, dirty)) if seen == revision => dirty,
            _ => {
                let dirty = self.controller.profile_can_be_saved(&self.profile);
                self.dirty = Some((revision, dirty));
                dirty
            }
        };
        let marker = if dirty { "*" } else { "" };
        format!("{TITLE} - profile {}{marker}", self.profile)
    }
}
