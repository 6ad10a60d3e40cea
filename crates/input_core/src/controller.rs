// crates/input_core/src/controller.rs
//! The consumer-facing façade. Owns the graph, every action state, the flag
//! store, the rebind coordinator and the profile store, and advances them
//! once per host frame.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, error, info, warn};

use input_shared::{
    display_name, ActionId, BindingKind, CompositePart, InputConfig, InputDefinition, InputDevice,
};

use crate::error::InputError;
use crate::input::action_state::{ActionEdge, ActionState, RepeatSettings};
use crate::input::backend::InputBackend;
use crate::input::builder::BindingGraphBuilder;
use crate::input::config::{ControllerConfig, DEFAULT_PROFILE};
use crate::input::flags::{FlagChange, FlagSets, ProfileFlagStore};
use crate::input::graph::{BindingGraph, StableId, SubActionHandle};
use crate::input::rebind::{CancelReason, RebindPhase, RebindRequest, RebindingCoordinator};
use crate::input::registry::{ActionEntry, ActionRegistry};
use crate::input::signal::{ObserverToken, Signal};
use crate::profile::{ProfileRecord, ProfileStore};

/// A slot already bound to a queried path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSlot {
    pub action: String,
    pub stable_id: StableId,
    pub part: Option<CompositePart>,
}

pub struct InputController<B: InputBackend> {
    config: ControllerConfig,
    definitions: Vec<InputDefinition>,
    graph: BindingGraph,
    registry: ActionRegistry,
    flags: ProfileFlagStore,
    rebind: RebindingCoordinator,
    profiles: ProfileStore,
    backend: B,
    now: f64,
    initialized: bool,
    current_profile: Option<String>,
    // Override revisions of graphs replaced by `rebuild`.
    revision_base: u64,
    reported_missing: RefCell<HashSet<String>>,
}

impl<B: InputBackend> InputController<B> {
    pub fn new(config: ControllerConfig, definitions: Vec<InputDefinition>, backend: B) -> Self {
        let built = BindingGraphBuilder::build(&definitions);
        let mut registry = built.registry;
        for entry in registry.iter_mut() {
            let repeat = config.default_repeat;
            entry.state.set_repeat(repeat.start_delay, repeat.interval);
        }

        Self {
            rebind: RebindingCoordinator::new(config.conflict_policy),
            profiles: ProfileStore::new(config.profiles_dir.clone()),
            config,
            definitions,
            graph: built.graph,
            registry,
            flags: ProfileFlagStore::new(),
            backend,
            now: 0.0,
            initialized: false,
            current_profile: None,
            revision_base: 0,
            reported_missing: RefCell::new(HashSet::new()),
        }
    }

    // --- Lifecycle ---

    /// Loads the default profile (or seeds defaults) and enables every action.
    pub fn init(&mut self) {
        let profile = self.config.default_profile.clone();
        self.profile_load(&profile);

        for entry in self.registry.iter_mut() {
            entry.state.enable(&mut self.graph);
        }
        self.initialized = true;
        info!(
            "Input controller ready: {} actions, profile '{}'",
            self.registry.len(),
            profile
        );
    }

    /// Advances one frame: feeds device activations to an in-flight rebind,
    /// enforces its timeout, then recomputes every action.
    pub fn tick(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.now += f64::from(dt);
        }

        while let Some(activation) = self.backend.next_activation() {
            if self.rebind.is_listening() {
                self.rebind.offer(&mut self.graph, &activation);
            }
        }
        self.rebind.check_timeout(&mut self.graph, self.now);

        if self.initialized {
            for entry in self.registry.iter_mut() {
                entry.state.tick(&mut self.graph, &self.backend, self.now);
            }
        }

        self.backend.end_frame();
    }

    pub fn shutdown(&mut self) {
        self.rebind.cancel(&mut self.graph, CancelReason::Shutdown);
        for entry in self.registry.iter_mut() {
            entry.state.disable(&mut self.graph);
        }
        self.initialized = false;
        debug!("Input controller shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Seconds of input time accumulated through `tick`.
    pub fn now(&self) -> f64 {
        self.now
    }

    // --- Queries ---

    /// State of an action. An unknown id is reported once, then `None`
    /// quietly.
    pub fn get(&self, id: &str) -> Option<&ActionState> {
        match self.registry.get(id) {
            Some(entry) => Some(&entry.state),
            None => {
                self.report_missing(id);
                None
            }
        }
    }

    /// Numeric index of an action, stable until the next rebuild.
    pub fn action_id(&self, id: &str) -> Option<ActionId> {
        let found = self.registry.get_id(id);
        if found.is_none() {
            self.report_missing(id);
        }
        found
    }

    pub fn get_by_id(&self, id: ActionId) -> Option<&ActionState> {
        self.registry.by_id(id).map(|entry| &entry.state)
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, &ActionState)> {
        self.registry
            .iter()
            .map(|entry| (entry.definition.id.as_str(), &entry.state))
    }

    pub fn definitions(&self) -> &[InputDefinition] {
        &self.definitions
    }

    pub fn graph(&self) -> &BindingGraph {
        &self.graph
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn subscribe(
        &mut self,
        id: &str,
        observer: impl FnMut(&ActionEdge) + 'static,
    ) -> Result<ObserverToken, InputError> {
        let entry = self.entry_mut(id)?;
        Ok(entry.state.subscribe(observer))
    }

    pub fn unsubscribe(&mut self, id: &str, token: ObserverToken) -> bool {
        self.registry
            .get_mut(id)
            .is_some_and(|entry| entry.state.unsubscribe(token))
    }

    pub fn subscribe_flags(&mut self, observer: impl FnMut(&FlagChange) + 'static) -> ObserverToken {
        self.flags.subscribe(observer)
    }

    pub fn unsubscribe_flags(&mut self, token: ObserverToken) -> bool {
        self.flags.unsubscribe(token)
    }

    /// Grows whenever an override or a flag changes, and on every rebuild.
    pub fn settings_revision(&self) -> u64 {
        self.revision_base + self.graph.override_revision() + self.flags.revision()
    }

    /// Human text for the binding shown for `(device, part)` in the current
    /// mode. Keyboard in mouse mode reads "Mouse".
    pub fn binding_display(&self, id: &str, device: InputDevice, part: Option<CompositePart>) -> Option<String> {
        let Some(entry) = self.registry.get(id) else {
            self.report_missing(id);
            return None;
        };
        let def = &entry.definition;
        let handles = entry.state.handles();

        let source = match (def.kind, device) {
            (BindingKind::Button, _) => handles.button,
            (BindingKind::Composite2D, InputDevice::Keyboard) => {
                if def.allow_analog_keyboard && self.flags.is_analog_keyboard(id) {
                    return Some("Mouse".to_string());
                }
                handles.keyboard_keys
            }
            (BindingKind::Composite2D, InputDevice::Gamepad) => {
                if def.allow_analog_gamepad && self.flags.is_analog_gamepad(id) {
                    handles.gamepad_stick
                } else {
                    handles.gamepad_buttons
                }
            }
        };

        self.first_matching_display(source?, device, part)
    }

    fn first_matching_display(
        &self,
        handle: SubActionHandle,
        device: InputDevice,
        part: Option<CompositePart>,
    ) -> Option<String> {
        let sub = self.graph.get(handle)?;
        sub.slots
            .iter()
            .filter(|slot| !slot.is_composite)
            .filter(|slot| part.is_none() || slot.part == part)
            .find(|slot| {
                let path = slot.effective_path();
                path.is_empty() || path.starts_with(device.path_prefix())
            })
            .map(|slot| display_name(slot.effective_path()))
    }

    /// Slots on `device` currently bound to `path`.
    pub fn binding_conflicts(&self, path: &str, device: InputDevice) -> Vec<BoundSlot> {
        self.graph
            .conflicts(path, device, None)
            .into_iter()
            .filter_map(|slot_ref| {
                let sub = self.graph.get(slot_ref.handle)?;
                let slot = self.graph.slot(slot_ref)?;
                Some(BoundSlot {
                    action: sub.action_id.clone(),
                    stable_id: slot.stable_id,
                    part: slot.part,
                })
            })
            .collect()
    }

    // --- Flags ---

    /// Reads the flag, first setting it when `set` is given.
    pub fn is_analog_keyboard(&mut self, id: &str, set: Option<bool>) -> bool {
        if !self.has_action(id) {
            return false;
        }
        if let Some(value) = set {
            self.flags
                .set_analog_keyboard(id, value, &mut self.registry, &mut self.graph);
        }
        self.flags.is_analog_keyboard(id)
    }

    pub fn is_analog_gamepad(&mut self, id: &str, set: Option<bool>) -> bool {
        if !self.has_action(id) {
            return false;
        }
        if let Some(value) = set {
            self.flags
                .set_analog_gamepad(id, value, &mut self.registry, &mut self.graph);
        }
        self.flags.is_analog_gamepad(id)
    }

    pub fn is_inverted_y(&mut self, id: &str, set: Option<bool>) -> bool {
        if !self.has_action(id) {
            return false;
        }
        if let Some(value) = set {
            self.flags
                .set_inverted_y(id, value, &mut self.registry, &mut self.graph);
        }
        self.flags.is_inverted_y(id)
    }

    pub fn flag_sets(&self) -> &FlagSets {
        self.flags.sets()
    }

    pub fn set_repeat(&mut self, id: &str, start_delay: f64, interval: f64) -> Result<(), InputError> {
        let entry = self.entry_mut(id)?;
        entry.state.set_repeat(start_delay, interval);
        Ok(())
    }

    // --- Rebinding ---

    /// False when the requested slot is not the active source for the
    /// action's current mode on that device.
    pub fn can_rebind(&self, id: &str, device: InputDevice, part: Option<CompositePart>) -> bool {
        let Some(entry) = self.registry.get(id) else {
            return false;
        };
        let def = &entry.definition;
        if def.kind != BindingKind::Composite2D {
            return true;
        }

        match device {
            InputDevice::Keyboard => !(def.allow_analog_keyboard && self.flags.is_analog_keyboard(id)),
            InputDevice::Gamepad => {
                !(def.allow_analog_gamepad && self.flags.is_analog_gamepad(id) && part.is_some())
            }
        }
    }

    /// Starts an interactive capture. Exactly one of the callbacks fires,
    /// possibly before this returns.
    pub fn rebind(
        &mut self,
        id: &str,
        device: InputDevice,
        part: Option<CompositePart>,
        on_complete: impl FnOnce(&str) + 'static,
        on_cancel: impl FnOnce(CancelReason) + 'static,
    ) {
        let on_cancel = Box::new(on_cancel);

        let Some(entry) = self.registry.get(id) else {
            self.report_missing(id);
            self.rebind.cancel(&mut self.graph, CancelReason::Superseded);
            self.rebind.refuse(CancelReason::NoMatchingSlot, on_cancel);
            return;
        };

        if !self.can_rebind(id, device, part) {
            self.rebind.cancel(&mut self.graph, CancelReason::Superseded);
            self.rebind.refuse(CancelReason::Ineligible, on_cancel);
            return;
        }

        let def = &entry.definition;
        let use_analog_keyboard = def.allow_analog_keyboard && self.flags.is_analog_keyboard(id);
        let use_analog_gamepad = def.allow_analog_gamepad && self.flags.is_analog_gamepad(id);
        let Some(target) = entry
            .state
            .rebind_target(device, part, use_analog_keyboard, use_analog_gamepad)
        else {
            self.rebind.cancel(&mut self.graph, CancelReason::Superseded);
            self.rebind.refuse(CancelReason::Ineligible, on_cancel);
            return;
        };

        debug!("Rebinding '{id}' on {device} (part {part:?})");
        let request = RebindRequest {
            target,
            device,
            part,
            now: self.now,
            timeout: self.config.rebind_timeout,
        };
        self.rebind
            .begin(&mut self.graph, request, Box::new(on_complete), on_cancel);
    }

    pub fn rebind_cancel(&mut self) {
        self.rebind.cancel(&mut self.graph, CancelReason::UserCancelled);
    }

    pub fn is_rebinding(&self) -> bool {
        self.rebind.is_listening()
    }

    pub fn rebind_phase(&self) -> RebindPhase {
        self.rebind.phase()
    }

    pub fn rebind_remaining(&self) -> Option<f64> {
        self.rebind.remaining(self.now)
    }

    pub fn last_cancel_reason(&self) -> Option<CancelReason> {
        self.rebind.last_cancel_reason()
    }

    // --- Profiles ---

    /// Replaces overrides and flags with the named profile. Returns false
    /// when the profile is absent or unreadable; defaults are seeded then.
    pub fn profile_load(&mut self, name: &str) -> bool {
        let name = profile_name(name);
        self.rebind.cancel(&mut self.graph, CancelReason::Superseded);
        self.graph.remove_all_overrides();

        let loaded = self.profiles.load(name).and_then(|record| {
            match self.graph.import_overrides(&record.binding_overrides) {
                Ok(applied) => {
                    debug!("Profile '{name}': {applied} binding override(s)");
                    Some(record.flag_sets())
                }
                Err(err) => {
                    warn!("Profile '{name}' has unreadable binding overrides: {err}");
                    self.graph.remove_all_overrides();
                    None
                }
            }
        });

        let found = loaded.is_some();
        let sets = loaded.unwrap_or_else(|| ProfileFlagStore::seed_defaults(&self.registry));
        self.flags.replace(sets, &mut self.registry, &mut self.graph);
        self.current_profile = Some(name.to_string());

        if found {
            info!("Loaded input profile '{name}'");
        } else {
            debug!("No input profile '{name}', using defaults");
        }
        found
    }

    /// Writes current overrides and flags. On failure the in-memory state
    /// is untouched.
    pub fn profile_save(&mut self, name: &str) -> Result<(), InputError> {
        let name = profile_name(name);
        let record = ProfileRecord::new(self.graph.export_overrides(), self.flags.sets());
        match self.profiles.save(name, &record) {
            Ok(()) => {
                self.current_profile = Some(name.to_string());
                info!("Saved input profile '{name}'");
                Ok(())
            }
            Err(err) => {
                error!("Failed to save input profile '{name}': {err}");
                Err(err.into())
            }
        }
    }

    /// Drops every override and returns flags to their seeded state. When
    /// `name` names an existing profile, the reset state is saved to it.
    pub fn reset_bindings_to_default(&mut self, name: Option<&str>) {
        self.rebind.cancel(&mut self.graph, CancelReason::Superseded);
        self.graph.remove_all_overrides();
        self.flags.reset(&mut self.registry, &mut self.graph);

        if let Some(name) = name.map(profile_name).filter(|name| self.profiles.exists(name)) {
            // Already logged inside profile_save.
            self.profile_save(name).ok();
        }
    }

    /// Whether saving now would change what `name` holds on disk.
    pub fn profile_can_be_saved(&self, name: &str) -> bool {
        let name = profile_name(name);
        self.profiles
            .would_change(name, &self.graph.export_overrides(), self.flags.sets())
    }

    pub fn profile_exists(&self, name: &str) -> bool {
        let name = profile_name(name);
        self.profiles.exists(name)
    }

    pub fn profiles(&self) -> Vec<String> {
        self.profiles.list()
    }

    pub fn profile_delete(&mut self, name: &str) -> Result<bool, InputError> {
        let name = profile_name(name);
        let removed = self.profiles.delete(name)?;
        if removed {
            info!("Deleted input profile '{name}'");
            if self.current_profile.as_deref() == Some(name) {
                self.current_profile = None;
            }
        }
        Ok(removed)
    }

    pub fn current_profile(&self) -> Option<&str> {
        self.current_profile.as_deref()
    }

    // --- Overrides ---

    /// Current binding overrides as a JSON blob.
    pub fn export_overrides(&self) -> String {
        self.graph.export_overrides()
    }

    /// Replaces every override with those of `blob`. A malformed blob leaves
    /// the current overrides in place.
    pub fn import_overrides(&mut self, blob: &str) -> Result<usize, InputError> {
        self.rebind.cancel(&mut self.graph, CancelReason::Superseded);
        let previous = self.graph.export_overrides();
        self.graph.remove_all_overrides();

        match self.graph.import_overrides(blob) {
            Ok(applied) => Ok(applied),
            Err(err) => {
                if let Err(restore) = self.graph.import_overrides(&previous) {
                    warn!("Could not restore binding overrides: {restore}");
                }
                Err(InputError::OverrideBlob(err))
            }
        }
    }

    // --- Rebuild ---

    /// Regenerates graph and states from new definitions. Overrides follow
    /// their slots by stable id; observers and repeat settings follow their
    /// action id.
    pub fn rebuild(&mut self, definitions: Vec<InputDefinition>) {
        self.rebind.cancel(&mut self.graph, CancelReason::Superseded);
        let blob = self.graph.export_overrides();

        let mut carried: HashMap<String, (Signal<ActionEdge>, RepeatSettings)> = HashMap::new();
        for entry in self.registry.iter_mut() {
            entry.state.disable(&mut self.graph);
            carried.insert(
                entry.definition.id.clone(),
                (entry.state.take_observers(), entry.state.repeat()),
            );
        }

        let built = BindingGraphBuilder::build(&definitions);
        let mut graph = built.graph;
        let mut registry: ActionRegistry = built.registry;

        if let Err(err) = graph.import_overrides(&blob) {
            warn!("Dropping binding overrides during rebuild: {err}");
        }

        for entry in registry.iter_mut() {
            let (observers, repeat) = carried
                .remove(&entry.definition.id)
                .unwrap_or_else(|| (Signal::new(), self.config.default_repeat));
            entry.state.set_observers(observers);
            entry.state.set_repeat(repeat.start_delay, repeat.interval);
        }

        self.revision_base += self.graph.override_revision() + 1;
        self.graph = graph;
        self.registry = registry;
        self.definitions = definitions;
        self.flags.apply_all(&mut self.registry, &mut self.graph);

        if self.initialized {
            for entry in self.registry.iter_mut() {
                entry.state.enable(&mut self.graph);
            }
        }
        info!("Rebuilt input graph: {} actions", self.registry.len());
    }

    /// Reads a definitions file and rebuilds from it. On error nothing changes.
    pub fn rebuild_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), InputError> {
        let config = InputConfig::load_from(path)?;
        self.rebuild(config.inputs);
        Ok(())
    }

    // --- Internals ---

    fn has_action(&self, id: &str) -> bool {
        let found = self.registry.get_id(id).is_some();
        if !found {
            self.report_missing(id);
        }
        found
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut ActionEntry, InputError> {
        if !self.has_action(id) {
            return Err(InputError::NotFound(id.to_string()));
        }
        self.registry
            .get_mut(id)
            .ok_or_else(|| InputError::NotFound(id.to_string()))
    }

    fn report_missing(&self, id: &str) {
        if self.reported_missing.borrow_mut().insert(id.to_string()) {
            let available: Vec<&str> = self.registry.names().collect();
            warn!(
                "Input '{id}' not found. Available ids: {}",
                available.join(", ")
            );
        }
    }
}

/// Blank names address the default profile.
fn profile_name(name: &str) -> &str {
    if name.trim().is_empty() {
        DEFAULT_PROFILE
    } else {
        name
    }
}
