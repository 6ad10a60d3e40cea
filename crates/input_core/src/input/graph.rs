// crates/input_core/src/input/graph.rs
//! The low-level binding graph: sub-actions made of concrete binding slots.
//!
//! Every slot carries a [`StableId`] derived from `(action id, role token)`, so
//! a regenerated graph hands out the same identities and persisted overrides
//! keep pointing at the right slot.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use input_shared::{CompositePart, ControlDevice, InputDevice};

use crate::input::backend::InputBackend;

/// Deterministic identity of one binding slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableId(Uuid);

impl StableId {
    /// MD5 of the key, reinterpreted as a UUID.
    pub fn derive(key: &str) -> Self {
        let digest = Md5::digest(key.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest);
        Self(Uuid::from_bytes(bytes))
    }

    /// Identity of the slot `role_token` of action `action_id`.
    pub fn for_slot(action_id: &str, role_token: &str) -> Self {
        Self::derive(&format!("{action_id}__{role_token}"))
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl fmt::Debug for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StableId({})", self.0.hyphenated())
    }
}

impl FromStr for StableId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Which of the (up to five) sub-actions of a logical action this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubActionRole {
    Button,
    KeyboardKeys,
    KeyboardMouse,
    GamepadButtons,
    GamepadStick,
}

impl SubActionRole {
    pub fn token(self) -> &'static str {
        match self {
            SubActionRole::Button => "button",
            SubActionRole::KeyboardKeys => "kb_keys",
            SubActionRole::KeyboardMouse => "kb_mouse",
            SubActionRole::GamepadButtons => "gp_buttons",
            SubActionRole::GamepadStick => "gp_stick",
        }
    }

    pub fn is_analog(self) -> bool {
        matches!(self, SubActionRole::KeyboardMouse | SubActionRole::GamepadStick)
    }
}

/// Index of a sub-action inside its [`BindingGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubActionHandle(usize);

impl SubActionHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Address of one slot: sub-action plus slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub handle: SubActionHandle,
    pub slot_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingSlot {
    pub stable_id: StableId,
    /// Role token the stable id was derived from, e.g. `gp_buttons__up`.
    pub role_token: String,
    /// Compiled-in default path.
    pub path: String,
    pub override_path: Option<String>,
    pub part: Option<CompositePart>,
    pub is_composite: bool,
    pub is_part_of_composite: bool,
}

impl BindingSlot {
    pub fn new(action_id: &str, role_token: String, path: impl Into<String>) -> Self {
        Self {
            stable_id: StableId::for_slot(action_id, &role_token),
            role_token,
            path: path.into(),
            override_path: None,
            part: None,
            is_composite: false,
            is_part_of_composite: false,
        }
    }

    /// The path in effect: the override when present, else the default.
    pub fn effective_path(&self) -> &str {
        self.override_path.as_deref().unwrap_or(&self.path)
    }

    pub fn device(&self) -> Option<ControlDevice> {
        ControlDevice::from_path(self.effective_path())
    }
}

#[derive(Debug, Clone)]
pub struct SubAction {
    /// `Jump`, `Move__kb_keys`, ...
    pub name: String,
    pub action_id: String,
    pub role: SubActionRole,
    pub slots: Vec<BindingSlot>,
    enabled: bool,
    suspended: bool,
}

impl SubAction {
    pub fn new(name: impl Into<String>, action_id: impl Into<String>, role: SubActionRole) -> Self {
        Self {
            name: name.into(),
            action_id: action_id.into(),
            role,
            slots: Vec::new(),
            enabled: false,
            suspended: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True while an interactive capture holds this sub-action.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Enabled and not suspended: only then does it produce values.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.suspended
    }
}

#[derive(Serialize, Deserialize)]
struct OverrideBlob {
    bindings: Vec<OverrideEntry>,
}

#[derive(Serialize, Deserialize)]
struct OverrideEntry {
    action: String,
    id: String,
    path: String,
}

#[derive(Debug, Default)]
pub struct BindingGraph {
    sub_actions: Vec<SubAction>,
    toggles: u64,
    override_revision: u64,
}

impl BindingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sub_action: SubAction) -> SubActionHandle {
        self.sub_actions.push(sub_action);
        SubActionHandle(self.sub_actions.len() - 1)
    }

    pub fn get(&self, handle: SubActionHandle) -> Option<&SubAction> {
        self.sub_actions.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.sub_actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubActionHandle, &SubAction)> {
        self.sub_actions
            .iter()
            .enumerate()
            .map(|(idx, sub)| (SubActionHandle(idx), sub))
    }

    pub fn slot(&self, slot: SlotRef) -> Option<&BindingSlot> {
        self.get(slot.handle)?.slots.get(slot.slot_index)
    }

    // --- Enable / disable ---

    pub fn is_enabled(&self, handle: SubActionHandle) -> bool {
        self.get(handle).is_some_and(SubAction::is_enabled)
    }

    pub fn enable(&mut self, handle: SubActionHandle) {
        self.set_enabled(handle, true);
    }

    pub fn disable(&mut self, handle: SubActionHandle) {
        self.set_enabled(handle, false);
    }

    fn set_enabled(&mut self, handle: SubActionHandle, enabled: bool) {
        if let Some(sub) = self.sub_actions.get_mut(handle.0) {
            if sub.enabled != enabled {
                sub.enabled = enabled;
                self.toggles += 1;
            }
        }
    }

    /// Number of real enable/disable transitions so far.
    pub fn toggles(&self) -> u64 {
        self.toggles
    }

    pub fn set_suspended(&mut self, handle: SubActionHandle, suspended: bool) {
        if let Some(sub) = self.sub_actions.get_mut(handle.0) {
            sub.suspended = suspended;
        }
    }

    // --- Reading values ---

    /// True when any non-composite slot of an active sub-action is pressed.
    pub fn read_button(&self, handle: SubActionHandle, backend: &dyn InputBackend) -> bool {
        let Some(sub) = self.get(handle).filter(|sub| sub.is_active()) else {
            return false;
        };

        sub.slots
            .iter()
            .filter(|slot| !slot.is_composite && !slot.effective_path().is_empty())
            .any(|slot| backend.is_pressed(slot.effective_path()))
    }

    /// Vector value of an active sub-action: digital composites sum their
    /// parts (clamped to unit length), analog sub-actions read their control.
    pub fn read_vector(&self, handle: SubActionHandle, backend: &dyn InputBackend) -> Vec2 {
        let Some(sub) = self.get(handle).filter(|sub| sub.is_active()) else {
            return Vec2::ZERO;
        };

        if sub.role.is_analog() {
            return sub
                .slots
                .iter()
                .find(|slot| !slot.is_composite && !slot.effective_path().is_empty())
                .map(|slot| backend.read_vector(slot.effective_path()))
                .unwrap_or(Vec2::ZERO);
        }

        let mut value = Vec2::ZERO;
        for slot in sub.slots.iter().filter(|slot| slot.is_part_of_composite) {
            let path = slot.effective_path();
            if path.is_empty() || !backend.is_pressed(path) {
                continue;
            }
            match slot.part {
                Some(CompositePart::Up) => value.y += 1.0,
                Some(CompositePart::Down) => value.y -= 1.0,
                Some(CompositePart::Left) => value.x -= 1.0,
                Some(CompositePart::Right) => value.x += 1.0,
                None => {}
            }
        }

        if value.length_squared() > 1.0 {
            value = value.normalize();
        }
        value
    }

    // --- Slot lookup ---

    /// Concrete slot a rebind of `(device, part)` on this sub-action targets.
    ///
    /// Composite heads are skipped. Gamepad composite parts match by name even
    /// when their path is empty; everything else must carry the device prefix.
    pub fn find_slot_index(
        &self,
        handle: SubActionHandle,
        device: InputDevice,
        part: Option<CompositePart>,
    ) -> Option<usize> {
        let sub = self.get(handle)?;
        let prefix = device.path_prefix();

        for (idx, slot) in sub.slots.iter().enumerate() {
            if slot.is_composite {
                continue;
            }

            if device == InputDevice::Gamepad && slot.is_part_of_composite && part.is_some() {
                if slot.part == part {
                    return Some(idx);
                }
                continue;
            }

            if !slot.path.starts_with(prefix) {
                continue;
            }

            if part.is_none() || slot.part == part {
                return Some(idx);
            }
        }

        None
    }

    pub fn find_by_stable_id(&self, id: StableId) -> Option<SlotRef> {
        self.iter().find_map(|(handle, sub)| {
            sub.slots
                .iter()
                .position(|slot| slot.stable_id == id)
                .map(|slot_index| SlotRef { handle, slot_index })
        })
    }

    /// Slots on `device` whose effective path equals `path` (case-insensitive),
    /// optionally leaving one slot out.
    pub fn conflicts(&self, path: &str, device: InputDevice, exclude: Option<SlotRef>) -> Vec<SlotRef> {
        let mut found = Vec::new();
        for (handle, sub) in self.iter() {
            for (slot_index, slot) in sub.slots.iter().enumerate() {
                let slot_ref = SlotRef { handle, slot_index };
                if Some(slot_ref) == exclude || slot.is_composite {
                    continue;
                }
                let effective = slot.effective_path();
                if effective.starts_with(device.path_prefix()) && effective.eq_ignore_ascii_case(path) {
                    found.push(slot_ref);
                }
            }
        }
        found
    }

    // --- Overrides ---

    pub fn apply_override(&mut self, slot: SlotRef, path: impl Into<String>) -> bool {
        let Some(target) = self.slot_mut(slot) else {
            return false;
        };
        target.override_path = Some(path.into());
        self.override_revision += 1;
        true
    }

    pub fn remove_override(&mut self, slot: SlotRef) -> bool {
        let removed = self
            .slot_mut(slot)
            .and_then(|target| target.override_path.take())
            .is_some();
        if removed {
            self.override_revision += 1;
        }
        removed
    }

    pub fn remove_all_overrides(&mut self) {
        let mut removed = false;
        for sub in &mut self.sub_actions {
            for slot in &mut sub.slots {
                removed |= slot.override_path.take().is_some();
            }
        }
        if removed {
            self.override_revision += 1;
        }
    }

    /// Bumped on every override change.
    pub fn override_revision(&self) -> u64 {
        self.override_revision
    }

    /// Serializes every override, in graph order, as a JSON blob.
    pub fn export_overrides(&self) -> String {
        let bindings = self
            .sub_actions
            .iter()
            .flat_map(|sub| {
                sub.slots.iter().filter_map(move |slot| {
                    slot.override_path.as_ref().map(|path| OverrideEntry {
                        action: sub.name.clone(),
                        id: slot.stable_id.to_string(),
                        path: path.clone(),
                    })
                })
            })
            .collect();

        serde_json::to_string(&OverrideBlob { bindings }).unwrap_or_else(|err| {
            warn!("Failed to serialize binding overrides: {err}");
            String::new()
        })
    }

    /// Applies the overrides of a blob by stable id. Entries whose slot no
    /// longer exists are skipped. Returns how many were applied.
    pub fn import_overrides(&mut self, blob: &str) -> Result<usize, serde_json::Error> {
        if blob.trim().is_empty() {
            return Ok(0);
        }

        let parsed: OverrideBlob = serde_json::from_str(blob)?;
        let mut applied = 0;

        for entry in parsed.bindings {
            let slot = entry
                .id
                .parse::<StableId>()
                .ok()
                .and_then(|id| self.find_by_stable_id(id));

            match slot {
                Some(slot) => {
                    self.apply_override(slot, entry.path);
                    applied += 1;
                }
                None => debug!(
                    "Skipping override for '{}' ({}): slot no longer exists",
                    entry.action, entry.id
                ),
            }
        }

        Ok(applied)
    }

    fn slot_mut(&mut self, slot: SlotRef) -> Option<&mut BindingSlot> {
        self.sub_actions
            .get_mut(slot.handle.0)?
            .slots
            .get_mut(slot.slot_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::backend::DeviceState;

    fn keys_sub_action() -> SubAction {
        let mut sub = SubAction::new("Move__kb_keys", "Move", SubActionRole::KeyboardKeys);
        let mut head = BindingSlot::new("Move", "kb_keys__composite".into(), "2DVector");
        head.is_composite = true;
        sub.slots.push(head);
        for (part, key) in CompositePart::ALL.into_iter().zip(["w", "s", "a", "d"]) {
            let mut slot = BindingSlot::new(
                "Move",
                format!("kb_keys__{}", part.name()),
                format!("<Keyboard>/{key}"),
            );
            slot.part = Some(part);
            slot.is_part_of_composite = true;
            sub.slots.push(slot);
        }
        sub
    }

    #[test]
    fn stable_id_is_md5_of_the_key() {
        let id = StableId::derive("Jump__button__keyboard");
        assert_eq!(id, StableId::for_slot("Jump", "button__keyboard"));
        assert_ne!(id, StableId::for_slot("Jump", "button__gamepad"));
        assert_eq!(id.to_string().parse::<StableId>().unwrap(), id);
    }

    #[test]
    fn disabled_sub_actions_read_zero() {
        let mut graph = BindingGraph::new();
        let handle = graph.push(keys_sub_action());
        let mut devices = DeviceState::new();
        devices.press("<Keyboard>/w");

        assert_eq!(graph.read_vector(handle, &devices), Vec2::ZERO);

        graph.enable(handle);
        assert_eq!(graph.read_vector(handle, &devices), Vec2::Y);

        graph.set_suspended(handle, true);
        assert_eq!(graph.read_vector(handle, &devices), Vec2::ZERO);
    }

    #[test]
    fn diagonal_composite_is_unit_length() {
        let mut graph = BindingGraph::new();
        let handle = graph.push(keys_sub_action());
        graph.enable(handle);

        let mut devices = DeviceState::new();
        devices.press("<Keyboard>/w");
        devices.press("<Keyboard>/d");

        let value = graph.read_vector(handle, &devices);
        assert!((value.length() - 1.0).abs() < 1e-5);
        assert!(value.x > 0.0 && value.y > 0.0);
    }

    #[test]
    fn enable_counts_only_real_transitions() {
        let mut graph = BindingGraph::new();
        let handle = graph.push(keys_sub_action());

        graph.enable(handle);
        graph.enable(handle);
        graph.disable(handle);
        graph.disable(handle);

        assert_eq!(graph.toggles(), 2);
    }

    #[test]
    fn overrides_export_and_import_by_stable_id() {
        let mut graph = BindingGraph::new();
        let handle = graph.push(keys_sub_action());
        graph.apply_override(SlotRef { handle, slot_index: 1 }, "<Keyboard>/i");
        let blob = graph.export_overrides();

        let mut rebuilt = BindingGraph::new();
        let rebuilt_handle = rebuilt.push(keys_sub_action());
        assert_eq!(rebuilt.import_overrides(&blob).unwrap(), 1);

        let slot = rebuilt.slot(SlotRef { handle: rebuilt_handle, slot_index: 1 }).unwrap();
        assert_eq!(slot.effective_path(), "<Keyboard>/i");
        assert_eq!(rebuilt.export_overrides(), blob);
    }

    #[test]
    fn empty_graph_exports_an_empty_binding_list() {
        let graph = BindingGraph::new();
        assert_eq!(graph.export_overrides(), r#"{"bindings":[]}"#);
    }

    #[test]
    fn malformed_blob_is_rejected() {
        let mut graph = BindingGraph::new();
        assert!(graph.import_overrides("{not json").is_err());
        assert_eq!(graph.import_overrides("   ").unwrap(), 0);
    }

    #[test]
    fn slot_lookup_skips_composite_head() {
        let mut graph = BindingGraph::new();
        let handle = graph.push(keys_sub_action());

        assert_eq!(graph.find_slot_index(handle, InputDevice::Keyboard, Some(CompositePart::Left)), Some(3));
        assert_eq!(graph.find_slot_index(handle, InputDevice::Keyboard, None), Some(1));
        assert_eq!(graph.find_slot_index(handle, InputDevice::Gamepad, None), None);
    }

    #[test]
    fn conflicts_report_other_slots_on_the_same_path() {
        let mut graph = BindingGraph::new();
        let handle = graph.push(keys_sub_action());
        let own = SlotRef { handle, slot_index: 1 };

        let hits = graph.conflicts("<Keyboard>/S", InputDevice::Keyboard, Some(own));
        assert_eq!(hits, vec![SlotRef { handle, slot_index: 2 }]);
        assert!(graph.conflicts("<Keyboard>/w", InputDevice::Keyboard, Some(own)).is_empty());
    }
}
