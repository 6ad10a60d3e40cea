// crates/input_core/src/input/rebind.rs
//! Interactive capture of a new control for one binding slot.
//!
//! A capture is a passive listener: the controller feeds it the activations
//! its backend reports each frame and polls it for a timeout. Exactly one
//! outcome callback fires per [`RebindingCoordinator::begin`].

use std::fmt;

use tracing::{debug, info, warn};

use input_shared::{CompositePart, ControlActivation, ControlKind, InputDevice};

use crate::input::graph::{BindingGraph, SlotRef, SubActionHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebindPhase {
    #[default]
    Idle,
    Listening,
    Completed,
    Cancelled,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The targeted sub-action is not the active source for the device/mode.
    Ineligible,
    /// No slot on the target matches the requested device and part.
    NoMatchingSlot,
    UserCancelled,
    TimedOut,
    /// A newer capture replaced this one.
    Superseded,
    Shutdown,
}

/// What to do when the captured control is already bound elsewhere on the
/// same device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Accept the duplicate and log it.
    #[default]
    Allow,
    /// Ignore the activation and keep listening.
    Reject,
}

/// Receives the newly effective path.
pub type OnComplete = Box<dyn FnOnce(&str)>;
pub type OnCancel = Box<dyn FnOnce(CancelReason)>;

/// Parameters of one capture request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebindRequest {
    pub target: SubActionHandle,
    pub device: InputDevice,
    pub part: Option<CompositePart>,
    pub now: f64,
    /// Seconds without a match before the capture times out.
    pub timeout: Option<f64>,
}

struct Listen {
    slot: SlotRef,
    device: InputDevice,
    expected: ControlKind,
    deadline: Option<f64>,
    on_complete: OnComplete,
    on_cancel: OnCancel,
}

#[derive(Default)]
pub struct RebindingCoordinator {
    listen: Option<Listen>,
    phase: RebindPhase,
    last_cancel_reason: Option<CancelReason>,
    conflict_policy: ConflictPolicy,
}

impl RebindingCoordinator {
    pub fn new(conflict_policy: ConflictPolicy) -> Self {
        Self {
            conflict_policy,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> RebindPhase {
        self.phase
    }

    pub fn is_listening(&self) -> bool {
        self.listen.is_some()
    }

    pub fn last_cancel_reason(&self) -> Option<CancelReason> {
        self.last_cancel_reason
    }

    /// Slot currently being captured.
    pub fn target(&self) -> Option<SlotRef> {
        self.listen.as_ref().map(|listen| listen.slot)
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    pub fn set_conflict_policy(&mut self, policy: ConflictPolicy) {
        self.conflict_policy = policy;
    }

    /// Seconds left before the in-flight capture times out.
    pub fn remaining(&self, now: f64) -> Option<f64> {
        let deadline = self.listen.as_ref()?.deadline?;
        Some((deadline - now).max(0.0))
    }

    /// Starts listening for `request`. Any capture already in flight is
    /// cancelled first. Returns false (after firing `on_cancel`) when no slot
    /// matches.
    pub fn begin(
        &mut self,
        graph: &mut BindingGraph,
        request: RebindRequest,
        on_complete: OnComplete,
        on_cancel: OnCancel,
    ) -> bool {
        self.cancel(graph, CancelReason::Superseded);

        let Some(slot_index) = graph.find_slot_index(request.target, request.device, request.part) else {
            debug!(
                "No {} slot for part {:?} on sub-action {}",
                request.device,
                request.part,
                request.target.index()
            );
            self.refuse(CancelReason::NoMatchingSlot, on_cancel);
            return false;
        };

        let slot = SlotRef {
            handle: request.target,
            slot_index,
        };
        let expected = match graph.slot(slot) {
            Some(binding) if binding.path.contains("Stick") && !binding.is_part_of_composite => {
                ControlKind::Stick
            }
            _ => ControlKind::Button,
        };

        graph.set_suspended(request.target, true);
        self.listen = Some(Listen {
            slot,
            device: request.device,
            expected,
            deadline: request.timeout.map(|secs| request.now + secs.max(0.0)),
            on_complete,
            on_cancel,
        });
        self.phase = RebindPhase::Listening;
        self.last_cancel_reason = None;

        debug!(
            "Listening for a {} {:?} control (slot {:?})",
            request.device, expected, slot
        );
        true
    }

    /// Ends a request without ever listening, e.g. when it is ineligible.
    pub fn refuse(&mut self, reason: CancelReason, on_cancel: OnCancel) {
        self.phase = RebindPhase::Cancelled;
        self.last_cancel_reason = Some(reason);
        debug!("Rebind refused: {reason:?}");
        on_cancel(reason);
    }

    /// Offers one device activation to the capture. Returns true when it
    /// completed the capture.
    pub fn offer(&mut self, graph: &mut BindingGraph, activation: &ControlActivation) -> bool {
        let Some(listen) = &self.listen else {
            return false;
        };

        if !listen.device.accepts(activation.device) || activation.kind != listen.expected {
            return false;
        }

        let conflicts = graph.conflicts(&activation.path, listen.device, Some(listen.slot));
        if !conflicts.is_empty() {
            match self.conflict_policy {
                ConflictPolicy::Allow => {
                    warn!(
                        "'{}' is already bound to {} other slot(s)",
                        activation.path,
                        conflicts.len()
                    );
                }
                ConflictPolicy::Reject => {
                    warn!("Ignoring '{}': already bound elsewhere", activation.path);
                    return false;
                }
            }
        }

        let Some(listen) = self.listen.take() else {
            return false;
        };

        let default_path = graph
            .slot(listen.slot)
            .map(|slot| slot.path.clone())
            .unwrap_or_default();

        if default_path.eq_ignore_ascii_case(&activation.path) {
            graph.remove_override(listen.slot);
            info!("Rebound to default '{}', override cleared", activation.path);
        } else {
            graph.apply_override(listen.slot, activation.path.clone());
            info!("Rebound to '{}'", activation.path);
        }

        graph.set_suspended(listen.slot.handle, false);
        self.phase = RebindPhase::Completed;

        let effective = graph
            .slot(listen.slot)
            .map(|slot| slot.effective_path().to_string())
            .unwrap_or_else(|| activation.path.clone());
        (listen.on_complete)(&effective);
        true
    }

    /// Cancels the capture in flight, if any. Safe to call repeatedly.
    pub fn cancel(&mut self, graph: &mut BindingGraph, reason: CancelReason) -> bool {
        let Some(listen) = self.listen.take() else {
            return false;
        };

        graph.set_suspended(listen.slot.handle, false);
        self.phase = if reason == CancelReason::TimedOut {
            RebindPhase::TimedOut
        } else {
            RebindPhase::Cancelled
        };
        self.last_cancel_reason = Some(reason);

        match reason {
            CancelReason::TimedOut => info!("Rebind timed out"),
            _ => debug!("Rebind cancelled: {reason:?}"),
        }
        (listen.on_cancel)(reason);
        true
    }

    /// Times the capture out once its deadline has passed.
    pub fn check_timeout(&mut self, graph: &mut BindingGraph, now: f64) -> bool {
        let expired = self
            .listen
            .as_ref()
            .and_then(|listen| listen.deadline)
            .is_some_and(|deadline| now >= deadline);

        expired && self.cancel(graph, CancelReason::TimedOut)
    }
}

impl fmt::Debug for RebindingCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebindingCoordinator")
            .field("phase", &self.phase)
            .field("target", &self.target())
            .field("last_cancel_reason", &self.last_cancel_reason)
            .field("conflict_policy", &self.conflict_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::builder::{BindingGraphBuilder, BuiltInputs};
    use input_shared::{BindingSet, InputDefinition};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Outcome {
        Complete(String),
        Cancel(CancelReason),
    }

    fn built() -> BuiltInputs {
        let jump = InputDefinition::button(
            "Jump",
            BindingSet::button("<Keyboard>/space"),
            BindingSet::button("<Gamepad>/buttonSouth"),
        );
        let walk = InputDefinition::composite(
            "Move",
            BindingSet::four_way("<Keyboard>/w", "<Keyboard>/s", "<Keyboard>/a", "<Keyboard>/d"),
            BindingSet::four_way("<Gamepad>/dpad/up", "", "", "").with_primary("<Gamepad>/leftStick"),
        )
        .with_analog_gamepad();

        let mut built = BindingGraphBuilder::build(&[jump, walk]);
        for entry in built.registry.iter_mut() {
            entry.state.enable(&mut built.graph);
        }
        built
    }

    fn callbacks() -> (Rc<RefCell<Vec<Outcome>>>, OnComplete, OnCancel) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let done = Rc::clone(&seen);
        let cancelled = Rc::clone(&seen);
        (
            seen,
            Box::new(move |path: &str| done.borrow_mut().push(Outcome::Complete(path.to_string()))),
            Box::new(move |reason| cancelled.borrow_mut().push(Outcome::Cancel(reason))),
        )
    }

    fn request(target: SubActionHandle, device: InputDevice, part: Option<CompositePart>) -> RebindRequest {
        RebindRequest {
            target,
            device,
            part,
            now: 0.0,
            timeout: Some(5.0),
        }
    }

    fn activation(path: &str, kind: ControlKind) -> ControlActivation {
        ControlActivation::new(path, kind).unwrap()
    }

    fn jump_handle(built: &BuiltInputs) -> SubActionHandle {
        built.registry.get("Jump").unwrap().state.handles().button.unwrap()
    }

    #[test]
    fn capture_applies_override_from_the_requested_device() {
        let mut built = built();
        let target = jump_handle(&built);
        let mut rebind = RebindingCoordinator::default();
        let (seen, done, cancel) = callbacks();

        assert!(rebind.begin(&mut built.graph, request(target, InputDevice::Keyboard, None), done, cancel));
        assert!(built.graph.get(target).unwrap().is_suspended());

        assert!(!rebind.offer(&mut built.graph, &activation("<Gamepad>/buttonEast", ControlKind::Button)));
        assert!(!rebind.offer(&mut built.graph, &activation("<Mouse>/leftButton", ControlKind::Button)));
        assert!(rebind.offer(&mut built.graph, &activation("<Keyboard>/j", ControlKind::Button)));

        let slot = built.graph.get(target).unwrap();
        assert_eq!(slot.slots[0].effective_path(), "<Keyboard>/j");
        assert!(slot.is_active());
        assert_eq!(rebind.phase(), RebindPhase::Completed);
        assert_eq!(*seen.borrow(), vec![Outcome::Complete("<Keyboard>/j".into())]);
    }

    #[test]
    fn capturing_the_default_path_clears_the_override() {
        let mut built = built();
        let target = jump_handle(&built);
        built.graph.apply_override(SlotRef { handle: target, slot_index: 0 }, "<Keyboard>/j");
        let mut rebind = RebindingCoordinator::default();
        let (_, done, cancel) = callbacks();

        rebind.begin(&mut built.graph, request(target, InputDevice::Keyboard, None), done, cancel);
        rebind.offer(&mut built.graph, &activation("<Keyboard>/Space", ControlKind::Button));

        let slot = built.graph.slot(SlotRef { handle: target, slot_index: 0 }).unwrap();
        assert_eq!(slot.override_path, None);
    }

    #[test]
    fn cancel_leaves_bindings_and_enabled_state_untouched() {
        let mut built = built();
        let target = jump_handle(&built);
        let before = built.graph.export_overrides();
        let mut rebind = RebindingCoordinator::default();
        let (seen, done, cancel) = callbacks();

        rebind.begin(&mut built.graph, request(target, InputDevice::Gamepad, None), done, cancel);
        assert!(rebind.cancel(&mut built.graph, CancelReason::UserCancelled));
        assert!(!rebind.cancel(&mut built.graph, CancelReason::UserCancelled));

        assert_eq!(built.graph.export_overrides(), before);
        assert!(built.graph.get(target).unwrap().is_active());
        assert_eq!(*seen.borrow(), vec![Outcome::Cancel(CancelReason::UserCancelled)]);
    }

    #[test]
    fn a_new_begin_supersedes_the_old_one() {
        let mut built = built();
        let target = jump_handle(&built);
        let mut rebind = RebindingCoordinator::default();
        let (first, done, cancel) = callbacks();
        rebind.begin(&mut built.graph, request(target, InputDevice::Keyboard, None), done, cancel);

        let (second, done, cancel) = callbacks();
        rebind.begin(&mut built.graph, request(target, InputDevice::Gamepad, None), done, cancel);
        rebind.offer(&mut built.graph, &activation("<Gamepad>/buttonNorth", ControlKind::Button));

        assert_eq!(*first.borrow(), vec![Outcome::Cancel(CancelReason::Superseded)]);
        assert_eq!(*second.borrow(), vec![Outcome::Complete("<Gamepad>/buttonNorth".into())]);
    }

    #[test]
    fn deadline_times_the_capture_out() {
        let mut built = built();
        let target = jump_handle(&built);
        let mut rebind = RebindingCoordinator::default();
        let (seen, done, cancel) = callbacks();
        rebind.begin(&mut built.graph, request(target, InputDevice::Keyboard, None), done, cancel);

        assert_eq!(rebind.remaining(2.0), Some(3.0));
        assert!(!rebind.check_timeout(&mut built.graph, 4.9));
        assert!(rebind.check_timeout(&mut built.graph, 5.0));

        assert_eq!(rebind.phase(), RebindPhase::TimedOut);
        assert_eq!(rebind.remaining(5.0), None);
        assert_eq!(*seen.borrow(), vec![Outcome::Cancel(CancelReason::TimedOut)]);
    }

    #[test]
    fn reject_policy_keeps_listening_on_conflict() {
        let mut built = built();
        let target = jump_handle(&built);
        let mut rebind = RebindingCoordinator::new(ConflictPolicy::Reject);
        let (seen, done, cancel) = callbacks();
        rebind.begin(&mut built.graph, request(target, InputDevice::Keyboard, None), done, cancel);

        assert!(!rebind.offer(&mut built.graph, &activation("<Keyboard>/w", ControlKind::Button)));
        assert!(rebind.is_listening());
        assert!(rebind.offer(&mut built.graph, &activation("<Keyboard>/e", ControlKind::Button)));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn stick_slots_only_accept_sticks() {
        let mut built = built();
        let stick = built.registry.get("Move").unwrap().state.handles().gamepad_stick.unwrap();
        let mut rebind = RebindingCoordinator::default();
        let (_, done, cancel) = callbacks();
        rebind.begin(&mut built.graph, request(stick, InputDevice::Gamepad, None), done, cancel);

        assert!(!rebind.offer(&mut built.graph, &activation("<Gamepad>/buttonSouth", ControlKind::Button)));
        assert!(rebind.offer(&mut built.graph, &activation("<Gamepad>/rightStick", ControlKind::Stick)));
    }

    #[test]
    fn gamepad_parts_resolve_by_name_even_when_unbound() {
        let mut built = built();
        let buttons = built.registry.get("Move").unwrap().state.handles().gamepad_buttons.unwrap();
        let mut rebind = RebindingCoordinator::default();
        let (_, done, cancel) = callbacks();

        let req = request(buttons, InputDevice::Gamepad, Some(CompositePart::Left));
        assert!(rebind.begin(&mut built.graph, req, done, cancel));
        assert!(rebind.offer(&mut built.graph, &activation("<Gamepad>/dpad/left", ControlKind::Button)));

        let left = built.graph.get(buttons).unwrap().slots[3].clone();
        assert_eq!(left.part, Some(CompositePart::Left));
        assert_eq!(left.override_path.as_deref(), Some("<Gamepad>/dpad/left"));
    }

    #[test]
    fn missing_slot_cancels_immediately() {
        let mut built = built();
        let keys = built.registry.get("Move").unwrap().state.handles().keyboard_keys.unwrap();
        let mut rebind = RebindingCoordinator::default();
        let (seen, done, cancel) = callbacks();

        assert!(!rebind.begin(&mut built.graph, request(keys, InputDevice::Gamepad, None), done, cancel));
        assert_eq!(rebind.last_cancel_reason(), Some(CancelReason::NoMatchingSlot));
        assert_eq!(*seen.borrow(), vec![Outcome::Cancel(CancelReason::NoMatchingSlot)]);
    }
}
