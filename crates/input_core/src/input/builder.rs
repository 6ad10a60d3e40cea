// crates/input_core/src/input/builder.rs
//! Synthesizes the binding graph and one [`ActionState`] per logical input.

use tracing::{debug, warn};

use input_shared::{
    BindingKind, BindingSet, CompositePart, InputDefinition, COMPOSITE_2D_PATH, MOUSE_DELTA_PATH,
};

use crate::input::action_state::{ActionHandles, ActionState};
use crate::input::graph::{BindingGraph, BindingSlot, SubAction, SubActionHandle, SubActionRole};
use crate::input::registry::ActionRegistry;

/// Result of a build: the graph plus the per-action states that read it.
#[derive(Debug, Default)]
pub struct BuiltInputs {
    pub graph: BindingGraph,
    pub registry: ActionRegistry,
}

pub struct BindingGraphBuilder;

impl BindingGraphBuilder {
    /// Builds in definition order. Empty and duplicate ids are skipped.
    pub fn build(definitions: &[InputDefinition]) -> BuiltInputs {
        let mut built = BuiltInputs::default();

        for def in definitions {
            if def.id.trim().is_empty() {
                warn!("Skipping input definition with an empty id");
                continue;
            }
            if built.registry.get_id(&def.id).is_some() {
                warn!("Skipping duplicate input definition '{}'", def.id);
                continue;
            }

            let handles = match def.kind {
                BindingKind::Button => ActionHandles {
                    button: Some(Self::button(&mut built.graph, def)),
                    ..Default::default()
                },
                BindingKind::Composite2D => Self::composite(&mut built.graph, def),
            };

            built.registry.register(def.clone(), ActionState::new(def.kind, handles));
        }

        debug!(
            "Built binding graph: {} actions, {} sub-actions",
            built.registry.len(),
            built.graph.len()
        );
        built
    }

    fn button(graph: &mut BindingGraph, def: &InputDefinition) -> SubActionHandle {
        let mut sub = SubAction::new(def.id.clone(), def.id.clone(), SubActionRole::Button);

        if def.keyboard.has_primary() {
            sub.slots.push(BindingSlot::new(
                &def.id,
                "button__keyboard".to_string(),
                def.keyboard.primary.clone(),
            ));
        }
        if def.gamepad.has_primary() {
            sub.slots.push(BindingSlot::new(
                &def.id,
                "button__gamepad".to_string(),
                def.gamepad.primary.clone(),
            ));
        }

        graph.push(sub)
    }

    fn composite(graph: &mut BindingGraph, def: &InputDefinition) -> ActionHandles {
        let mut handles = ActionHandles::default();

        if def.keyboard.has_four_way() {
            let sub = Self::four_way(def, SubActionRole::KeyboardKeys, &def.keyboard);
            handles.keyboard_keys = Some(graph.push(sub));
        }

        if def.allow_analog_keyboard {
            let sub = Self::single(def, SubActionRole::KeyboardMouse, "mouse_delta", MOUSE_DELTA_PATH);
            handles.keyboard_mouse = Some(graph.push(sub));
        }

        if def.gamepad.has_four_way() {
            let sub = Self::four_way(def, SubActionRole::GamepadButtons, &def.gamepad);
            handles.gamepad_buttons = Some(graph.push(sub));
        }

        if def.allow_analog_gamepad && def.gamepad.has_primary() {
            let sub = Self::single(def, SubActionRole::GamepadStick, "stick", &def.gamepad.primary);
            handles.gamepad_stick = Some(graph.push(sub));
        }

        handles
    }

    /// Composite head followed by up/down/left/right parts.
    fn four_way(def: &InputDefinition, role: SubActionRole, set: &BindingSet) -> SubAction {
        let token = role.token();
        let mut sub = SubAction::new(format!("{}__{token}", def.id), def.id.clone(), role);

        let mut head = BindingSlot::new(&def.id, format!("{token}__composite"), COMPOSITE_2D_PATH);
        head.is_composite = true;
        sub.slots.push(head);

        for part in CompositePart::ALL {
            let mut slot = BindingSlot::new(
                &def.id,
                format!("{token}__{}", part.name()),
                set.part(part).to_string(),
            );
            slot.part = Some(part);
            slot.is_part_of_composite = true;
            sub.slots.push(slot);
        }

        sub
    }

    fn single(def: &InputDefinition, role: SubActionRole, slot_token: &str, path: &str) -> SubAction {
        let token = role.token();
        let mut sub = SubAction::new(format!("{}__{token}", def.id), def.id.clone(), role);
        sub.slots.push(BindingSlot::new(&def.id, format!("{token}__{slot_token}"), path));
        sub
    }
}
