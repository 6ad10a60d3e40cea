// crates/input_core/src/input/flags.rs
//! Per-action mode flags (analog keyboard, analog gamepad, inverted Y) and
//! their application to live [`ActionState`](crate::input::ActionState)s.

use std::collections::BTreeSet;

use tracing::trace;

use input_shared::BindingKind;

use crate::input::graph::BindingGraph;
use crate::input::registry::ActionRegistry;
use crate::input::signal::{ObserverToken, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    AnalogKeyboard,
    AnalogGamepad,
    InvertedY,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagChange {
    /// One id's flag flipped.
    Set { id: String, kind: FlagKind, value: bool },
    /// All sets were replaced (profile load or reset).
    Replaced,
}

/// The three id sets. Ordered so that persisted lists come out sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSets {
    pub analog_keyboard: BTreeSet<String>,
    pub analog_gamepad: BTreeSet<String>,
    pub inverted_y: BTreeSet<String>,
}

impl FlagSets {
    pub fn get(&self, kind: FlagKind) -> &BTreeSet<String> {
        match kind {
            FlagKind::AnalogKeyboard => &self.analog_keyboard,
            FlagKind::AnalogGamepad => &self.analog_gamepad,
            FlagKind::InvertedY => &self.inverted_y,
        }
    }

    fn get_mut(&mut self, kind: FlagKind) -> &mut BTreeSet<String> {
        match kind {
            FlagKind::AnalogKeyboard => &mut self.analog_keyboard,
            FlagKind::AnalogGamepad => &mut self.analog_gamepad,
            FlagKind::InvertedY => &mut self.inverted_y,
        }
    }

    pub fn contains(&self, kind: FlagKind, id: &str) -> bool {
        self.get(kind).contains(id)
    }
}

/// Single writer of mode flags.
#[derive(Debug, Default)]
pub struct ProfileFlagStore {
    sets: FlagSets,
    revision: u64,
    changes: Signal<FlagChange>,
}

impl ProfileFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sets(&self) -> &FlagSets {
        &self.sets
    }

    /// Bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&FlagChange) + 'static) -> ObserverToken {
        self.changes.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        self.changes.unsubscribe(token)
    }

    pub fn is_analog_keyboard(&self, id: &str) -> bool {
        self.sets.contains(FlagKind::AnalogKeyboard, id)
    }

    pub fn is_analog_gamepad(&self, id: &str) -> bool {
        self.sets.contains(FlagKind::AnalogGamepad, id)
    }

    pub fn is_inverted_y(&self, id: &str) -> bool {
        self.sets.contains(FlagKind::InvertedY, id)
    }

    /// Flips one flag and re-applies that action's modes right away.
    pub fn set(
        &mut self,
        kind: FlagKind,
        id: &str,
        value: bool,
        registry: &mut ActionRegistry,
        graph: &mut BindingGraph,
    ) {
        let set = self.sets.get_mut(kind);
        let changed = if value {
            set.insert(id.to_string())
        } else {
            set.remove(id)
        };

        if changed {
            self.revision += 1;
            self.changes.emit(&FlagChange::Set {
                id: id.to_string(),
                kind,
                value,
            });
        }

        self.apply(id, registry, graph);
    }

    pub fn set_analog_keyboard(&mut self, id: &str, value: bool, registry: &mut ActionRegistry, graph: &mut BindingGraph) {
        self.set(FlagKind::AnalogKeyboard, id, value, registry, graph);
    }

    pub fn set_analog_gamepad(&mut self, id: &str, value: bool, registry: &mut ActionRegistry, graph: &mut BindingGraph) {
        self.set(FlagKind::AnalogGamepad, id, value, registry, graph);
    }

    pub fn set_inverted_y(&mut self, id: &str, value: bool, registry: &mut ActionRegistry, graph: &mut BindingGraph) {
        self.set(FlagKind::InvertedY, id, value, registry, graph);
    }

    /// Wholesale replacement, then a bulk re-apply.
    pub fn replace(&mut self, sets: FlagSets, registry: &mut ActionRegistry, graph: &mut BindingGraph) {
        self.sets = sets;
        self.revision += 1;
        self.changes.emit(&FlagChange::Replaced);
        self.apply_all(registry, graph);
    }

    /// Flags a profile-less start begins with: mouse mode for composites
    /// that ask for it, digital everywhere else.
    pub fn seed_defaults(registry: &ActionRegistry) -> FlagSets {
        FlagSets {
            analog_keyboard: registry
                .iter()
                .filter(|entry| entry.definition.seeds_analog_keyboard())
                .map(|entry| entry.definition.id.clone())
                .collect(),
            ..Default::default()
        }
    }

    pub fn reset(&mut self, registry: &mut ActionRegistry, graph: &mut BindingGraph) {
        let seeded = Self::seed_defaults(registry);
        self.replace(seeded, registry, graph);
    }

    /// Pushes the stored flags of one action into its state. Modes only
    /// apply to composites and only where the definition allows them.
    pub fn apply(&self, id: &str, registry: &mut ActionRegistry, graph: &mut BindingGraph) {
        let Some(entry) = registry.get_mut(id) else {
            return;
        };

        if entry.definition.kind == BindingKind::Composite2D {
            let analog_keyboard = entry.definition.allow_analog_keyboard && self.is_analog_keyboard(id);
            let analog_gamepad = entry.definition.allow_analog_gamepad && self.is_analog_gamepad(id);
            entry.state.set_modes(graph, analog_keyboard, analog_gamepad);
        }
        entry.state.set_invert_y(self.is_inverted_y(id));

        trace!(
            "Applied flags to '{id}': analog_kb={}, analog_gp={}, invert_y={}",
            entry.state.use_analog_keyboard(),
            entry.state.use_analog_gamepad(),
            entry.state.invert_y()
        );
    }

    pub fn apply_all(&self, registry: &mut ActionRegistry, graph: &mut BindingGraph) {
        let ids: Vec<String> = registry.names().map(str::to_string).collect();
        for id in &ids {
            self.apply(id, registry, graph);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::builder::{BindingGraphBuilder, BuiltInputs};
    use input_shared::{BindingSet, InputDefinition};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn built() -> BuiltInputs {
        let look = InputDefinition::composite(
            "Look",
            BindingSet::four_way("<Keyboard>/i", "<Keyboard>/k", "<Keyboard>/j", "<Keyboard>/l"),
            BindingSet::button("<Gamepad>/rightStick"),
        )
        .with_analog_keyboard(true)
        .with_analog_gamepad();
        let fixed = InputDefinition::composite(
            "Pan",
            BindingSet::four_way("<Keyboard>/t", "<Keyboard>/g", "<Keyboard>/f", "<Keyboard>/h"),
            BindingSet::default(),
        );
        let jump = InputDefinition::button("Jump", BindingSet::button("<Keyboard>/space"), BindingSet::default());

        let mut built = BindingGraphBuilder::build(&[look, fixed, jump]);
        for entry in built.registry.iter_mut() {
            entry.state.enable(&mut built.graph);
        }
        built
    }

    #[test]
    fn seed_uses_default_mouse_only_where_allowed() {
        let built = built();
        let seeded = ProfileFlagStore::seed_defaults(&built.registry);
        assert_eq!(seeded.analog_keyboard.iter().collect::<Vec<_>>(), vec!["Look"]);
        assert!(seeded.analog_gamepad.is_empty());
        assert!(seeded.inverted_y.is_empty());
    }

    #[test]
    fn setting_a_flag_reapplies_modes_immediately() {
        let mut built = built();
        let mut flags = ProfileFlagStore::new();

        flags.set_analog_keyboard("Look", true, &mut built.registry, &mut built.graph);
        assert!(flags.is_analog_keyboard("Look"));
        assert!(built.registry.get("Look").unwrap().state.use_analog_keyboard());

        flags.set_analog_keyboard("Look", false, &mut built.registry, &mut built.graph);
        assert!(!built.registry.get("Look").unwrap().state.use_analog_keyboard());
    }

    #[test]
    fn disallowed_modes_stay_digital() {
        let mut built = built();
        let mut flags = ProfileFlagStore::new();

        flags.set_analog_keyboard("Pan", true, &mut built.registry, &mut built.graph);
        assert!(flags.is_analog_keyboard("Pan"));
        assert!(!built.registry.get("Pan").unwrap().state.use_analog_keyboard());
    }

    #[test]
    fn invert_applies_to_every_kind() {
        let mut built = built();
        let mut flags = ProfileFlagStore::new();

        flags.set_inverted_y("Jump", true, &mut built.registry, &mut built.graph);
        assert!(built.registry.get("Jump").unwrap().state.invert_y());
    }

    #[test]
    fn observers_see_changes_and_replacements() {
        let mut built = built();
        let mut flags = ProfileFlagStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        flags.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        flags.set_analog_gamepad("Look", true, &mut built.registry, &mut built.graph);
        flags.set_analog_gamepad("Look", true, &mut built.registry, &mut built.graph);
        flags.reset(&mut built.registry, &mut built.graph);

        assert_eq!(
            *seen.borrow(),
            vec![
                FlagChange::Set {
                    id: "Look".into(),
                    kind: FlagKind::AnalogGamepad,
                    value: true
                },
                FlagChange::Replaced,
            ]
        );
        assert_eq!(flags.revision(), 2);
        assert!(!built.registry.get("Look").unwrap().state.use_analog_gamepad());
        assert!(built.registry.get("Look").unwrap().state.use_analog_keyboard());
    }
}
