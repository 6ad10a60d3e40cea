// crates/input_core/src/input/registry.rs
use std::collections::HashMap;

use input_shared::{ActionId, InputDefinition};

use crate::input::action_state::ActionState;

/// One logical action: its definition and the live state reading it.
#[derive(Debug)]
pub struct ActionEntry {
    pub id: ActionId,
    pub definition: InputDefinition,
    pub state: ActionState,
}

/// Owns every [`ActionState`], indexed by definition id and by numeric id.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    name_to_id: HashMap<String, ActionId>,
    entries: Vec<ActionEntry>,
}

impl ActionRegistry {
    /// Registers a definition. An id that is already present keeps its
    /// existing entry.
    pub fn register(&mut self, definition: InputDefinition, state: ActionState) -> ActionId {
        if let Some(&id) = self.name_to_id.get(&definition.id) {
            return id;
        }
        let id = self.entries.len() as ActionId;
        self.name_to_id.insert(definition.id.clone(), id);
        self.entries.push(ActionEntry { id, definition, state });
        id
    }

    pub fn get_id(&self, name: &str) -> Option<ActionId> {
        self.name_to_id.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&ActionEntry> {
        self.get_id(name).and_then(|id| self.by_id(id))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ActionEntry> {
        let id = self.get_id(name)?;
        self.entries.get_mut(id as usize)
    }

    pub fn by_id(&self, id: ActionId) -> Option<&ActionEntry> {
        self.entries.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActionEntry> {
        self.entries.iter_mut()
    }

    /// Definition ids in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.definition.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
