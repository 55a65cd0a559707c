use std::collections::btree_map::{self, BTreeMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{EntityId, GridPos};

/// A dynamically typed memory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Int(i64),
    Bool(bool),
    Entity(EntityId),
    Entities(Vec<EntityId>),
    Position(GridPos),
    Memory(Memory),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Entity(_) => "entity",
            Value::Entities(_) => "entities",
            Value::Position(_) => "position",
            Value::Memory(_) => "memory",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<EntityId> for Value {
    fn from(value: EntityId) -> Self {
        Value::Entity(value)
    }
}

impl From<Vec<EntityId>> for Value {
    fn from(value: Vec<EntityId>) -> Self {
        Value::Entities(value)
    }
}

impl From<GridPos> for Value {
    fn from(value: GridPos) -> Self {
        Value::Position(value)
    }
}

impl From<Memory> for Value {
    fn from(value: Memory) -> Self {
        Value::Memory(value)
    }
}

fn mismatch(key: &str, expected: &str, found: &Value) -> ! {
    panic!(
        "memory type mismatch for key `{key}` (expected {expected}, found {})",
        found.kind()
    )
}

/// Per-entity blackboard keyed by string.
///
/// Absent keys are benign: readers establish defaults with [`Memory::set_default`].
/// Reading a key through a typed accessor that disagrees with the stored variant is a
/// configuration error and panics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Memory {
    values: BTreeMap<String, Value>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    /// Insert or overwrite `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Insert `value` only when `key` is absent. Existing entries are never overwritten.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Value {
        self.values.entry(key.into()).or_insert_with(|| value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            Value::Int(v) => Some(*v),
            other => mismatch(key, "int", other),
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            Value::Bool(v) => Some(*v),
            other => mismatch(key, "bool", other),
        }
    }

    pub fn entity(&self, key: &str) -> Option<EntityId> {
        match self.values.get(key)? {
            Value::Entity(v) => Some(*v),
            other => mismatch(key, "entity", other),
        }
    }

    pub fn entities(&self, key: &str) -> Option<&[EntityId]> {
        match self.values.get(key)? {
            Value::Entities(v) => Some(v.as_slice()),
            other => mismatch(key, "entities", other),
        }
    }

    pub fn position(&self, key: &str) -> Option<GridPos> {
        match self.values.get(key)? {
            Value::Position(v) => Some(*v),
            other => mismatch(key, "position", other),
        }
    }

    pub fn memory(&self, key: &str) -> Option<&Memory> {
        match self.values.get(key)? {
            Value::Memory(v) => Some(v),
            other => mismatch(key, "memory", other),
        }
    }

    pub fn memory_mut(&mut self, key: &str) -> Option<&mut Memory> {
        match self.values.get_mut(key)? {
            Value::Memory(v) => Some(v),
            other => mismatch(key, "memory", other),
        }
    }

    /// Append `entity` to the list stored under `key`, creating the list when absent.
    pub fn push_entity(&mut self, key: &str, entity: EntityId) {
        let entry = self.set_default(key, Vec::<EntityId>::new());
        match entry {
            Value::Entities(list) => list.push(entity),
            other => mismatch(key, "entities", other),
        }
    }

    /// Remove every occurrence of `entity` from the list under `key`.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove_entity(&mut self, key: &str, entity: EntityId) -> bool {
        let Some(value) = self.values.get_mut(key) else {
            return false;
        };
        match value {
            Value::Entities(list) => {
                let before = list.len();
                list.retain(|e| *e != entity);
                list.len() != before
            }
            other => mismatch(key, "entities", other),
        }
    }
}

impl<'a> IntoIterator for &'a Memory {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
