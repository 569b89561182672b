//! Shared state threaded through one execution run.
//!
//! Every key is written at most once. The executor seeds [`GOAL_KEY`] and
//! [`NUM_SLIDES_KEY`] and then adds one entry per executed node, keyed by the
//! node id. Agents only ever see a [`StateSnapshot`].

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::errors::{DeckError, Result};

pub const GOAL_KEY: &str = "goal";
pub const NUM_SLIDES_KEY: &str = "num_slides";

/// Metadata keys the executor seeds; node ids may not reuse them
pub const RESERVED_KEYS: [&str; 2] = [GOAL_KEY, NUM_SLIDES_KEY];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Append-only-by-key result map, in write order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedState {
    values: HashMap<String, Value>,
    order: Vec<String>,
}

impl SharedState {
    /// Fresh state seeded with the run metadata
    pub fn seeded(goal: &str, num_slides: u8) -> Self {
        let mut state = Self::default();
        state.values.insert(GOAL_KEY.to_string(), Value::from(goal));
        state.order.push(GOAL_KEY.to_string());
        state.values.insert(NUM_SLIDES_KEY.to_string(), Value::from(num_slides));
        state.order.push(NUM_SLIDES_KEY.to_string());
        state
    }

    /// Writes `key` once; a second write is a [`DeckError::StateConflict`]
    pub fn insert_once(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if self.values.contains_key(&key) {
            return Err(DeckError::StateConflict { key });
        }
        self.values.insert(key.clone(), value);
        self.order.push(key);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn goal(&self) -> Option<&str> {
        self.get(GOAL_KEY).and_then(Value::as_str)
    }

    pub fn num_slides(&self) -> Option<u8> {
        self.get(NUM_SLIDES_KEY)
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in the order they were written
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Entries in write order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order
            .iter()
            .filter_map(move |key| self.values.get(key).map(|value| (key.as_str(), value)))
    }

    /// Node results only, reserved metadata excluded
    pub fn node_outputs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(key, _)| !is_reserved_key(key))
    }

    /// Read-only copy handed to agents
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot(Arc::new(self.values.clone()))
    }

    pub fn into_map(self) -> HashMap<String, Value> {
        self.values
    }
}

impl Serialize for SharedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Immutable view of the shared state at the moment a node was dispatched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot(Arc<HashMap<String, Value>>);

impl Serialize for StateSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl StateSnapshot {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn num_slides(&self) -> Option<u8> {
        self.get(NUM_SLIDES_KEY)
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<String, Value> {
        &self.0
    }
}

impl From<HashMap<String, Value>> for StateSnapshot {
    fn from(values: HashMap<String, Value>) -> Self {
        Self(Arc::new(values))
    }
}
