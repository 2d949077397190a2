//! Per-element metadata side channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Open, keyed metadata attached to properties and enum cases.
///
/// Exporters use it for wire-format details (field numbers, JSON keys, ...).
/// It is carried through matching and renames untouched and never takes part
/// in equality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: BTreeMap<String, Value>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Check if the context carries no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_entries() {
        let context = Context::new()
            .with("grpc.fieldNumber", Value::from(3))
            .with("json.key", Value::from("user_id"));

        assert!(!context.is_empty());
        assert_eq!(context.get("grpc.fieldNumber"), Some(&Value::from(3)));
        let keys: Vec<_> = context.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["grpc.fieldNumber", "json.key"]);
    }
}
