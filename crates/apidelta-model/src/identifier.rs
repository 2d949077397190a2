//! Delta identifiers.
//!
//! Every comparable entity (type, property, enum case, endpoint, parameter)
//! exposes a [`DeltaIdentifier`]. Two versions of the same entity produce the
//! same identifier unless the entity was renamed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity key used to match entities across two document versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeltaIdentifier(String);

impl DeltaIdentifier {
    /// Create an identifier from its raw value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeltaIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeltaIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DeltaIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Implemented by every entity that takes part in cross-version matching.
pub trait DeltaIdentifiable {
    /// The identity key of this entity.
    fn delta_identifier(&self) -> DeltaIdentifier;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_ordering_and_display() {
        let a = DeltaIdentifier::from("alpha");
        let b = DeltaIdentifier::from("beta".to_string());

        assert!(a < b);
        assert_eq!(a.to_string(), "alpha");
        assert_eq!(b.as_str(), "beta");
    }

    #[test]
    fn test_identifier_serializes_as_string() {
        let id = DeltaIdentifier::new("getUser");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"getUser\"");

        let back: DeltaIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
