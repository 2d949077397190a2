//! Qualified type names.

use super::primitive::PrimitiveType;
use crate::identifier::{DeltaIdentifiable, DeltaIdentifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A qualified, possibly nested type name such as `Shop.Order.Item`.
///
/// Equality is structural over the name components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName {
    components: Vec<String>,
}

impl TypeName {
    /// Parse a dot-separated name. Empty components are dropped.
    pub fn new(raw: &str) -> Self {
        let components = raw
            .split('.')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        Self { components }
    }

    /// Build a name from explicit components.
    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// The innermost (unqualified) name.
    pub fn name(&self) -> &str {
        self.components.last().map(String::as_str).unwrap_or("")
    }

    /// All name components, outermost first.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The dot-joined qualified name.
    pub fn qualified(&self) -> String {
        self.components.join(".")
    }

    /// A name nested inside this one.
    pub fn nested(&self, inner: impl Into<String>) -> Self {
        let mut components = self.components.clone();
        components.push(inner.into());
        Self { components }
    }

    /// Check if the name denotes one of the scalar primitives.
    pub fn is_primitive(&self) -> bool {
        self.as_primitive().is_some()
    }

    /// The primitive this name denotes, if any.
    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self.components.as_slice() {
            [single] => PrimitiveType::from_name(single),
            _ => None,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        TypeName::new(&value)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        TypeName::new(value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.qualified()
    }
}

impl DeltaIdentifiable for TypeName {
    fn delta_identifier(&self) -> DeltaIdentifier {
        DeltaIdentifier::new(self.qualified())
    }
}
