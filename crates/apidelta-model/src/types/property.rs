//! Object properties and enum cases.

use super::context::Context;
use super::descriptor::TypeDescriptor;
use super::primitive::PrimitiveType;
use crate::identifier::{DeltaIdentifiable, DeltaIdentifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether an entity requires a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Necessity {
    /// A value must be present.
    Required,
    /// The value may be absent (`null`).
    Optional,
}

impl Necessity {
    /// Check if this necessity demands a value.
    pub fn is_required(&self) -> bool {
        matches!(self, Necessity::Required)
    }
}

/// A named, typed property of an object type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeProperty {
    /// Property name.
    pub name: String,
    /// Property type.
    #[serde(rename = "type")]
    pub type_: TypeDescriptor,
    /// Exporter metadata.
    #[serde(default, skip_serializing_if = "Context::is_empty")]
    pub context: Context,
}

impl TypeProperty {
    /// Create a new property.
    pub fn new(name: impl Into<String>, type_: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            type_,
            context: Context::default(),
        }
    }

    /// Create an optional property, wrapping the type.
    pub fn optional(name: impl Into<String>, type_: TypeDescriptor) -> Self {
        Self::new(name, TypeDescriptor::optional(type_))
    }

    /// Attach exporter metadata.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Necessity derived from the property type.
    pub fn necessity(&self) -> Necessity {
        if self.type_.is_optional() {
            Necessity::Optional
        } else {
            Necessity::Required
        }
    }
}

impl PartialEq for TypeProperty {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.type_ == other.type_
    }
}

impl DeltaIdentifiable for TypeProperty {
    fn delta_identifier(&self) -> DeltaIdentifier {
        DeltaIdentifier::new(self.name.clone())
    }
}

/// A case of an enumeration type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumCase {
    /// Case name.
    pub name: String,
    /// Raw value as written in the schema.
    pub raw_value: String,
    /// Exporter metadata.
    #[serde(default, skip_serializing_if = "Context::is_empty")]
    pub context: Context,
}

impl EnumCase {
    /// Create a case whose raw value equals its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            raw_value: name.clone(),
            name,
            context: Context::default(),
        }
    }

    /// Create a case with an explicit raw value.
    pub fn with_raw_value(name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_value: raw_value.into(),
            context: Context::default(),
        }
    }

    /// Attach exporter metadata.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// The raw value as it travels in JSON for the given raw value type.
    ///
    /// Numeric raw value types encode as numbers; a raw value that does not
    /// parse falls back to its string form.
    pub fn raw_json(&self, raw_value_type: PrimitiveType) -> Value {
        if raw_value_type.is_integer() {
            if let Ok(v) = self.raw_value.parse::<i64>() {
                return Value::from(v);
            }
        } else if raw_value_type.is_floating_point() {
            if let Ok(v) = self.raw_value.parse::<f64>() {
                return Value::from(v);
            }
        }
        Value::String(self.raw_value.clone())
    }
}

impl PartialEq for EnumCase {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.raw_value == other.raw_value
    }
}

impl DeltaIdentifiable for EnumCase {
    fn delta_identifier(&self) -> DeltaIdentifier {
        DeltaIdentifier::new(self.name.clone())
    }
}
