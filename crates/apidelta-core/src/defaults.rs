//! Default and fallback value synthesis.
//!
//! Produces the minimal JSON value that decodes as an instance of a type.
//! Such values fill required properties and parameters that one side of a
//! migration does not provide.

use crate::error::{MigrationError, Result};
use apidelta_model::{
    DataEncodingStrategy, DateEncodingStrategy, EncoderConfiguration, PrimitiveType,
    ReferenceKey, TypeDescriptor, TypesStore,
};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Placeholder for required `URL` values.
pub const PLACEHOLDER_URL: &str = "about:blank";

/// Epoch as an ISO-8601 string.
pub const ISO8601_EPOCH: &str = "1970-01-01T00:00:00Z";

/// Synthesizes default values against one types store.
#[derive(Debug, Clone, Copy)]
pub struct DefaultValueSynthesizer<'a> {
    store: &'a TypesStore,
    encoder: EncoderConfiguration,
}

impl<'a> DefaultValueSynthesizer<'a> {
    pub fn new(store: &'a TypesStore, encoder: EncoderConfiguration) -> Self {
        Self { store, encoder }
    }

    /// Default value of `descriptor`.
    ///
    /// Fails for enums without cases and for types that require themselves
    /// through a chain of non-optional positions.
    pub fn synthesize(&self, descriptor: &TypeDescriptor) -> Result<Value> {
        let mut chain = Vec::new();
        self.synthesize_in(descriptor, &mut chain)
    }

    fn synthesize_in(
        &self,
        descriptor: &TypeDescriptor,
        chain: &mut Vec<ReferenceKey>,
    ) -> Result<Value> {
        match descriptor {
            TypeDescriptor::Scalar(primitive) => Ok(self.scalar(*primitive)),
            TypeDescriptor::Optional { .. } => Ok(Value::Null),
            TypeDescriptor::Repeated { .. } => Ok(Value::Array(Vec::new())),
            TypeDescriptor::Dictionary { .. } => Ok(Value::Object(Map::new())),
            TypeDescriptor::Enum {
                name,
                raw_value_type,
                cases,
                ..
            } => cases
                .first()
                .map(|case| case.raw_json(*raw_value_type))
                .ok_or_else(|| MigrationError::synthesis(name.qualified(), "enum has no cases")),
            TypeDescriptor::Object { properties, .. } => {
                let mut object = Map::new();
                for property in properties {
                    let value = self.synthesize_in(&property.type_, chain)?;
                    object.insert(property.name.clone(), value);
                }
                Ok(Value::Object(object))
            }
            TypeDescriptor::Reference { key } => {
                if chain.contains(key) {
                    return Err(MigrationError::synthesis(
                        key.as_str(),
                        "type requires an instance of itself, no finite default exists",
                    ));
                }
                let stored = self.store.get(key)?;
                chain.push(key.clone());
                let value = self.synthesize_in(stored, chain);
                chain.pop();
                value
            }
        }
    }

    fn scalar(&self, primitive: PrimitiveType) -> Value {
        match primitive {
            PrimitiveType::Null => Value::Null,
            PrimitiveType::Bool => Value::Bool(false),
            PrimitiveType::Float | PrimitiveType::Double => Value::from(0.0),
            p if p.is_integer() => Value::from(0),
            PrimitiveType::Uuid => Value::String(Uuid::nil().to_string()),
            PrimitiveType::Url => Value::String(PLACEHOLDER_URL.to_string()),
            PrimitiveType::Date => match self.encoder.date_encoding_strategy {
                DateEncodingStrategy::Iso8601 => Value::String(ISO8601_EPOCH.to_string()),
                DateEncodingStrategy::DeferredToDate
                | DateEncodingStrategy::SecondsSince1970
                | DateEncodingStrategy::MillisecondsSince1970 => Value::from(0),
            },
            PrimitiveType::Data => match self.encoder.data_encoding_strategy {
                DataEncodingStrategy::Base64 => Value::String(String::new()),
                DataEncodingStrategy::DeferredToData => Value::Array(Vec::new()),
            },
            _ => Value::String(String::new()),
        }
    }
}

/// Check that `value` decodes as an instance of `descriptor`.
///
/// Dates and binary data are accepted in any of their encodings.
pub fn value_conforms(value: &Value, descriptor: &TypeDescriptor, store: &TypesStore) -> bool {
    match descriptor {
        TypeDescriptor::Scalar(primitive) => scalar_conforms(value, *primitive),
        TypeDescriptor::Optional { wrapped } => {
            value.is_null() || value_conforms(value, wrapped, store)
        }
        TypeDescriptor::Repeated { element } => value
            .as_array()
            .map(|items| items.iter().all(|item| value_conforms(item, element, store)))
            .unwrap_or(false),
        TypeDescriptor::Dictionary { value: inner, .. } => value
            .as_object()
            .map(|map| map.values().all(|item| value_conforms(item, inner, store)))
            .unwrap_or(false),
        TypeDescriptor::Enum {
            raw_value_type,
            cases,
            ..
        } => cases
            .iter()
            .any(|case| &case.raw_json(*raw_value_type) == value),
        TypeDescriptor::Object { properties, .. } => match value.as_object() {
            Some(map) => properties.iter().all(|property| {
                match map.get(&property.name) {
                    Some(item) => value_conforms(item, &property.type_, store),
                    None => property.type_.is_optional(),
                }
            }),
            None => false,
        },
        TypeDescriptor::Reference { key } => match store.get(key) {
            Ok(stored) => value_conforms(value, stored, store),
            Err(_) => false,
        },
    }
}

fn scalar_conforms(value: &Value, primitive: PrimitiveType) -> bool {
    match primitive {
        PrimitiveType::Null => value.is_null(),
        PrimitiveType::Bool => value.is_boolean(),
        PrimitiveType::Float | PrimitiveType::Double => value.is_number(),
        p if p.is_integer() => integer_conforms(value, p),
        PrimitiveType::String => value.is_string(),
        PrimitiveType::Uuid => value
            .as_str()
            .map(|s| Uuid::parse_str(s).is_ok())
            .unwrap_or(false),
        PrimitiveType::Url => value.as_str().map(|s| s.contains(':')).unwrap_or(false),
        PrimitiveType::Date => value.is_number() || value.is_string(),
        PrimitiveType::Data => {
            value.is_string()
                || value
                    .as_array()
                    .map(|bytes| bytes.iter().all(|b| b.as_u64().map(|n| n <= 255).unwrap_or(false)))
                    .unwrap_or(false)
        }
        _ => false,
    }
}

fn integer_conforms(value: &Value, primitive: PrimitiveType) -> bool {
    let number = match (value.as_i64(), value.as_u64()) {
        (Some(n), _) => n as i128,
        (None, Some(n)) => n as i128,
        _ => return false,
    };
    primitive
        .integer_range()
        .map(|(min, max)| (min..=max).contains(&number))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidelta_model::{EnumCase, TypeProperty};

    fn synthesize(descriptor: &TypeDescriptor) -> Result<Value> {
        let store = TypesStore::new();
        DefaultValueSynthesizer::new(&store, EncoderConfiguration::default()).synthesize(descriptor)
    }

    #[test]
    fn test_scalar_defaults() {
        assert_eq!(synthesize(&TypeDescriptor::scalar(PrimitiveType::Bool)).unwrap(), Value::Bool(false));
        assert_eq!(synthesize(&TypeDescriptor::scalar(PrimitiveType::Int32)).unwrap(), Value::from(0));
        assert_eq!(synthesize(&TypeDescriptor::scalar(PrimitiveType::String)).unwrap(), Value::from(""));
        assert_eq!(
            synthesize(&TypeDescriptor::scalar(PrimitiveType::Uuid)).unwrap(),
            Value::from("00000000-0000-0000-0000-000000000000")
        );
        assert_eq!(synthesize(&TypeDescriptor::scalar(PrimitiveType::Null)).unwrap(), Value::Null);
    }

    #[test]
    fn test_encoder_driven_defaults() {
        let store = TypesStore::new();
        let iso = EncoderConfiguration::new(
            DateEncodingStrategy::Iso8601,
            DataEncodingStrategy::DeferredToData,
        );
        let synth = DefaultValueSynthesizer::new(&store, iso);

        assert_eq!(
            synth.synthesize(&TypeDescriptor::scalar(PrimitiveType::Date)).unwrap(),
            Value::from(ISO8601_EPOCH)
        );
        assert_eq!(
            synth.synthesize(&TypeDescriptor::scalar(PrimitiveType::Data)).unwrap(),
            Value::Array(Vec::new())
        );
    }

    #[test]
    fn test_composite_defaults() {
        let status = TypeDescriptor::enumeration_with_raw_type(
            "Priority",
            PrimitiveType::Int,
            vec![EnumCase::with_raw_value("low", "1"), EnumCase::with_raw_value("high", "2")],
        );
        let task = TypeDescriptor::object(
            "Task",
            vec![
                TypeProperty::new("title", TypeDescriptor::scalar(PrimitiveType::String)),
                TypeProperty::optional("note", TypeDescriptor::scalar(PrimitiveType::String)),
                TypeProperty::new("priority", status),
                TypeProperty::new("tags", TypeDescriptor::repeated(TypeDescriptor::scalar(PrimitiveType::String))),
            ],
        );

        let value = synthesize(&task).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": "", "note": null, "priority": 1, "tags": []})
        );
        assert!(value_conforms(&value, &task, &TypesStore::new()));
    }

    #[test]
    fn test_enum_without_cases_fails() {
        let empty = TypeDescriptor::enumeration("Nothing", vec![]);
        match synthesize(&empty) {
            Err(MigrationError::SynthesisFailure { type_name, .. }) => assert_eq!(type_name, "Nothing"),
            _ => panic!("Expected SynthesisFailure"),
        }
    }

    #[test]
    fn test_recursive_defaults() {
        let mut store = TypesStore::new();
        store.store(TypeDescriptor::object(
            "Node",
            vec![
                TypeProperty::new("value", TypeDescriptor::scalar(PrimitiveType::Int)),
                TypeProperty::optional("next", TypeDescriptor::reference("Node")),
                TypeProperty::new("children", TypeDescriptor::repeated(TypeDescriptor::reference("Node"))),
            ],
        ));
        store.store(TypeDescriptor::object(
            "Loop",
            vec![TypeProperty::new("again", TypeDescriptor::reference("Loop"))],
        ));
        let synth = DefaultValueSynthesizer::new(&store, EncoderConfiguration::default());

        let node = synth.synthesize(&TypeDescriptor::reference("Node")).unwrap();
        assert_eq!(node, serde_json::json!({"value": 0, "next": null, "children": []}));

        match synth.synthesize(&TypeDescriptor::reference("Loop")) {
            Err(MigrationError::SynthesisFailure { type_name, .. }) => assert_eq!(type_name, "Loop"),
            _ => panic!("Expected SynthesisFailure"),
        }
    }

    #[test]
    fn test_value_conforms_rejects_mismatches() {
        let store = TypesStore::new();
        let uint = TypeDescriptor::scalar(PrimitiveType::UInt8);
        assert!(value_conforms(&Value::from(3), &uint, &store));
        assert!(!value_conforms(&Value::from(-3), &uint, &store));
        assert!(!value_conforms(&Value::from("3"), &uint, &store));
        assert!(!value_conforms(&Value::from(300), &uint, &store));
        assert!(!value_conforms(&Value::from(1.5), &uint, &store));

        let user = TypeDescriptor::object(
            "User",
            vec![TypeProperty::new("id", TypeDescriptor::scalar(PrimitiveType::Int))],
        );
        assert!(!value_conforms(&serde_json::json!({}), &user, &store));
        assert!(!value_conforms(&serde_json::json!({"id": "x"}), &user, &store));
    }

    #[test]
    fn test_integer_width_limits() {
        let store = TypesStore::new();
        let int8 = TypeDescriptor::scalar(PrimitiveType::Int8);
        assert!(value_conforms(&Value::from(127), &int8, &store));
        assert!(value_conforms(&Value::from(-128), &int8, &store));
        assert!(!value_conforms(&Value::from(128), &int8, &store));
        assert!(!value_conforms(&Value::from(-1000), &int8, &store));

        let uint64 = TypeDescriptor::scalar(PrimitiveType::UInt64);
        assert!(value_conforms(&Value::from(u64::MAX), &uint64, &store));
        assert!(!value_conforms(&Value::from(-1), &uint64, &store));

        let int64 = TypeDescriptor::scalar(PrimitiveType::Int64);
        assert!(!value_conforms(&Value::from(u64::MAX), &int64, &store));
    }
}
