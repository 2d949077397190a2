//! Recursive type descriptors.

use super::context::Context;
use super::name::TypeName;
use super::primitive::PrimitiveType;
use super::property::{EnumCase, TypeProperty};
use super::store::ReferenceKey;
use crate::identifier::{DeltaIdentifiable, DeltaIdentifier};
use serde::{Deserialize, Serialize};

/// Variant tag of a [`TypeDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    Scalar,
    Repeated,
    Dictionary,
    Optional,
    Enum,
    Object,
    Reference,
}

/// Structural description of a type in an API schema.
///
/// Only `Enum` and `Object` carry a name of their own and may be interned
/// in a [`TypesStore`](super::TypesStore), which replaces them by a
/// `Reference`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeDescriptor {
    /// A primitive value.
    Scalar(PrimitiveType),

    /// An ordered collection of elements.
    Repeated {
        /// Element type.
        element: Box<TypeDescriptor>,
    },

    /// A map keyed by a primitive.
    Dictionary {
        /// Key type.
        key: PrimitiveType,
        /// Value type.
        value: Box<TypeDescriptor>,
    },

    /// A value that may be `null`.
    Optional {
        /// The wrapped type.
        wrapped: Box<TypeDescriptor>,
    },

    /// An enumeration with raw values.
    Enum {
        /// Enum name.
        name: TypeName,
        /// Type of the raw values.
        #[serde(rename = "rawValueType", default = "default_raw_value_type")]
        raw_value_type: PrimitiveType,
        /// Cases, in declaration order.
        cases: Vec<EnumCase>,
        /// Exporter metadata.
        #[serde(default, skip_serializing_if = "Context::is_empty")]
        context: Context,
    },

    /// A named record of properties.
    Object {
        /// Object name.
        name: TypeName,
        /// Properties, in declaration order.
        properties: Vec<TypeProperty>,
        /// Exporter metadata.
        #[serde(default, skip_serializing_if = "Context::is_empty")]
        context: Context,
    },

    /// A pointer into a types store.
    Reference {
        /// The store key.
        key: ReferenceKey,
    },
}

fn default_raw_value_type() -> PrimitiveType {
    PrimitiveType::String
}

impl TypeDescriptor {
    /// Scalar descriptor.
    pub fn scalar(primitive: PrimitiveType) -> Self {
        TypeDescriptor::Scalar(primitive)
    }

    /// Repeated descriptor.
    pub fn repeated(element: TypeDescriptor) -> Self {
        TypeDescriptor::Repeated {
            element: Box::new(element),
        }
    }

    /// Dictionary descriptor.
    pub fn dictionary(key: PrimitiveType, value: TypeDescriptor) -> Self {
        TypeDescriptor::Dictionary {
            key,
            value: Box::new(value),
        }
    }

    /// Optional descriptor. Wrapping an optional again is a no-op.
    pub fn optional(wrapped: TypeDescriptor) -> Self {
        if wrapped.is_optional() {
            return wrapped;
        }
        TypeDescriptor::Optional {
            wrapped: Box::new(wrapped),
        }
    }

    /// Enum descriptor with string raw values.
    pub fn enumeration(name: impl Into<TypeName>, cases: Vec<EnumCase>) -> Self {
        Self::enumeration_with_raw_type(name, PrimitiveType::String, cases)
    }

    /// Enum descriptor with an explicit raw value type.
    pub fn enumeration_with_raw_type(
        name: impl Into<TypeName>,
        raw_value_type: PrimitiveType,
        cases: Vec<EnumCase>,
    ) -> Self {
        TypeDescriptor::Enum {
            name: name.into(),
            raw_value_type,
            cases,
            context: Context::default(),
        }
    }

    /// Object descriptor.
    pub fn object(name: impl Into<TypeName>, properties: Vec<TypeProperty>) -> Self {
        TypeDescriptor::Object {
            name: name.into(),
            properties,
            context: Context::default(),
        }
    }

    /// Reference descriptor.
    pub fn reference(key: impl Into<ReferenceKey>) -> Self {
        TypeDescriptor::Reference { key: key.into() }
    }

    /// The variant tag.
    pub fn root_kind(&self) -> RootKind {
        match self {
            TypeDescriptor::Scalar(_) => RootKind::Scalar,
            TypeDescriptor::Repeated { .. } => RootKind::Repeated,
            TypeDescriptor::Dictionary { .. } => RootKind::Dictionary,
            TypeDescriptor::Optional { .. } => RootKind::Optional,
            TypeDescriptor::Enum { .. } => RootKind::Enum,
            TypeDescriptor::Object { .. } => RootKind::Object,
            TypeDescriptor::Reference { .. } => RootKind::Reference,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeDescriptor::Scalar(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDescriptor::Optional { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TypeDescriptor::Enum { .. })
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TypeDescriptor::Object { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeDescriptor::Reference { .. })
    }

    /// Check if this is a storable composite (enum or object).
    pub fn is_composite(&self) -> bool {
        self.is_enum() || self.is_object()
    }

    /// The primitive of a scalar descriptor.
    pub fn as_scalar(&self) -> Option<PrimitiveType> {
        match self {
            TypeDescriptor::Scalar(p) => Some(*p),
            _ => None,
        }
    }

    /// Strip all optional wrappers.
    pub fn unwrapped(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::Optional { wrapped } => wrapped.unwrapped(),
            other => other,
        }
    }

    /// The name of the type this descriptor denotes.
    ///
    /// Containers report the name of their element (or value) type.
    pub fn type_name(&self) -> TypeName {
        match self {
            TypeDescriptor::Scalar(p) => p.type_name(),
            TypeDescriptor::Repeated { element } => element.type_name(),
            TypeDescriptor::Dictionary { value, .. } => value.type_name(),
            TypeDescriptor::Optional { wrapped } => wrapped.type_name(),
            TypeDescriptor::Enum { name, .. } | TypeDescriptor::Object { name, .. } => name.clone(),
            TypeDescriptor::Reference { key } => TypeName::new(key.as_str()),
        }
    }

    /// Properties of an object, empty for every other variant.
    pub fn properties(&self) -> &[TypeProperty] {
        match self {
            TypeDescriptor::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Cases of an enum, empty for every other variant.
    pub fn cases(&self) -> &[EnumCase] {
        match self {
            TypeDescriptor::Enum { cases, .. } => cases,
            _ => &[],
        }
    }

    /// Raw value type of an enum.
    pub fn raw_value_type(&self) -> Option<PrimitiveType> {
        match self {
            TypeDescriptor::Enum { raw_value_type, .. } => Some(*raw_value_type),
            _ => None,
        }
    }

    /// Replace this descriptor and every nested composite by a reference,
    /// without touching a store.
    pub fn referenced(&self) -> TypeDescriptor {
        match self {
            TypeDescriptor::Scalar(_) | TypeDescriptor::Reference { .. } => self.clone(),
            TypeDescriptor::Repeated { element } => TypeDescriptor::repeated(element.referenced()),
            TypeDescriptor::Dictionary { key, value } => {
                TypeDescriptor::dictionary(*key, value.referenced())
            }
            TypeDescriptor::Optional { wrapped } => TypeDescriptor::Optional {
                wrapped: Box::new(wrapped.referenced()),
            },
            TypeDescriptor::Enum { name, .. } | TypeDescriptor::Object { name, .. } => {
                TypeDescriptor::reference(ReferenceKey::for_type(name))
            }
        }
    }

    /// Keep this enum or object but reference the composites nested in its
    /// properties. Other variants behave like [`referenced`](Self::referenced).
    pub fn members_referenced(&self) -> TypeDescriptor {
        match self {
            TypeDescriptor::Object {
                name,
                properties,
                context,
            } => TypeDescriptor::Object {
                name: name.clone(),
                properties: properties
                    .iter()
                    .map(|p| TypeProperty {
                        name: p.name.clone(),
                        type_: p.type_.referenced(),
                        context: p.context.clone(),
                    })
                    .collect(),
                context: context.clone(),
            },
            TypeDescriptor::Enum { .. } => self.clone(),
            other => other.referenced(),
        }
    }

    /// Check if a reference to `key` appears anywhere in this descriptor.
    pub fn mentions(&self, key: &ReferenceKey) -> bool {
        match self {
            TypeDescriptor::Scalar(_) => false,
            TypeDescriptor::Reference { key: k } => k == key,
            TypeDescriptor::Repeated { element } => element.mentions(key),
            TypeDescriptor::Dictionary { value, .. } => value.mentions(key),
            TypeDescriptor::Optional { wrapped } => wrapped.mentions(key),
            TypeDescriptor::Enum { .. } => false,
            TypeDescriptor::Object { properties, .. } => {
                properties.iter().any(|p| p.type_.mentions(key))
            }
        }
    }
}

/// Order-independent comparison of two slices with unique members.
fn same_members<T: PartialEq>(lhs: &[T], rhs: &[T]) -> bool {
    lhs.len() == rhs.len() && lhs.iter().all(|item| rhs.contains(item))
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeDescriptor::Scalar(a), TypeDescriptor::Scalar(b)) => a == b,
            (TypeDescriptor::Repeated { element: a }, TypeDescriptor::Repeated { element: b }) => {
                a == b
            }
            (
                TypeDescriptor::Dictionary { key: ka, value: va },
                TypeDescriptor::Dictionary { key: kb, value: vb },
            ) => ka == kb && va == vb,
            (TypeDescriptor::Optional { wrapped: a }, TypeDescriptor::Optional { wrapped: b }) => {
                a == b
            }
            (
                TypeDescriptor::Enum {
                    name: na,
                    raw_value_type: ra,
                    cases: ca,
                    ..
                },
                TypeDescriptor::Enum {
                    name: nb,
                    raw_value_type: rb,
                    cases: cb,
                    ..
                },
            ) => na == nb && ra == rb && same_members(ca, cb),
            (
                TypeDescriptor::Object {
                    name: na,
                    properties: pa,
                    ..
                },
                TypeDescriptor::Object {
                    name: nb,
                    properties: pb,
                    ..
                },
            ) => na == nb && same_members(pa, pb),
            (TypeDescriptor::Reference { key: a }, TypeDescriptor::Reference { key: b }) => a == b,
            _ => false,
        }
    }
}

impl DeltaIdentifiable for TypeDescriptor {
    fn delta_identifier(&self) -> DeltaIdentifier {
        match self {
            TypeDescriptor::Reference { key } => DeltaIdentifier::new(key.as_str()),
            other => other.type_name().delta_identifier(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> TypeDescriptor {
        TypeDescriptor::object(
            "User",
            vec![
                TypeProperty::new("id", TypeDescriptor::scalar(PrimitiveType::Uuid)),
                TypeProperty::optional("name", TypeDescriptor::scalar(PrimitiveType::String)),
            ],
        )
    }

    #[test]
    fn test_object_equality_ignores_order() {
        let reordered = TypeDescriptor::object(
            "User",
            vec![
                TypeProperty::optional("name", TypeDescriptor::scalar(PrimitiveType::String)),
                TypeProperty::new("id", TypeDescriptor::scalar(PrimitiveType::Uuid)),
            ],
        );
        assert_eq!(user(), reordered);

        let different = TypeDescriptor::object(
            "User",
            vec![TypeProperty::new("id", TypeDescriptor::scalar(PrimitiveType::Uuid))],
        );
        assert_ne!(user(), different);
    }

    #[test]
    fn test_enum_equality() {
        let a = TypeDescriptor::enumeration("Color", vec![EnumCase::new("red"), EnumCase::new("blue")]);
        let b = TypeDescriptor::enumeration("Color", vec![EnumCase::new("blue"), EnumCase::new("red")]);
        let c = TypeDescriptor::enumeration_with_raw_type(
            "Color",
            PrimitiveType::Int,
            vec![EnumCase::new("blue"), EnumCase::new("red")],
        );
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unwrapped_and_type_name() {
        let nested = TypeDescriptor::optional(TypeDescriptor::repeated(user()));
        assert!(nested.is_optional());
        assert_eq!(nested.unwrapped().root_kind(), RootKind::Repeated);
        assert_eq!(nested.type_name().qualified(), "User");

        let double = TypeDescriptor::optional(TypeDescriptor::optional(
            TypeDescriptor::scalar(PrimitiveType::Int),
        ));
        assert_eq!(double.unwrapped(), &TypeDescriptor::scalar(PrimitiveType::Int));
    }

    #[test]
    fn test_referenced_replaces_composites() {
        let list = TypeDescriptor::dictionary(PrimitiveType::String, user());
        match list.referenced() {
            TypeDescriptor::Dictionary { value, .. } => {
                assert_eq!(*value, TypeDescriptor::reference("User"));
            }
            _ => panic!("Expected dictionary"),
        }
        assert!(list.referenced().mentions(&ReferenceKey::new("User")));

        let team = TypeDescriptor::object(
            "Team",
            vec![TypeProperty::new("lead", user())],
        );
        let compact = team.members_referenced();
        assert!(compact.is_object());
        assert_eq!(compact.properties()[0].type_, TypeDescriptor::reference("User"));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(TypeDescriptor::repeated(TypeDescriptor::scalar(
            PrimitiveType::Int,
        )))
        .unwrap();
        assert_eq!(json, serde_json::json!({"repeated": {"element": {"scalar": "Int"}}}));

        let back: TypeDescriptor = serde_json::from_value(serde_json::json!({
            "enum": {"name": "Color", "cases": [{"name": "red", "rawValue": "red"}]}
        }))
        .unwrap();
        assert_eq!(back.raw_value_type(), Some(PrimitiveType::String));
        assert_eq!(back.cases().len(), 1);
    }

    #[test]
    fn test_delta_identifier() {
        assert_eq!(user().delta_identifier().as_str(), "User");
        assert_eq!(
            TypeDescriptor::reference("Shop.Order").delta_identifier().as_str(),
            "Shop.Order"
        );
    }
}
