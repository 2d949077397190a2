//! Deduplicating registry of composite types.

use super::descriptor::TypeDescriptor;
use super::name::TypeName;
use super::property::TypeProperty;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key under which a composite type is registered in a [`TypesStore`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceKey(String);

impl ReferenceKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The key a composite with the given name is stored under.
    pub fn for_type(name: &TypeName) -> Self {
        Self(name.qualified())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReferenceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ReferenceKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Mapping from reference keys to composite descriptors.
///
/// Stored descriptors only ever contain references in place of nested
/// composites, so every type is held exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypesStore {
    types: BTreeMap<ReferenceKey, TypeDescriptor>,
}

impl TypesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern every enum and object in `descriptor`, innermost first.
    ///
    /// Returns the descriptor with composites replaced by references. A type
    /// stored twice under the same name keeps the latest definition.
    pub fn store(&mut self, descriptor: TypeDescriptor) -> TypeDescriptor {
        match descriptor {
            TypeDescriptor::Scalar(_) | TypeDescriptor::Reference { .. } => descriptor,
            TypeDescriptor::Repeated { element } => TypeDescriptor::Repeated {
                element: Box::new(self.store(*element)),
            },
            TypeDescriptor::Dictionary { key, value } => TypeDescriptor::Dictionary {
                key,
                value: Box::new(self.store(*value)),
            },
            TypeDescriptor::Optional { wrapped } => TypeDescriptor::Optional {
                wrapped: Box::new(self.store(*wrapped)),
            },
            TypeDescriptor::Enum {
                name,
                raw_value_type,
                cases,
                context,
            } => {
                let key = ReferenceKey::for_type(&name);
                self.types.insert(
                    key.clone(),
                    TypeDescriptor::Enum {
                        name,
                        raw_value_type,
                        cases,
                        context,
                    },
                );
                TypeDescriptor::Reference { key }
            }
            TypeDescriptor::Object {
                name,
                properties,
                context,
            } => {
                let properties = properties
                    .into_iter()
                    .map(|property| TypeProperty {
                        type_: self.store(property.type_),
                        ..property
                    })
                    .collect();
                let key = ReferenceKey::for_type(&name);
                self.types.insert(
                    key.clone(),
                    TypeDescriptor::Object {
                        name,
                        properties,
                        context,
                    },
                );
                TypeDescriptor::Reference { key }
            }
        }
    }

    /// Resolve every reference in `descriptor` back to full structure.
    ///
    /// Each key is expanded at most once per chain. Re-entering a key that is
    /// already being expanded leaves the reference in place as a cycle marker.
    pub fn construct(&self, descriptor: &TypeDescriptor) -> Result<TypeDescriptor, Error> {
        let mut chain = Vec::new();
        self.construct_in(descriptor, &mut chain)
    }

    fn construct_in(
        &self,
        descriptor: &TypeDescriptor,
        chain: &mut Vec<ReferenceKey>,
    ) -> Result<TypeDescriptor, Error> {
        match descriptor {
            TypeDescriptor::Scalar(_) | TypeDescriptor::Enum { .. } => Ok(descriptor.clone()),
            TypeDescriptor::Repeated { element } => Ok(TypeDescriptor::Repeated {
                element: Box::new(self.construct_in(element, chain)?),
            }),
            TypeDescriptor::Dictionary { key, value } => Ok(TypeDescriptor::Dictionary {
                key: *key,
                value: Box::new(self.construct_in(value, chain)?),
            }),
            TypeDescriptor::Optional { wrapped } => Ok(TypeDescriptor::Optional {
                wrapped: Box::new(self.construct_in(wrapped, chain)?),
            }),
            TypeDescriptor::Object {
                name,
                properties,
                context,
            } => {
                let properties = properties
                    .iter()
                    .map(|property| {
                        Ok(TypeProperty {
                            name: property.name.clone(),
                            type_: self.construct_in(&property.type_, chain)?,
                            context: property.context.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(TypeDescriptor::Object {
                    name: name.clone(),
                    properties,
                    context: context.clone(),
                })
            }
            TypeDescriptor::Reference { key } => {
                if chain.contains(key) {
                    return Ok(descriptor.clone());
                }
                let stored = self.get(key)?;
                chain.push(key.clone());
                let constructed = self.construct_in(stored, chain);
                chain.pop();
                constructed
            }
        }
    }

    /// Look up a stored descriptor.
    pub fn get(&self, key: &ReferenceKey) -> Result<&TypeDescriptor, Error> {
        self.types.get(key).ok_or_else(|| Error::DanglingReference {
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &ReferenceKey) -> bool {
        self.types.contains_key(key)
    }

    /// Stored keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &ReferenceKey> {
        self.types.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReferenceKey, &TypeDescriptor)> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumCase, PrimitiveType};

    fn order() -> TypeDescriptor {
        TypeDescriptor::object(
            "Order",
            vec![
                TypeProperty::new("id", TypeDescriptor::scalar(PrimitiveType::Int64)),
                TypeProperty::new(
                    "status",
                    TypeDescriptor::enumeration(
                        "Status",
                        vec![EnumCase::new("open"), EnumCase::new("closed")],
                    ),
                ),
                TypeProperty::new(
                    "lines",
                    TypeDescriptor::repeated(TypeDescriptor::object(
                        "Line",
                        vec![TypeProperty::new("qty", TypeDescriptor::scalar(PrimitiveType::UInt32))],
                    )),
                ),
            ],
        )
    }

    #[test]
    fn test_store_interns_nested_composites() {
        let mut store = TypesStore::new();
        let reference = store.store(order());

        assert_eq!(reference, TypeDescriptor::reference("Order"));
        assert_eq!(store.len(), 3);

        let stored = store.get(&ReferenceKey::new("Order")).unwrap();
        assert_eq!(
            stored.properties()[1].type_,
            TypeDescriptor::reference("Status")
        );
    }

    #[test]
    fn test_construct_round_trip() {
        let mut store = TypesStore::new();
        let reference = store.store(order());
        assert_eq!(store.construct(&reference).unwrap(), order());
    }

    #[test]
    fn test_store_is_idempotent() {
        let mut store = TypesStore::new();
        let first = store.store(order());
        let second = store.store(order());

        assert_eq!(first, second);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_construct_recursive_type() {
        let node = TypeDescriptor::object(
            "Node",
            vec![
                TypeProperty::new("value", TypeDescriptor::scalar(PrimitiveType::Int)),
                TypeProperty::optional("next", TypeDescriptor::reference("Node")),
            ],
        );

        let mut store = TypesStore::new();
        let reference = store.store(node.clone());
        let constructed = store.construct(&reference).unwrap();

        assert_eq!(constructed, node);
    }

    #[test]
    fn test_dangling_reference() {
        let store = TypesStore::new();
        let result = store.construct(&TypeDescriptor::reference("Missing"));

        match result {
            Err(Error::DanglingReference { key }) => assert_eq!(key, "Missing"),
            _ => panic!("Expected DanglingReference"),
        }
    }
}
