//! Change model.
//!
//! A [`Change`] records one difference between two document versions: what
//! changed ([`ChangeElement`]), how ([`ChangeKind`]), and whether clients
//! built against the old version are affected (`breaking`) and can be
//! bridged automatically (`solvable`).
//!
//! Scripts and JSON values attached to a change are referred to by id; the
//! ids resolve in the stores of the enclosing migration guide.

use apidelta_model::{DeltaIdentifier, ExporterKind, Necessity, TypeDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sub-target of the service metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceTarget {
    Name,
    Version,
    Http,
    Exporter(ExporterKind),
}

/// Sub-target of an object model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectTarget {
    /// The model as a whole.
    Itself,
    Property(DeltaIdentifier),
}

/// Sub-target of an enum model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumTarget {
    /// The model as a whole.
    Itself,
    Case(DeltaIdentifier),
    RawValueType,
}

/// Sub-target of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndpointTarget {
    /// The endpoint as a whole.
    Itself,
    /// One of the exporter-facing identifiers, by key.
    Identifier(String),
    CommunicationalPattern,
    Parameter(DeltaIdentifier),
    Response,
    Errors,
}

/// The entity (and part of it) a change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeElement {
    Service {
        target: ServiceTarget,
    },
    Object {
        id: DeltaIdentifier,
        target: ObjectTarget,
    },
    Enum {
        id: DeltaIdentifier,
        target: EnumTarget,
    },
    Endpoint {
        id: DeltaIdentifier,
        target: EndpointTarget,
    },
}

/// Which section of a migration guide a change belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeCategory {
    Service,
    Model,
    Endpoint,
}

impl ChangeElement {
    pub fn category(&self) -> ChangeCategory {
        match self {
            ChangeElement::Service { .. } => ChangeCategory::Service,
            ChangeElement::Object { .. } | ChangeElement::Enum { .. } => ChangeCategory::Model,
            ChangeElement::Endpoint { .. } => ChangeCategory::Endpoint,
        }
    }

    /// Path of the element, used to order changes.
    ///
    /// Object and enum models share one namespace so models sort by name
    /// regardless of their kind.
    pub fn path(&self) -> Vec<String> {
        fn seg(parts: &[&str]) -> Vec<String> {
            parts.iter().map(|p| p.to_string()).collect()
        }
        match self {
            ChangeElement::Service { target } => match target {
                ServiceTarget::Name => seg(&["service", "name"]),
                ServiceTarget::Version => seg(&["service", "version"]),
                ServiceTarget::Http => seg(&["service", "http"]),
                ServiceTarget::Exporter(kind) => {
                    vec!["service".into(), "exporter".into(), kind.to_string()]
                }
            },
            ChangeElement::Object { id, target } => match target {
                ObjectTarget::Itself => seg(&["model", id.as_str()]),
                ObjectTarget::Property(p) => seg(&["model", id.as_str(), "property", p.as_str()]),
            },
            ChangeElement::Enum { id, target } => match target {
                EnumTarget::Itself => seg(&["model", id.as_str()]),
                EnumTarget::Case(c) => seg(&["model", id.as_str(), "case", c.as_str()]),
                EnumTarget::RawValueType => seg(&["model", id.as_str(), "rawValueType"]),
            },
            ChangeElement::Endpoint { id, target } => match target {
                EndpointTarget::Itself => seg(&["endpoint", id.as_str()]),
                EndpointTarget::Identifier(key) => {
                    seg(&["endpoint", id.as_str(), "identifier", key])
                }
                EndpointTarget::CommunicationalPattern => {
                    seg(&["endpoint", id.as_str(), "communicationalPattern"])
                }
                EndpointTarget::Parameter(p) => {
                    seg(&["endpoint", id.as_str(), "parameter", p.as_str()])
                }
                EndpointTarget::Response => seg(&["endpoint", id.as_str(), "response"]),
                EndpointTarget::Errors => seg(&["endpoint", id.as_str(), "errors"]),
            },
        }
    }
}

/// A synthesized type conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeConversion {
    /// Type before the change, composites referenced.
    pub from: TypeDescriptor,
    /// Type after the change, composites referenced.
    pub to: TypeDescriptor,
    /// Script id converting old values into new ones.
    pub forward_migration: u32,
    /// Script id converting new values into old ones, if one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backward_migration: Option<u32>,
    /// Set when the conversion may lose information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_warning: Option<String>,
}

/// What kind of difference a change records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChangeKind {
    /// An element was added.
    #[serde(rename_all = "camelCase")]
    Addition {
        /// The added element, composites referenced.
        added: Value,
        /// Value id of the default for required additions.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_value: Option<u32>,
    },
    /// An element was removed.
    #[serde(rename_all = "camelCase")]
    Deletion {
        deleted: DeltaIdentifier,
        /// Value id of the fallback for required deletions.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback_value: Option<u32>,
    },
    /// An element was renamed.
    Rename {
        from: DeltaIdentifier,
        to: DeltaIdentifier,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        similarity: Option<f64>,
    },
    /// A plain value changed.
    ValueUpdate { from: Value, to: Value },
    /// Required became optional or the other way round.
    #[serde(rename_all = "camelCase")]
    NecessityChange {
        from: Necessity,
        to: Necessity,
        /// Value id used when a value becomes required.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        necessity_value: Option<u32>,
    },
    /// The type of an object property changed.
    PropertyChange(TypeConversion),
    /// The type of an endpoint parameter changed.
    ParameterChange(TypeConversion),
    /// The response type of an endpoint changed.
    ResponseChange(TypeConversion),
    /// A change that cannot be bridged.
    Unsupported { description: String },
}

impl ChangeKind {
    /// Tie-break rank for changes on the same element.
    pub fn rank(&self) -> u8 {
        match self {
            ChangeKind::Rename { .. } => 0,
            ChangeKind::Deletion { .. } => 1,
            ChangeKind::Addition { .. } => 2,
            ChangeKind::ValueUpdate { .. } => 3,
            ChangeKind::NecessityChange { .. } => 4,
            ChangeKind::PropertyChange(_)
            | ChangeKind::ParameterChange(_)
            | ChangeKind::ResponseChange(_) => 5,
            ChangeKind::Unsupported { .. } => 6,
        }
    }

    pub fn conversion(&self) -> Option<&TypeConversion> {
        match self {
            ChangeKind::PropertyChange(c)
            | ChangeKind::ParameterChange(c)
            | ChangeKind::ResponseChange(c) => Some(c),
            _ => None,
        }
    }

    /// Ids of scripts this change refers to.
    pub fn script_ids(&self) -> Vec<u32> {
        match self.conversion() {
            Some(c) => std::iter::once(c.forward_migration)
                .chain(c.backward_migration)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Ids of JSON values this change refers to.
    pub fn value_ids(&self) -> Vec<u32> {
        match self {
            ChangeKind::Addition { default_value, .. } => default_value.iter().copied().collect(),
            ChangeKind::Deletion { fallback_value, .. } => fallback_value.iter().copied().collect(),
            ChangeKind::NecessityChange {
                necessity_value, ..
            } => necessity_value.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Rewrite script and value ids.
    pub fn remap_ids(&mut self, mut script: impl FnMut(u32) -> u32, mut value: impl FnMut(u32) -> u32) {
        match self {
            ChangeKind::PropertyChange(c)
            | ChangeKind::ParameterChange(c)
            | ChangeKind::ResponseChange(c) => {
                c.forward_migration = script(c.forward_migration);
                c.backward_migration = c.backward_migration.map(&mut script);
            }
            ChangeKind::Addition { default_value, .. } => {
                *default_value = default_value.map(&mut value);
            }
            ChangeKind::Deletion { fallback_value, .. } => {
                *fallback_value = fallback_value.map(&mut value);
            }
            ChangeKind::NecessityChange {
                necessity_value, ..
            } => {
                *necessity_value = necessity_value.map(&mut value);
            }
            ChangeKind::Rename { .. }
            | ChangeKind::ValueUpdate { .. }
            | ChangeKind::Unsupported { .. } => {}
        }
    }
}

/// One classified difference between two document versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub element: ChangeElement,
    #[serde(flatten)]
    pub kind: ChangeKind,
    pub breaking: bool,
    pub solvable: bool,
}

impl Change {
    /// Addition of an element. Breaking iff the caller says the element is
    /// required on the new side.
    pub fn addition(element: ChangeElement, added: Value, default_value: Option<u32>, breaking: bool) -> Self {
        Self {
            element,
            kind: ChangeKind::Addition { added, default_value },
            breaking,
            solvable: true,
        }
    }

    /// Removal of an element.
    pub fn deletion(
        element: ChangeElement,
        deleted: DeltaIdentifier,
        fallback_value: Option<u32>,
        breaking: bool,
    ) -> Self {
        Self {
            element,
            kind: ChangeKind::Deletion {
                deleted,
                fallback_value,
            },
            breaking,
            solvable: true,
        }
    }

    /// Rename. Never breaking.
    pub fn rename(
        element: ChangeElement,
        from: DeltaIdentifier,
        to: DeltaIdentifier,
        similarity: Option<f64>,
    ) -> Self {
        Self {
            element,
            kind: ChangeKind::Rename {
                from,
                to,
                similarity,
            },
            breaking: false,
            solvable: true,
        }
    }

    pub fn value_update(
        element: ChangeElement,
        from: Value,
        to: Value,
        breaking: bool,
        solvable: bool,
    ) -> Self {
        Self {
            element,
            kind: ChangeKind::ValueUpdate { from, to },
            breaking,
            solvable,
        }
    }

    /// Necessity change. Breaking iff the element becomes required.
    pub fn necessity(
        element: ChangeElement,
        from: Necessity,
        to: Necessity,
        necessity_value: Option<u32>,
    ) -> Self {
        Self {
            element,
            kind: ChangeKind::NecessityChange {
                from,
                to,
                necessity_value,
            },
            breaking: to.is_required(),
            solvable: true,
        }
    }

    /// A bridged type change. Always breaking.
    pub fn type_change(element: ChangeElement, kind: ChangeKind) -> Self {
        Self {
            element,
            kind,
            breaking: true,
            solvable: true,
        }
    }

    /// A change that cannot be bridged.
    pub fn unsupported(element: ChangeElement, description: impl Into<String>) -> Self {
        Self {
            element,
            kind: ChangeKind::Unsupported {
                description: description.into(),
            },
            breaking: true,
            solvable: false,
        }
    }

    /// Whether a developer has to act on this change.
    pub fn requires_manual_action(&self) -> bool {
        self.breaking && !self.solvable
    }

    /// Sort key: element path, then kind rank.
    pub fn sort_key(&self) -> (ChangeCategory, Vec<String>, u8) {
        (self.element.category(), self.element.path(), self.kind.rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidelta_model::PrimitiveType;

    fn property(name: &str) -> ChangeElement {
        ChangeElement::Object {
            id: "User".into(),
            target: ObjectTarget::Property(name.into()),
        }
    }

    #[test]
    fn test_classification() {
        let rename = Change::rename(property("userId"), "userId".into(), "id".into(), Some(0.67));
        assert!(!rename.breaking);
        assert!(rename.solvable);

        let loosened = Change::necessity(property("age"), Necessity::Required, Necessity::Optional, None);
        assert!(!loosened.breaking);
        let tightened = Change::necessity(property("age"), Necessity::Optional, Necessity::Required, Some(0));
        assert!(tightened.breaking);

        let unsupported = Change::unsupported(property("age"), "incompatible");
        assert!(unsupported.requires_manual_action());
        assert!(!tightened.requires_manual_action());
    }

    #[test]
    fn test_serialized_shape() {
        let change = Change::deletion(property("a"), "a".into(), Some(0), true);
        let json = serde_json::to_value(&change).unwrap();

        assert_eq!(json["type"], "deletion");
        assert_eq!(json["deleted"], "a");
        assert_eq!(json["fallbackValue"], 0);
        assert_eq!(json["breaking"], true);
        assert_eq!(json["element"]["object"]["target"]["property"], "a");

        let back: Change = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn test_type_change_round_trip() {
        let change = Change::type_change(
            ChangeElement::Endpoint {
                id: "getUser".into(),
                target: EndpointTarget::Parameter("id".into()),
            },
            ChangeKind::ParameterChange(TypeConversion {
                from: TypeDescriptor::scalar(PrimitiveType::Int),
                to: TypeDescriptor::scalar(PrimitiveType::String),
                forward_migration: 0,
                backward_migration: Some(1),
                conversion_warning: None,
            }),
        );

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["type"], "parameter-change");
        assert_eq!(json["forwardMigration"], 0);
        assert_eq!(change.kind.script_ids(), vec![0, 1]);

        let back: Change = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn test_remap_ids() {
        let mut kind = ChangeKind::NecessityChange {
            from: Necessity::Optional,
            to: Necessity::Required,
            necessity_value: Some(4),
        };
        kind.remap_ids(|s| s, |v| v + 10);
        assert_eq!(kind.value_ids(), vec![14]);
    }

    #[test]
    fn test_sort_key_orders_by_path_then_kind() {
        let deletion = Change::deletion(property("b"), "b".into(), None, false);
        let rename = Change::rename(property("b"), "b".into(), "c".into(), None);
        let earlier = Change::deletion(property("a"), "a".into(), None, false);

        assert!(rename.sort_key() < deletion.sort_key());
        assert!(earlier.sort_key() < rename.sort_key());
    }
}
