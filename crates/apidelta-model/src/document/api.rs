//! The API document.

use super::endpoint::Endpoint;
use super::legacy::LegacyDocument;
use super::service::{ExporterConfiguration, ServiceInformation};
use crate::error::Error;
use crate::identifier::DeltaIdentifier;
use crate::types::{ReferenceKey, TypeDescriptor, TypesStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Serialized document format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentVersion {
    /// Legacy layout with `info` and `components`. Assumed when the version
    /// field is absent.
    V1,
    /// Current layout.
    V2,
}

impl DocumentVersion {
    pub const CURRENT: DocumentVersion = DocumentVersion::V2;

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentVersion::V1 => "1.0.0",
            DocumentVersion::V2 => "2.0.0",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw {
            "1.0.0" => Ok(DocumentVersion::V1),
            "2.0.0" => Ok(DocumentVersion::V2),
            other => Err(Error::UnsupportedDocumentVersion {
                version: other.to_string(),
            }),
        }
    }
}

/// Description of one version of a web service: metadata, endpoints and the
/// types they use.
///
/// Endpoints are kept with their types interned in the document's
/// [`TypesStore`]; [`ApiDocument::endpoints`] hands them out resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument {
    id: Uuid,
    service: ServiceInformation,
    endpoints: Vec<Endpoint>,
    types: TypesStore,
}

impl ApiDocument {
    /// Create an empty document with a fresh id.
    pub fn new(service: ServiceInformation) -> Self {
        Self {
            id: Uuid::new_v4(),
            service,
            endpoints: Vec::new(),
            types: TypesStore::new(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn service(&self) -> &ServiceInformation {
        &self.service
    }

    /// Add an endpoint, interning its types.
    pub fn add_endpoint(&mut self, endpoint: Endpoint) -> Result<(), Error> {
        if self
            .endpoints
            .iter()
            .any(|e| e.delta_identifier == endpoint.delta_identifier)
        {
            return Err(Error::DuplicateIdentifier {
                kind: "endpoint",
                identifier: endpoint.delta_identifier.to_string(),
            });
        }
        endpoint.validate()?;
        let endpoint = endpoint.reference(&mut self.types);
        self.endpoints.push(endpoint);
        Ok(())
    }

    /// Builder-style [`add_endpoint`](Self::add_endpoint).
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Result<Self, Error> {
        self.add_endpoint(endpoint)?;
        Ok(self)
    }

    /// Add an exporter configuration. At most one per exporter kind.
    pub fn add_exporter(&mut self, exporter: ExporterConfiguration) -> Result<(), Error> {
        self.service.add_exporter(exporter)
    }

    /// Endpoints with all type references resolved.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>, Error> {
        self.endpoints
            .iter()
            .map(|e| e.dereference(&self.types))
            .collect()
    }

    /// Endpoints as stored, with types referenced.
    pub fn referenced_endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Every stored composite type, fully constructed, in key order.
    pub fn models(&self) -> Result<Vec<TypeDescriptor>, Error> {
        self.types
            .keys()
            .map(|key| self.types.construct(&TypeDescriptor::reference(key.clone())))
            .collect()
    }

    pub fn types(&self) -> &TypesStore {
        &self.types
    }

    /// Check identifier uniqueness and that every reference resolves.
    pub fn validate(&self) -> Result<(), Error> {
        self.service.validate()?;

        let mut seen: HashSet<&DeltaIdentifier> = HashSet::new();
        for endpoint in &self.endpoints {
            if !seen.insert(&endpoint.delta_identifier) {
                return Err(Error::DuplicateIdentifier {
                    kind: "endpoint",
                    identifier: endpoint.delta_identifier.to_string(),
                });
            }
            endpoint.validate()?;
            endpoint.dereference(&self.types)?;
        }
        for key in self.types.keys() {
            self.types
                .construct(&TypeDescriptor::reference(ReferenceKey::clone(key)))?;
        }
        Ok(())
    }

    /// Decode a serialized document, upgrading legacy layouts.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))?;
        Self::from_value(value)
    }

    /// Decode a document from a JSON value, upgrading legacy layouts.
    pub fn from_value(mut value: Value) -> Result<Self, Error> {
        let object = value
            .as_object_mut()
            .ok_or_else(|| Error::Deserialization("document root must be an object".into()))?;

        let version = match object.remove("version") {
            None => DocumentVersion::V1,
            Some(Value::String(raw)) => DocumentVersion::parse(&raw)?,
            Some(other) => {
                return Err(Error::UnsupportedDocumentVersion {
                    version: other.to_string(),
                })
            }
        };

        let document = match version {
            DocumentVersion::V1 => {
                let legacy: LegacyDocument = serde_json::from_value(value)
                    .map_err(|e| Error::InvalidLegacyDocument(e.to_string()))?;
                debug!(
                    endpoints = legacy.endpoints.len(),
                    types = legacy.components.len(),
                    "upgrading legacy document"
                );
                ApiDocument {
                    id: legacy.id,
                    service: legacy.info.upgrade()?,
                    endpoints: legacy.endpoints.into_iter().map(|e| e.upgrade()).collect(),
                    types: legacy.components,
                }
            }
            DocumentVersion::V2 => serde_json::from_value(value)
                .map_err(|e| Error::Deserialization(e.to_string()))?,
        };

        document.validate()?;
        Ok(document)
    }

    /// Encode in the current layout.
    pub fn to_value(&self) -> Result<Value, Error> {
        let mut value =
            serde_json::to_value(self).map_err(|e| Error::Serialization(e.to_string()))?;
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "version".to_string(),
                Value::String(DocumentVersion::CURRENT.as_str().to_string()),
            );
        }
        Ok(value)
    }

    /// Pretty-printed JSON in the current layout.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(&self.to_value()?)
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}
