//! Endpoints of a web service.

use super::parameter::Parameter;
use crate::error::Error;
use crate::identifier::{DeltaIdentifiable, DeltaIdentifier};
use crate::types::{TypeDescriptor, TypesStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier key of the handler name.
pub const HANDLER_NAME: &str = "handlerName";
/// Identifier key of the operation.
pub const OPERATION: &str = "operation";
/// Identifier key of the path.
pub const PATH: &str = "path";

/// CRUD-style operation of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "create" => Some(Operation::Create),
            "read" => Some(Operation::Read),
            "update" => Some(Operation::Update),
            "delete" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message exchange pattern of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommunicationalPattern {
    #[default]
    RequestResponse,
    ClientSideStream,
    ServiceSideStream,
    BidirectionalStream,
}

impl CommunicationalPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationalPattern::RequestResponse => "requestResponse",
            CommunicationalPattern::ClientSideStream => "clientSideStream",
            CommunicationalPattern::ServiceSideStream => "serviceSideStream",
            CommunicationalPattern::BidirectionalStream => "bidirectionalStream",
        }
    }
}

/// A documented error response.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    pub code: u16,
    pub message: String,
}

impl ErrorCode {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A callable endpoint.
///
/// `identifiers` holds the exporter-facing identity of the endpoint (handler
/// name, operation, path and any exporter-specific additions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub delta_identifier: DeltaIdentifier,
    pub identifiers: BTreeMap<String, String>,
    #[serde(default)]
    pub communicational_pattern: CommunicationalPattern,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub response: TypeDescriptor,
    #[serde(default)]
    pub errors: Vec<ErrorCode>,
}

impl Endpoint {
    /// Create an endpoint identified by its handler name.
    pub fn new(
        handler_name: impl Into<String>,
        operation: Operation,
        path: impl Into<String>,
        response: TypeDescriptor,
    ) -> Self {
        let handler_name = handler_name.into();
        let mut identifiers = BTreeMap::new();
        identifiers.insert(HANDLER_NAME.to_string(), handler_name.clone());
        identifiers.insert(OPERATION.to_string(), operation.as_str().to_string());
        identifiers.insert(PATH.to_string(), path.into());

        Self {
            delta_identifier: DeltaIdentifier::new(handler_name),
            identifiers,
            communicational_pattern: CommunicationalPattern::RequestResponse,
            parameters: Vec::new(),
            response,
            errors: Vec::new(),
        }
    }

    /// Override the delta identifier.
    pub fn with_delta_identifier(mut self, id: impl Into<DeltaIdentifier>) -> Self {
        self.delta_identifier = id.into();
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_error(mut self, code: u16, message: impl Into<String>) -> Self {
        self.errors.push(ErrorCode::new(code, message));
        self
    }

    pub fn with_pattern(mut self, pattern: CommunicationalPattern) -> Self {
        self.communicational_pattern = pattern;
        self
    }

    /// Add or replace an exporter-specific identifier.
    pub fn with_identifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.insert(key.into(), value.into());
        self
    }

    pub fn identifier(&self, key: &str) -> Option<&str> {
        self.identifiers.get(key).map(String::as_str)
    }

    pub fn handler_name(&self) -> Option<&str> {
        self.identifier(HANDLER_NAME)
    }

    pub fn path(&self) -> Option<&str> {
        self.identifier(PATH)
    }

    pub fn operation(&self) -> Option<Operation> {
        self.identifier(OPERATION).and_then(Operation::parse)
    }

    /// Intern parameter and response types in `store`.
    pub fn reference(self, store: &mut TypesStore) -> Self {
        let parameters = self
            .parameters
            .into_iter()
            .map(|parameter| Parameter {
                type_: store.store(parameter.type_),
                ..parameter
            })
            .collect();
        Self {
            parameters,
            response: store.store(self.response),
            ..self
        }
    }

    /// Resolve parameter and response types against `store`.
    pub fn dereference(&self, store: &TypesStore) -> Result<Self, Error> {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| {
                Ok(Parameter {
                    type_: store.construct(&parameter.type_)?,
                    ..parameter.clone()
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self {
            parameters,
            response: store.construct(&self.response)?,
            ..self.clone()
        })
    }

    /// Check that parameter names are unique.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        for (i, parameter) in self.parameters.iter().enumerate() {
            if self.parameters[..i].iter().any(|p| p.name == parameter.name) {
                return Err(Error::DuplicateIdentifier {
                    kind: "parameter",
                    identifier: format!("{}.{}", self.delta_identifier, parameter.name),
                });
            }
        }
        Ok(())
    }
}

impl DeltaIdentifiable for Endpoint {
    fn delta_identifier(&self) -> DeltaIdentifier {
        self.delta_identifier.clone()
    }
}
