//! Endpoint parameters.

use crate::identifier::{DeltaIdentifiable, DeltaIdentifier};
use crate::types::{Necessity, TypeDescriptor};
use serde::{Deserialize, Serialize};

/// Where a parameter travels in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Query string parameter.
    Lightweight,
    /// Request body.
    Content,
    /// Path segment.
    Path,
    /// HTTP header.
    Header,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::Lightweight => "lightweight",
            ParameterKind::Content => "content",
            ParameterKind::Path => "path",
            ParameterKind::Header => "header",
        }
    }
}

/// An input parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: TypeDescriptor,
    #[serde(default)]
    pub has_default_value: bool,
    pub kind: ParameterKind,
}

impl Parameter {
    /// Create a parameter without a default value.
    pub fn new(name: impl Into<String>, type_: TypeDescriptor, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            type_,
            has_default_value: false,
            kind,
        }
    }

    pub fn with_default_value(mut self) -> Self {
        self.has_default_value = true;
        self
    }

    /// Optional if the type is optional or a default exists, required otherwise.
    pub fn necessity(&self) -> Necessity {
        if self.type_.is_optional() || self.has_default_value {
            Necessity::Optional
        } else {
            Necessity::Required
        }
    }
}

impl DeltaIdentifiable for Parameter {
    fn delta_identifier(&self) -> DeltaIdentifier {
        DeltaIdentifier::new(self.name.clone())
    }
}
