//! Model error types.

use thiserror::Error;

/// Errors raised while building, resolving or decoding API documents.
#[derive(Debug, Error)]
pub enum Error {
    /// A reference points at a key that the types store does not contain.
    #[error("dangling type reference: '{key}' is not registered in the types store")]
    DanglingReference {
        /// The missing reference key.
        key: String,
    },

    /// Two entities of the same kind share one identifier within a document.
    #[error("duplicate {kind} identifier '{identifier}'")]
    DuplicateIdentifier {
        /// Kind of entity (endpoint, parameter, exporter, ...).
        kind: &'static str,
        /// The colliding identifier.
        identifier: String,
    },

    /// The serialized document declares a format version this crate cannot read.
    #[error("unsupported document version '{version}'")]
    UnsupportedDocumentVersion {
        /// The declared version string.
        version: String,
    },

    /// A legacy document could not be upgraded.
    #[error("invalid legacy document: {0}")]
    InvalidLegacyDocument(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Whether the error indicates a corrupt document rather than bad input framing.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::DanglingReference { .. } | Error::DuplicateIdentifier { .. }
        )
    }
}
