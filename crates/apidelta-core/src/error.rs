//! Migration error types.

use thiserror::Error;

/// Errors that abort guide generation.
///
/// Changes that cannot be bridged are not errors; they are recorded in the
/// guide as unsupported, non-solvable changes.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The input is internally inconsistent: a dangling type reference,
    /// duplicate identifiers, or a guide referring to a missing script or value.
    #[error("structural inconsistency: {message}")]
    StructuralInconsistency {
        /// Description of the inconsistency.
        message: String,
    },

    /// No terminating default value exists for a type.
    #[error("cannot synthesize a value for '{type_name}': {reason}")]
    SynthesisFailure {
        /// The type that failed.
        type_name: String,
        /// Why synthesis failed.
        reason: String,
    },

    /// A previous guide was produced for a different base document.
    #[error("document mismatch: expected {expected}, found {found}")]
    DocumentVersionMismatch {
        /// Id the guide was produced for.
        expected: String,
        /// Id of the document at hand.
        found: String,
    },

    /// The serialized input declares an unknown format version.
    #[error("unsupported document version '{version}'")]
    UnsupportedDocumentVersion {
        /// The declared version.
        version: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl MigrationError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        MigrationError::StructuralInconsistency {
            message: message.into(),
        }
    }

    pub(crate) fn synthesis(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        MigrationError::SynthesisFailure {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

impl From<apidelta_model::Error> for MigrationError {
    fn from(err: apidelta_model::Error) -> Self {
        use apidelta_model::Error as ModelError;
        match err {
            ModelError::UnsupportedDocumentVersion { version } => {
                MigrationError::UnsupportedDocumentVersion { version }
            }
            ModelError::Serialization(msg)
            | ModelError::Deserialization(msg)
            | ModelError::InvalidLegacyDocument(msg) => MigrationError::Serialization(msg),
            structural => MigrationError::structural(structural.to_string()),
        }
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        MigrationError::Serialization(err.to_string())
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;
