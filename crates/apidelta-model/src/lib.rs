//! apidelta data model.
//!
//! This crate defines the schema model compared by `apidelta-core`: type
//! descriptors and their deduplicating store, delta identifiers, and the API
//! document describing one version of a web service.
//!
//! # Modules
//!
//! - [`types`] - Type descriptors, properties, enum cases and the types store
//! - [`document`] - API document, endpoints, parameters and service metadata
//! - [`identifier`] - Delta identifiers used for cross-version matching
//! - [`error`] - Model error types
//!
//! # Serialization
//!
//! Documents serialize to JSON with `serde`. Reading accepts both the current
//! layout and the legacy version 1 layout; writing always produces the
//! current layout.
//!
//! ```ignore
//! use apidelta_model::ApiDocument;
//!
//! let document = ApiDocument::from_json(&json)?;
//! for endpoint in document.endpoints()? {
//!     println!("{}", endpoint.delta_identifier);
//! }
//! ```

pub mod document;
pub mod error;
pub mod identifier;
pub mod types;

pub use document::{
    ApiDocument, CommunicationalPattern, DataEncodingStrategy, DateEncodingStrategy,
    DecoderConfiguration, DocumentVersion, EncoderConfiguration, Endpoint, ErrorCode,
    ExporterConfiguration, ExporterKind, HttpInformation, Operation, Parameter, ParameterKind,
    ServiceInformation,
};
pub use error::Error;
pub use identifier::{DeltaIdentifiable, DeltaIdentifier};
pub use types::{
    Context, EnumCase, Necessity, PrimitiveType, ReferenceKey, RootKind, TypeDescriptor,
    TypeName, TypeProperty, TypesStore,
};
