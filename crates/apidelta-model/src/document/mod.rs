//! API documents: service metadata, endpoints and their parameters.

mod api;
mod endpoint;
mod legacy;
mod parameter;
mod service;

pub use api::{ApiDocument, DocumentVersion};
pub use endpoint::{
    CommunicationalPattern, Endpoint, ErrorCode, Operation, HANDLER_NAME, OPERATION, PATH,
};
pub use parameter::{Parameter, ParameterKind};
pub use service::{
    DataEncodingStrategy, DateEncodingStrategy, DecoderConfiguration, EncoderConfiguration,
    ExporterConfiguration, ExporterKind, HttpInformation, ServiceInformation,
};
