//! Upgrade of version 1 documents.
//!
//! Version 1 documents keep service metadata under `info`, the types store
//! under `components` and use older field names for endpoints and
//! parameters. The REST coding settings live directly in `info`.

use super::endpoint::{CommunicationalPattern, Endpoint, ErrorCode, Operation, HANDLER_NAME, OPERATION, PATH};
use super::parameter::{Parameter, ParameterKind};
use super::service::{
    DecoderConfiguration, EncoderConfiguration, ExporterConfiguration, HttpInformation,
    ServiceInformation,
};
use crate::error::Error;
use crate::identifier::DeltaIdentifier;
use crate::types::{TypeDescriptor, TypesStore};
use serde::Deserialize;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyDocument {
    pub id: Uuid,
    pub info: LegacyServiceInformation,
    #[serde(default)]
    pub endpoints: Vec<LegacyEndpoint>,
    #[serde(default)]
    pub components: TypesStore,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyServiceInformation {
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub server_path: Option<String>,
    #[serde(default)]
    pub encoder_configuration: EncoderConfiguration,
    #[serde(default)]
    pub decoder_configuration: DecoderConfiguration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyEndpoint {
    pub handler_name: String,
    #[serde(default)]
    pub delta_identifier: Option<DeltaIdentifier>,
    pub operation: Operation,
    pub absolute_path: String,
    #[serde(default)]
    pub parameters: Vec<LegacyParameter>,
    pub response: TypeDescriptor,
    #[serde(default)]
    pub errors: Vec<ErrorCode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyParameter {
    pub parameter_name: String,
    pub type_information: TypeDescriptor,
    #[serde(default)]
    pub has_default_value: bool,
    pub kind: ParameterKind,
}

/// Parse `scheme://host:port/...` into host information.
fn parse_server_path(raw: &str) -> Result<HttpInformation, Error> {
    let without_scheme = raw.split_once("://").map(|(_, rest)| rest).unwrap_or(raw);
    let authority = without_scheme.split('/').next().unwrap_or(without_scheme);
    match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                Error::InvalidLegacyDocument(format!("invalid port in server path '{raw}'"))
            })?;
            Ok(HttpInformation::new(host, port))
        }
        None if !authority.is_empty() => Ok(HttpInformation::new(authority, 80)),
        None => Err(Error::InvalidLegacyDocument(format!(
            "empty host in server path '{raw}'"
        ))),
    }
}

impl LegacyServiceInformation {
    pub fn upgrade(self) -> Result<ServiceInformation, Error> {
        let mut service = ServiceInformation::new(self.title, self.version);
        if let Some(path) = self.server_path.as_deref().filter(|p| !p.is_empty()) {
            service = service.with_http(parse_server_path(path)?);
        }
        service.add_exporter(ExporterConfiguration::rest(
            self.encoder_configuration,
            self.decoder_configuration,
        ))?;
        Ok(service)
    }
}

impl LegacyEndpoint {
    pub fn upgrade(self) -> Endpoint {
        let delta_identifier = self
            .delta_identifier
            .unwrap_or_else(|| DeltaIdentifier::new(self.handler_name.clone()));

        let mut identifiers = BTreeMap::new();
        identifiers.insert(HANDLER_NAME.to_string(), self.handler_name);
        identifiers.insert(OPERATION.to_string(), self.operation.as_str().to_string());
        identifiers.insert(PATH.to_string(), self.absolute_path);

        let parameters = self
            .parameters
            .into_iter()
            .map(|p| Parameter {
                name: p.parameter_name,
                type_: p.type_information,
                has_default_value: p.has_default_value,
                kind: p.kind,
            })
            .collect();

        Endpoint {
            delta_identifier,
            identifiers,
            communicational_pattern: CommunicationalPattern::RequestResponse,
            parameters,
            response: self.response,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_path() {
        let http = parse_server_path("http://localhost:8080/v1").unwrap();
        assert_eq!(http, HttpInformation::new("localhost", 8080));

        let http = parse_server_path("api.example.com").unwrap();
        assert_eq!(http, HttpInformation::new("api.example.com", 80));

        assert!(parse_server_path("http://host:port").is_err());
    }

    #[test]
    fn test_endpoint_upgrade() {
        let legacy: LegacyEndpoint = serde_json::from_value(serde_json::json!({
            "handlerName": "getUser",
            "operation": "read",
            "absolutePath": "/users/{id}",
            "parameters": [{
                "parameterName": "id",
                "typeInformation": {"scalar": "Int"},
                "kind": "path"
            }],
            "response": {"scalar": "String"}
        }))
        .unwrap();

        let endpoint = legacy.upgrade();
        assert_eq!(endpoint.delta_identifier.as_str(), "getUser");
        assert_eq!(endpoint.path(), Some("/users/{id}"));
        assert_eq!(endpoint.parameters[0].name, "id");
        assert_eq!(endpoint.parameters[0].kind, ParameterKind::Path);
    }
}
