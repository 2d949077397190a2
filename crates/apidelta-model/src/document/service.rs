//! Service metadata and exporter configurations.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How `Date` values are encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateEncodingStrategy {
    /// Native encoding of the client platform: seconds since 2001-01-01.
    #[default]
    DeferredToDate,
    SecondsSince1970,
    MillisecondsSince1970,
    /// ISO-8601 formatted string.
    Iso8601,
}

/// How `Data` values are encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataEncodingStrategy {
    /// Native encoding: an array of bytes.
    DeferredToData,
    /// Base64 string.
    #[default]
    Base64,
}

/// Encoder settings of a REST exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderConfiguration {
    pub date_encoding_strategy: DateEncodingStrategy,
    pub data_encoding_strategy: DataEncodingStrategy,
}

impl EncoderConfiguration {
    pub fn new(date: DateEncodingStrategy, data: DataEncodingStrategy) -> Self {
        Self {
            date_encoding_strategy: date,
            data_encoding_strategy: data,
        }
    }
}

/// Decoder settings of a REST exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoderConfiguration {
    pub date_decoding_strategy: DateEncodingStrategy,
    pub data_decoding_strategy: DataEncodingStrategy,
}

impl DecoderConfiguration {
    pub fn new(date: DateEncodingStrategy, data: DataEncodingStrategy) -> Self {
        Self {
            date_decoding_strategy: date,
            data_decoding_strategy: data,
        }
    }
}

/// Kind of an exporter configuration. A service has at most one per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExporterKind {
    Rest,
    Grpc,
}

impl fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExporterKind::Rest => f.write_str("rest"),
            ExporterKind::Grpc => f.write_str("grpc"),
        }
    }
}

/// Exporter-specific configuration of a web service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExporterConfiguration {
    /// REST/JSON exporter.
    Rest {
        encoder: EncoderConfiguration,
        decoder: DecoderConfiguration,
    },
    /// gRPC exporter.
    Grpc {
        #[serde(rename = "packageName")]
        package_name: String,
        #[serde(rename = "serviceName")]
        service_name: String,
        #[serde(rename = "pathPrefix")]
        path_prefix: String,
        #[serde(rename = "reflectionEnabled")]
        reflection_enabled: bool,
    },
}

impl ExporterConfiguration {
    /// REST exporter with the given coding settings.
    pub fn rest(encoder: EncoderConfiguration, decoder: DecoderConfiguration) -> Self {
        ExporterConfiguration::Rest { encoder, decoder }
    }

    /// gRPC exporter with reflection disabled and no path prefix.
    pub fn grpc(package_name: impl Into<String>, service_name: impl Into<String>) -> Self {
        ExporterConfiguration::Grpc {
            package_name: package_name.into(),
            service_name: service_name.into(),
            path_prefix: String::new(),
            reflection_enabled: false,
        }
    }

    pub fn kind(&self) -> ExporterKind {
        match self {
            ExporterConfiguration::Rest { .. } => ExporterKind::Rest,
            ExporterConfiguration::Grpc { .. } => ExporterKind::Grpc,
        }
    }
}

/// Host information of an HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpInformation {
    pub hostname: String,
    pub port: u16,
}

impl HttpInformation {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }
}

/// Metadata of the described web service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInformation {
    /// Service name.
    pub name: String,
    /// Service version string, e.g. `v2`.
    pub version: String,
    /// Where the service is reachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpInformation>,
    /// Exporter configurations.
    #[serde(default)]
    exporters: Vec<ExporterConfiguration>,
}

impl ServiceInformation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            http: None,
            exporters: Vec::new(),
        }
    }

    pub fn with_http(mut self, http: HttpInformation) -> Self {
        self.http = Some(http);
        self
    }

    /// Add an exporter configuration. Fails if one of that kind is present.
    pub fn add_exporter(&mut self, exporter: ExporterConfiguration) -> Result<(), Error> {
        let kind = exporter.kind();
        if self.exporter(kind).is_some() {
            return Err(Error::DuplicateIdentifier {
                kind: "exporter",
                identifier: kind.to_string(),
            });
        }
        self.exporters.push(exporter);
        Ok(())
    }

    pub fn exporters(&self) -> &[ExporterConfiguration] {
        &self.exporters
    }

    /// The exporter configuration of the given kind.
    pub fn exporter(&self, kind: ExporterKind) -> Option<&ExporterConfiguration> {
        self.exporters.iter().find(|e| e.kind() == kind)
    }

    /// Encoder settings of the REST exporter, if one is configured.
    pub fn rest_encoder(&self) -> Option<EncoderConfiguration> {
        match self.exporter(ExporterKind::Rest) {
            Some(ExporterConfiguration::Rest { encoder, .. }) => Some(*encoder),
            _ => None,
        }
    }

    /// Check that exporter kinds are unique.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        for (i, exporter) in self.exporters.iter().enumerate() {
            if self.exporters[..i].iter().any(|e| e.kind() == exporter.kind()) {
                return Err(Error::DuplicateIdentifier {
                    kind: "exporter",
                    identifier: exporter.kind().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_exporter_per_kind() {
        let mut service = ServiceInformation::new("Shop", "v1");
        service
            .add_exporter(ExporterConfiguration::rest(
                EncoderConfiguration::default(),
                DecoderConfiguration::default(),
            ))
            .unwrap();
        service
            .add_exporter(ExporterConfiguration::grpc("shop", "ShopService"))
            .unwrap();

        let result = service.add_exporter(ExporterConfiguration::rest(
            EncoderConfiguration::default(),
            DecoderConfiguration::default(),
        ));
        match result {
            Err(Error::DuplicateIdentifier { kind, identifier }) => {
                assert_eq!(kind, "exporter");
                assert_eq!(identifier, "rest");
            }
            _ => panic!("Expected DuplicateIdentifier"),
        }
        assert_eq!(service.exporters().len(), 2);
    }

    #[test]
    fn test_rest_encoder_lookup() {
        let encoder = EncoderConfiguration::new(
            DateEncodingStrategy::Iso8601,
            DataEncodingStrategy::DeferredToData,
        );
        let mut service = ServiceInformation::new("Shop", "v1");
        assert!(service.rest_encoder().is_none());

        service
            .add_exporter(ExporterConfiguration::rest(encoder, DecoderConfiguration::default()))
            .unwrap();
        assert_eq!(service.rest_encoder(), Some(encoder));
    }

    #[test]
    fn test_exporter_serde() {
        let json = serde_json::to_value(ExporterConfiguration::grpc("shop", "Shop")).unwrap();
        assert_eq!(json["type"], "grpc");
        assert_eq!(json["packageName"], "shop");
        assert_eq!(json["reflectionEnabled"], false);
    }
}
