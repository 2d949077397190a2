//! Comparison settings.

use apidelta_model::EncoderConfiguration;

/// Settings for guide generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareConfig {
    /// Minimum similarity for two differently identified entities to be
    /// considered a rename.
    pub rename_threshold: f64,
    /// Minimum similarity for two differently named types to be considered
    /// the same type.
    pub type_name_threshold: f64,
    /// Number of workers diffing matched models and endpoints.
    pub parallelism: usize,
    /// Whether downstream generators should also receive provider-side
    /// (server) migration support.
    pub include_provider_support: bool,
    /// Encoder settings for synthesized values. Falls back to the REST
    /// exporter of the base document, then to the default encoder.
    pub encoder_override: Option<EncoderConfiguration>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            rename_threshold: 0.5,
            type_name_threshold: 0.75,
            parallelism: 1,
            include_provider_support: false,
            encoder_override: None,
        }
    }
}

impl CompareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rename threshold, clamped to `[0, 1]`.
    pub fn with_rename_threshold(mut self, threshold: f64) -> Self {
        self.rename_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the type name threshold, clamped to `[0, 1]`.
    pub fn with_type_name_threshold(mut self, threshold: f64) -> Self {
        self.type_name_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the worker count. Zero is treated as one.
    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = workers.max(1);
        self
    }

    pub fn with_provider_support(mut self, enabled: bool) -> Self {
        self.include_provider_support = enabled;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderConfiguration) -> Self {
        self.encoder_override = Some(encoder);
        self
    }
}
