//! The migration guide.
//!
//! A guide records every change between two document versions together with
//! the conversion scripts and JSON values the changes refer to by id. It is
//! the artifact downstream code generators consume.

use crate::change::Change;
use crate::compare::compare_documents;
use crate::config::CompareConfig;
use crate::context::{ChangeSet, MigrationContext};
use crate::error::{MigrationError, Result};
use crate::script::Script;
use apidelta_model::{ApiDocument, EncoderConfiguration};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Facts about the two documents a guide was produced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideMetadata {
    /// Service version of the base document.
    pub from_version: String,
    /// Service version of the target document.
    pub to_version: String,
    /// blake3 hash (hex) of the base document's canonical JSON.
    pub lhs_fingerprint: String,
    /// blake3 hash (hex) of the target document's canonical JSON.
    pub rhs_fingerprint: String,
    pub breaking_count: usize,
    pub manual_count: usize,
    /// Whether generators should emit provider-side support as well.
    pub provider_support: bool,
}

/// Serialized, replayable record of all changes between two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationGuide {
    /// Human readable one-line summary.
    pub summary: String,
    /// Id of the base document.
    pub id: Uuid,
    pub metadata: GuideMetadata,
    pub service_changes: Vec<Change>,
    pub model_changes: Vec<Change>,
    pub endpoint_changes: Vec<Change>,
    /// Conversion scripts by id.
    pub scripts: BTreeMap<u32, Script>,
    /// Default and fallback values by id.
    pub json_values: BTreeMap<u32, Value>,
}

impl MigrationGuide {
    /// Compare `lhs` (the base version) with `rhs` (the new version).
    #[instrument(skip_all, fields(from = %lhs.service().version, to = %rhs.service().version))]
    pub fn generate(lhs: &ApiDocument, rhs: &ApiDocument, config: &CompareConfig) -> Result<Self> {
        let encoder = config
            .encoder_override
            .or_else(|| lhs.service().rest_encoder())
            .unwrap_or_else(EncoderConfiguration::default);

        let mut ctx = MigrationContext::new(config, encoder, lhs.types(), rhs.types());
        compare_documents(lhs, rhs, &mut ctx)?;
        let guide = Self::assemble(lhs, rhs, config, ctx.finish())?;

        info!(
            changes = guide.changes().count(),
            breaking = guide.metadata.breaking_count,
            manual = guide.metadata.manual_count,
            scripts = guide.scripts.len(),
            "Migration guide generated"
        );
        Ok(guide)
    }

    /// Like [`generate`](Self::generate), but starts from a guide produced
    /// earlier for the same base document. The previous guide is returned
    /// unchanged when nothing differs.
    pub fn generate_with_previous(
        lhs: &ApiDocument,
        rhs: &ApiDocument,
        config: &CompareConfig,
        previous: &MigrationGuide,
    ) -> Result<Self> {
        previous.ensure_applies_to(lhs)?;
        let guide = Self::generate(lhs, rhs, config)?;
        if guide == *previous {
            debug!(id = %previous.id, "previous migration guide is up to date");
            return Ok(previous.clone());
        }
        Ok(guide)
    }

    fn assemble(
        lhs: &ApiDocument,
        rhs: &ApiDocument,
        config: &CompareConfig,
        set: ChangeSet,
    ) -> Result<Self> {
        let ChangeSet {
            service_changes,
            model_changes,
            endpoint_changes,
            scripts,
            json_values,
        } = set;

        let all = || service_changes.iter().chain(&model_changes).chain(&endpoint_changes);
        let total = all().count();
        let breaking_count = all().filter(|c| c.breaking).count();
        let manual_count = all().filter(|c| c.requires_manual_action()).count();

        let from_version = lhs.service().version.clone();
        let to_version = rhs.service().version.clone();
        let summary = format!(
            "{} {from_version} to {to_version}: {total} changes, {breaking_count} breaking, {manual_count} requiring manual action",
            lhs.service().name,
        );

        Ok(Self {
            summary,
            id: lhs.id(),
            metadata: GuideMetadata {
                from_version,
                to_version,
                lhs_fingerprint: fingerprint(lhs)?,
                rhs_fingerprint: fingerprint(rhs)?,
                breaking_count,
                manual_count,
                provider_support: config.include_provider_support,
            },
            service_changes,
            model_changes,
            endpoint_changes,
            scripts,
            json_values,
        })
    }

    /// Fail unless this guide was produced for `document` as its base.
    pub fn ensure_applies_to(&self, document: &ApiDocument) -> Result<()> {
        if self.id != document.id() {
            return Err(MigrationError::DocumentVersionMismatch {
                expected: self.id.to_string(),
                found: document.id().to_string(),
            });
        }
        Ok(())
    }

    /// Check that every script and value id a change refers to exists.
    pub fn validate(&self) -> Result<()> {
        for change in self.changes() {
            if let Some(id) = change.kind.script_ids().into_iter().find(|id| !self.scripts.contains_key(id)) {
                return Err(MigrationError::structural(format!(
                    "change at {} refers to missing script {id}",
                    change.element.path().join(".")
                )));
            }
            if let Some(id) = change
                .kind
                .value_ids()
                .into_iter()
                .find(|id| !self.json_values.contains_key(id))
            {
                return Err(MigrationError::structural(format!(
                    "change at {} refers to missing value {id}",
                    change.element.path().join(".")
                )));
            }
        }
        Ok(())
    }

    /// All changes: service, then models, then endpoints.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.service_changes
            .iter()
            .chain(&self.model_changes)
            .chain(&self.endpoint_changes)
    }

    pub fn breaking_changes(&self) -> impl Iterator<Item = &Change> {
        self.changes().filter(|c| c.breaking)
    }

    /// Changes a developer has to resolve by hand.
    pub fn manual_changes(&self) -> impl Iterator<Item = &Change> {
        self.changes().filter(|c| c.requires_manual_action())
    }

    pub fn is_empty(&self) -> bool {
        self.changes().next().is_none()
    }

    pub fn script(&self, id: u32) -> Option<&Script> {
        self.scripts.get(&id)
    }

    pub fn json_value(&self, id: u32) -> Option<&Value> {
        self.json_values.get(&id)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode and validate a serialized guide.
    pub fn from_json(json: &str) -> Result<Self> {
        let guide: MigrationGuide = serde_json::from_str(json)?;
        guide.validate()?;
        Ok(guide)
    }
}

fn fingerprint(document: &ApiDocument) -> Result<String> {
    let bytes = serde_json::to_vec(&document.to_value()?)?;
    Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidelta_model::{Endpoint, Operation, PrimitiveType, ServiceInformation, TypeDescriptor};

    fn document(version: &str, response: PrimitiveType) -> ApiDocument {
        ApiDocument::new(ServiceInformation::new("Shop", version))
            .with_endpoint(Endpoint::new(
                "count",
                Operation::Read,
                "/count",
                TypeDescriptor::scalar(response),
            ))
            .unwrap()
    }

    #[test]
    fn test_identical_documents_give_empty_guide() {
        let doc = document("v1", PrimitiveType::Int);
        let guide = MigrationGuide::generate(&doc, &doc, &CompareConfig::default()).unwrap();

        assert!(guide.is_empty());
        assert_eq!(guide.id, doc.id());
        assert_eq!(guide.metadata.lhs_fingerprint, guide.metadata.rhs_fingerprint);
        assert_eq!(guide.metadata.lhs_fingerprint.len(), 64);
    }

    #[test]
    fn test_guide_json_round_trip() {
        let lhs = document("v1", PrimitiveType::Int);
        let rhs = document("v2", PrimitiveType::String);
        let guide = MigrationGuide::generate(&lhs, &rhs, &CompareConfig::default()).unwrap();
        assert_eq!(guide.metadata.breaking_count, 1);
        assert_eq!(guide.scripts.len(), 2);

        let json = guide.to_json().unwrap();
        let back = MigrationGuide::from_json(&json).unwrap();
        assert_eq!(back, guide);
    }

    #[test]
    fn test_dangling_script_id_rejected() {
        let lhs = document("v1", PrimitiveType::Int);
        let rhs = document("v2", PrimitiveType::String);
        let mut guide = MigrationGuide::generate(&lhs, &rhs, &CompareConfig::default()).unwrap();
        guide.scripts.clear();

        match guide.validate() {
            Err(MigrationError::StructuralInconsistency { message }) => {
                assert!(message.contains("missing script"))
            }
            _ => panic!("Expected StructuralInconsistency"),
        }
    }

    #[test]
    fn test_previous_guide_for_other_document_rejected() {
        let lhs = document("v1", PrimitiveType::Int);
        let rhs = document("v2", PrimitiveType::Int);
        let config = CompareConfig::default();
        let previous = MigrationGuide::generate(&rhs, &lhs, &config).unwrap();

        match MigrationGuide::generate_with_previous(&lhs, &rhs, &config, &previous) {
            Err(MigrationError::DocumentVersionMismatch { expected, found }) => {
                assert_eq!(expected, rhs.id().to_string());
                assert_eq!(found, lhs.id().to_string());
            }
            _ => panic!("Expected DocumentVersionMismatch"),
        }
    }

    #[test]
    fn test_previous_guide_reused_when_unchanged() {
        let lhs = document("v1", PrimitiveType::Int);
        let rhs = document("v2", PrimitiveType::String);
        let config = CompareConfig::default();
        let previous = MigrationGuide::generate(&lhs, &rhs, &config).unwrap();

        let guide = MigrationGuide::generate_with_previous(&lhs, &rhs, &config, &previous).unwrap();
        assert_eq!(guide, previous);
    }
}
