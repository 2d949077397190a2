//! apidelta core - API diffing and migration guide generation.
//!
//! Compares two versions of an [`ApiDocument`](apidelta_model::ApiDocument)
//! and produces a [`MigrationGuide`]: every change classified as breaking or
//! not and as solvable or not, with default values and conversion scripts
//! that let generated clients bridge the difference.
//!
//! # Change classes
//!
//! | Class | breaking | solvable | Examples |
//! |-------|----------|----------|----------|
//! | Additive | no | yes | Optional property, new endpoint |
//! | Bridged | yes | yes | Required property with default, `Int` to `String` |
//! | Manual | yes | no | Enum turned into an object, raw value type change |
//!
//! # Example
//!
//! ```ignore
//! use apidelta_core::{CompareConfig, MigrationGuide};
//!
//! let guide = MigrationGuide::generate(&old, &new, &CompareConfig::default())?;
//! for change in guide.manual_changes() {
//!     println!("{:?}", change.element);
//! }
//! std::fs::write("migration_guide.json", guide.to_json()?)?;
//! ```

pub mod change;
pub mod compare;
pub mod config;
pub mod context;
pub mod convert;
pub mod defaults;
pub mod error;
pub mod guide;
pub mod script;
pub mod similarity;

pub use change::{
    Change, ChangeCategory, ChangeElement, ChangeKind, EndpointTarget, EnumTarget, ObjectTarget,
    ServiceTarget, TypeConversion,
};
pub use compare::compare_documents;
pub use config::CompareConfig;
pub use context::{ChangeSet, MigrationContext};
pub use convert::{types_match, Conversion, ConversionSynthesizer};
pub use defaults::{value_conforms, DefaultValueSynthesizer};
pub use error::{MigrationError, Result};
pub use guide::{GuideMetadata, MigrationGuide};
pub use script::{Script, ScriptEngine, ScriptError, ScriptRunner};
pub use similarity::{similarity, type_names_match};

/// Re-export of the data model.
pub use apidelta_model as model;
