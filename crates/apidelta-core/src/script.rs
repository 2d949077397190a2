//! Conversion scripts and the engine contract.
//!
//! Scripts are JavaScript functions of the shape
//! `function convert(input) { ... return JSON.stringify(...) }`. They take
//! JSON-encoded arguments and return a JSON-encoded result. Executing them is
//! left to a [`ScriptEngine`] supplied by the caller.

use crate::defaults::{value_conforms, DefaultValueSynthesizer};
use crate::error::{MigrationError, Result};
use apidelta_model::{EncoderConfiguration, TypeDescriptor, TypesStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Source text of a conversion script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script(String);

impl Script {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn source(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure reported by a script engine.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script raised or could not be compiled.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    /// The script did not return a string.
    #[error("script returned no result")]
    NoResult,
}

/// Executes conversion scripts.
pub trait ScriptEngine {
    /// Run `script`'s `convert` function with JSON-encoded `args`.
    fn evaluate(&self, script: &Script, args: &[String]) -> std::result::Result<String, ScriptError>;
}

/// Applies conversion scripts with a safe fallback.
pub struct ScriptRunner<'a, E: ScriptEngine> {
    engine: &'a E,
    store: &'a TypesStore,
    encoder: EncoderConfiguration,
}

impl<'a, E: ScriptEngine> ScriptRunner<'a, E> {
    /// `store` resolves references in target types.
    pub fn new(engine: &'a E, store: &'a TypesStore, encoder: EncoderConfiguration) -> Self {
        Self {
            engine,
            store,
            encoder,
        }
    }

    /// Convert `input` into a value of `target`.
    ///
    /// Falls back to the default value of `target` if the script fails,
    /// returns malformed JSON, or returns a value that does not conform.
    pub fn convert(&self, script: &Script, input: &Value, target: &TypeDescriptor) -> Result<Value> {
        let arg = serde_json::to_string(input)?;
        match self.engine.evaluate(script, &[arg]) {
            Ok(output) => match serde_json::from_str::<Value>(&output) {
                Ok(value) if value_conforms(&value, target, self.store) => return Ok(value),
                Ok(_) => warn!(target_type = %target.type_name(), "script output does not conform, using default"),
                Err(e) => warn!(error = %e, "script returned malformed JSON, using default"),
            },
            Err(e) => warn!(error = %e, "script failed, using default"),
        }
        self.fallback(target)
    }

    fn fallback(&self, target: &TypeDescriptor) -> Result<Value> {
        DefaultValueSynthesizer::new(self.store, self.encoder)
            .synthesize(target)
            .map_err(|e| match e {
                MigrationError::SynthesisFailure { type_name, reason } => {
                    MigrationError::SynthesisFailure {
                        type_name,
                        reason: format!("no fallback for failed conversion: {reason}"),
                    }
                }
                other => other,
            })
    }
}
