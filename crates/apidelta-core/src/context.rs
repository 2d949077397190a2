//! Migration context: shared state of one comparison run.
//!
//! Comparators append changes, scripts and JSON values to the context's
//! [`ChangeBuffer`]. Workers diffing in parallel use forked contexts whose
//! buffers are absorbed afterwards. [`MigrationContext::finish`] orders the
//! changes and renumbers ids, so the result does not depend on how the work
//! was split.

use crate::change::{Change, ChangeCategory};
use crate::config::CompareConfig;
use crate::convert::ConversionSynthesizer;
use crate::defaults::DefaultValueSynthesizer;
use crate::error::Result;
use crate::script::Script;
use apidelta_model::{EncoderConfiguration, TypeDescriptor, TypesStore};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Changes plus the scripts and values they refer to.
#[derive(Debug, Clone, Default)]
pub struct ChangeBuffer {
    changes: Vec<Change>,
    scripts: Vec<Script>,
    values: Vec<Value>,
}

impl ChangeBuffer {
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn store_script(&mut self, script: Script) -> u32 {
        if let Some(i) = self.scripts.iter().position(|s| *s == script) {
            return i as u32;
        }
        self.scripts.push(script);
        (self.scripts.len() - 1) as u32
    }

    fn store_value(&mut self, value: Value) -> u32 {
        if let Some(i) = self.values.iter().position(|v| *v == value) {
            return i as u32;
        }
        self.values.push(value);
        (self.values.len() - 1) as u32
    }
}

/// Ordered output of a finished comparison.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub service_changes: Vec<Change>,
    pub model_changes: Vec<Change>,
    pub endpoint_changes: Vec<Change>,
    pub scripts: BTreeMap<u32, Script>,
    pub json_values: BTreeMap<u32, Value>,
}

/// State shared by the comparators of one run.
pub struct MigrationContext<'a> {
    config: &'a CompareConfig,
    encoder: EncoderConfiguration,
    lhs_types: &'a TypesStore,
    rhs_types: &'a TypesStore,
    buffer: ChangeBuffer,
}

impl<'a> MigrationContext<'a> {
    pub fn new(
        config: &'a CompareConfig,
        encoder: EncoderConfiguration,
        lhs_types: &'a TypesStore,
        rhs_types: &'a TypesStore,
    ) -> Self {
        Self {
            config,
            encoder,
            lhs_types,
            rhs_types,
            buffer: ChangeBuffer::default(),
        }
    }

    pub fn config(&self) -> &'a CompareConfig {
        self.config
    }

    pub fn encoder(&self) -> EncoderConfiguration {
        self.encoder
    }

    pub fn lhs_types(&self) -> &'a TypesStore {
        self.lhs_types
    }

    pub fn rhs_types(&self) -> &'a TypesStore {
        self.rhs_types
    }

    /// A context over the same inputs with an empty buffer.
    pub fn fork(&self) -> MigrationContext<'a> {
        MigrationContext::new(self.config, self.encoder, self.lhs_types, self.rhs_types)
    }

    /// Take over the changes of a forked context, re-storing its scripts and
    /// values under this context's ids.
    pub fn absorb(&mut self, other: ChangeBuffer) {
        let ChangeBuffer {
            changes,
            scripts,
            values,
        } = other;
        let script_ids: Vec<u32> = scripts
            .into_iter()
            .map(|s| self.buffer.store_script(s))
            .collect();
        let value_ids: Vec<u32> = values
            .into_iter()
            .map(|v| self.buffer.store_value(v))
            .collect();

        for mut change in changes {
            change.kind.remap_ids(
                |id| script_ids[id as usize],
                |id| value_ids[id as usize],
            );
            self.buffer.changes.push(change);
        }
    }

    /// The buffer, leaving an empty one behind.
    pub fn take_buffer(&mut self) -> ChangeBuffer {
        std::mem::take(&mut self.buffer)
    }

    pub fn changes(&self) -> &[Change] {
        self.buffer.changes()
    }

    pub fn push(&mut self, change: Change) {
        self.buffer.changes.push(change);
    }

    pub fn store_script(&mut self, script: Script) -> u32 {
        self.buffer.store_script(script)
    }

    pub fn store_value(&mut self, value: Value) -> u32 {
        self.buffer.store_value(value)
    }

    /// Store the default value of a type from the new document.
    pub fn store_rhs_default(&mut self, descriptor: &TypeDescriptor) -> Result<u32> {
        let value = DefaultValueSynthesizer::new(self.rhs_types, self.encoder).synthesize(descriptor)?;
        Ok(self.store_value(value))
    }

    /// Store the default value of a type from the old document.
    pub fn store_lhs_default(&mut self, descriptor: &TypeDescriptor) -> Result<u32> {
        let value = DefaultValueSynthesizer::new(self.lhs_types, self.encoder).synthesize(descriptor)?;
        Ok(self.store_value(value))
    }

    /// Synthesizer converting old values into new ones.
    pub fn forward_synthesizer(&self) -> ConversionSynthesizer<'a> {
        ConversionSynthesizer::new(self.lhs_types, self.rhs_types, self.config, self.encoder)
    }

    /// Synthesizer converting new values into old ones.
    pub fn backward_synthesizer(&self) -> ConversionSynthesizer<'a> {
        ConversionSynthesizer::new(self.rhs_types, self.lhs_types, self.config, self.encoder)
    }

    /// Order changes and renumber ids by first appearance.
    ///
    /// Changes are sorted by category, element path and kind. Scripts and
    /// values no change refers to are dropped.
    pub fn finish(self) -> ChangeSet {
        let ChangeBuffer {
            mut changes,
            scripts,
            values,
        } = self.buffer;
        changes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut script_map: HashMap<u32, u32> = HashMap::new();
        let mut value_map: HashMap<u32, u32> = HashMap::new();
        let mut out = ChangeSet::default();

        for mut change in changes {
            change.kind.remap_ids(
                |id| {
                    let next = script_map.len() as u32;
                    *script_map.entry(id).or_insert_with(|| {
                        if let Some(script) = scripts.get(id as usize) {
                            out.scripts.insert(next, script.clone());
                        }
                        next
                    })
                },
                |id| {
                    let next = value_map.len() as u32;
                    *value_map.entry(id).or_insert_with(|| {
                        if let Some(value) = values.get(id as usize) {
                            out.json_values.insert(next, value.clone());
                        }
                        next
                    })
                },
            );
            match change.element.category() {
                ChangeCategory::Service => out.service_changes.push(change),
                ChangeCategory::Model => out.model_changes.push(change),
                ChangeCategory::Endpoint => out.endpoint_changes.push(change),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeElement, ObjectTarget};
    use apidelta_model::Necessity;

    fn element(property: &str) -> ChangeElement {
        ChangeElement::Object {
            id: "User".into(),
            target: ObjectTarget::Property(property.into()),
        }
    }

    #[test]
    fn test_values_are_deduplicated() {
        let config = CompareConfig::default();
        let store = TypesStore::new();
        let mut ctx = MigrationContext::new(&config, EncoderConfiguration::default(), &store, &store);

        let a = ctx.store_value(Value::from(0));
        let b = ctx.store_value(Value::from(false));
        let c = ctx.store_value(Value::from(0));
        assert_eq!(a, c);
        assert_ne!(a, b);
    }

    #[test]
    fn test_finish_sorts_and_renumbers() {
        let config = CompareConfig::default();
        let store = TypesStore::new();
        let mut ctx = MigrationContext::new(&config, EncoderConfiguration::default(), &store, &store);

        let unused = ctx.store_value(Value::from("unused"));
        let zero = ctx.store_value(Value::from(0));
        let falsy = ctx.store_value(Value::from(false));
        assert_eq!(unused, 0);

        ctx.push(Change::addition(element("c"), Value::Null, Some(falsy), true));
        ctx.push(Change::necessity(element("b"), Necessity::Optional, Necessity::Required, Some(zero)));

        let set = ctx.finish();
        assert_eq!(set.model_changes.len(), 2);
        assert_eq!(set.model_changes[0].element, element("b"));
        assert_eq!(set.model_changes[0].kind.value_ids(), vec![0]);
        assert_eq!(set.model_changes[1].kind.value_ids(), vec![1]);
        assert_eq!(set.json_values.len(), 2);
        assert_eq!(set.json_values[&0], Value::from(0));
        assert_eq!(set.json_values[&1], Value::from(false));
    }

    #[test]
    fn test_absorb_remaps_worker_ids() {
        let config = CompareConfig::default();
        let store = TypesStore::new();
        let mut parent = MigrationContext::new(&config, EncoderConfiguration::default(), &store, &store);
        parent.store_value(Value::from("parent"));

        let mut worker = parent.fork();
        let id = worker.store_value(Value::from(7));
        assert_eq!(id, 0);
        worker.push(Change::deletion(element("x"), "x".into(), Some(id), true));

        parent.absorb(worker.take_buffer());
        assert_eq!(parent.changes()[0].kind.value_ids(), vec![1]);
    }
}
