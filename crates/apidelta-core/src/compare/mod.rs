//! Comparators.
//!
//! Each comparator walks one level of two document versions and appends
//! changes to a [`MigrationContext`]. The document comparator runs service
//! metadata first, then models, then endpoints. Matched model and endpoint
//! pairs are diffed on worker threads when the configuration asks for more
//! than one worker.

mod endpoint;
pub mod matching;
mod model;
mod parameter;
mod service;

pub use matching::{match_elements, Matching};

use crate::change::{Change, ChangeElement, ChangeKind, TypeConversion};
use crate::context::{ChangeBuffer, MigrationContext};
use crate::convert::{types_match, Conversion};
use crate::error::Result;
use apidelta_model::{ApiDocument, Endpoint, Necessity, TypeDescriptor};
use parking_lot::Mutex;
use tracing::debug;

/// Compare two documents, appending every change to `ctx`.
pub fn compare_documents(
    lhs: &ApiDocument,
    rhs: &ApiDocument,
    ctx: &mut MigrationContext<'_>,
) -> Result<()> {
    service::compare(lhs.service(), rhs.service(), ctx)?;

    let lhs_models = lhs.models()?;
    let rhs_models = rhs.models()?;
    let model_pairs = model::compare_sets(&lhs_models, &rhs_models, ctx)?;

    let lhs_endpoints = lhs.endpoints()?;
    let rhs_endpoints = rhs.endpoints()?;
    let endpoint_pairs = endpoint::compare_sets(&lhs_endpoints, &rhs_endpoints, ctx)?;

    let work: Vec<Work<'_>> = model_pairs
        .into_iter()
        .map(|(l, r)| Work::Model(l, r))
        .chain(endpoint_pairs.into_iter().map(|(l, r)| Work::Endpoint(l, r)))
        .collect();
    run(&work, ctx)
}

/// A matched pair awaiting its diff.
enum Work<'d> {
    Model(&'d TypeDescriptor, &'d TypeDescriptor),
    Endpoint(&'d Endpoint, &'d Endpoint),
}

impl Work<'_> {
    fn run(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        match self {
            Work::Model(l, r) => model::compare_pair(l, r, ctx),
            Work::Endpoint(l, r) => endpoint::compare_pair(l, r, ctx),
        }
    }
}

fn run(work: &[Work<'_>], ctx: &mut MigrationContext<'_>) -> Result<()> {
    let workers = ctx.config().parallelism.min(work.len());
    if workers <= 1 {
        return work.iter().try_for_each(|item| item.run(ctx));
    }

    let chunk_size = (work.len() + workers - 1) / workers;
    debug!(workers, pairs = work.len(), "diffing matched pairs in parallel");

    let results: Mutex<Vec<(usize, Result<ChangeBuffer>)>> = Mutex::new(Vec::with_capacity(workers));
    std::thread::scope(|scope| {
        for (index, chunk) in work.chunks(chunk_size).enumerate() {
            let mut worker = ctx.fork();
            let results = &results;
            scope.spawn(move || {
                let outcome = chunk
                    .iter()
                    .try_for_each(|item| item.run(&mut worker))
                    .map(|()| worker.take_buffer());
                results.lock().push((index, outcome));
            });
        }
    });

    let mut results = results.into_inner();
    results.sort_by_key(|(index, _)| *index);
    for (_, outcome) in results {
        ctx.absorb(outcome?);
    }
    Ok(())
}

/// Diff a matched property or parameter by type and necessity.
///
/// Equal unwrapped types only report a necessity change, with a default
/// when the element becomes required. Anything else goes through
/// conversion synthesis.
fn compare_typed(
    element: ChangeElement,
    lhs: (&TypeDescriptor, Necessity),
    rhs: (&TypeDescriptor, Necessity),
    wrap: fn(TypeConversion) -> ChangeKind,
    ctx: &mut MigrationContext<'_>,
) -> Result<()> {
    let (lhs_type, lhs_necessity) = lhs;
    let (rhs_type, rhs_necessity) = rhs;
    let threshold = ctx.config().type_name_threshold;

    if types_match(lhs_type.unwrapped(), rhs_type.unwrapped(), threshold) {
        if lhs_necessity != rhs_necessity {
            let value = if rhs_necessity.is_required() {
                Some(ctx.store_rhs_default(rhs_type.unwrapped())?)
            } else {
                None
            };
            ctx.push(Change::necessity(element, lhs_necessity, rhs_necessity, value));
        }
        return Ok(());
    }
    convert_types(element, lhs_type, rhs_type, wrap, ctx);
    Ok(())
}

/// Record a type change with synthesized forward and backward procedures,
/// or an unsupported change if no forward procedure exists.
fn convert_types(
    element: ChangeElement,
    lhs_type: &TypeDescriptor,
    rhs_type: &TypeDescriptor,
    wrap: fn(TypeConversion) -> ChangeKind,
    ctx: &mut MigrationContext<'_>,
) {
    let (script, caveat) = match ctx.forward_synthesizer().synthesize(lhs_type, rhs_type) {
        Conversion::Procedure { script, caveat } => (script, caveat),
        Conversion::Unsupported { reason } => {
            debug!(from = %lhs_type.type_name(), to = %rhs_type.type_name(), %reason, "unsupported type change");
            ctx.push(Change::unsupported(
                element,
                format!(
                    "type change from {} to {} cannot be bridged: {reason}",
                    lhs_type.type_name(),
                    rhs_type.type_name()
                ),
            ));
            return;
        }
    };
    let forward_migration = ctx.store_script(script);

    let (backward_migration, backward_caveat) =
        match ctx.backward_synthesizer().synthesize(rhs_type, lhs_type) {
            Conversion::Procedure { script, caveat } => (Some(ctx.store_script(script)), caveat),
            Conversion::Unsupported { .. } => (None, None),
        };

    let conversion_warning = match (caveat, backward_caveat) {
        (Some(f), Some(b)) => Some(format!("{f}; backward: {b}")),
        (Some(f), None) => Some(f),
        (None, Some(b)) => Some(format!("backward: {b}")),
        (None, None) => None,
    };

    ctx.push(Change::type_change(
        element,
        wrap(TypeConversion {
            from: lhs_type.referenced(),
            to: rhs_type.referenced(),
            forward_migration,
            backward_migration,
            conversion_warning,
        }),
    ));
}
