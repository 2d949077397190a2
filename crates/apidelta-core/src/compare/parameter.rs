//! Parameter comparison of one matched endpoint pair.

use super::compare_typed;
use super::matching::match_elements;
use crate::change::{Change, ChangeElement, ChangeKind, EndpointTarget};
use crate::context::MigrationContext;
use crate::error::Result;
use apidelta_model::{DeltaIdentifiable, DeltaIdentifier, Parameter};
use serde_json::Value;
use tracing::debug;

pub(super) fn compare(
    endpoint: &DeltaIdentifier,
    lhs: &[Parameter],
    rhs: &[Parameter],
    ctx: &mut MigrationContext<'_>,
) -> Result<()> {
    let element = |parameter: &Parameter| ChangeElement::Endpoint {
        id: endpoint.clone(),
        target: EndpointTarget::Parameter(parameter.delta_identifier()),
    };

    // Any two parameters may be a rename of each other; the kind and type
    // are diffed afterwards.
    let matching = match_elements(lhs, rhs, ctx.config().rename_threshold, "parameter", |_, _| true)?;

    for &(l, r, score) in &matching.renamed {
        debug!(endpoint = %endpoint, from = %l.name, to = %r.name, similarity = score, "parameter rename detected");
        ctx.push(Change::rename(
            element(l),
            l.delta_identifier(),
            r.delta_identifier(),
            Some(score),
        ));
    }

    for &removed in &matching.removed {
        let required = removed.necessity().is_required();
        let fallback = if required {
            Some(ctx.store_lhs_default(&removed.type_)?)
        } else {
            None
        };
        ctx.push(Change::deletion(
            element(removed),
            removed.delta_identifier(),
            fallback,
            required,
        ));
    }

    for &added in &matching.added {
        let required = added.necessity().is_required();
        let default = if required {
            Some(ctx.store_rhs_default(&added.type_)?)
        } else {
            None
        };
        let payload = Parameter {
            type_: added.type_.referenced(),
            ..added.clone()
        };
        ctx.push(Change::addition(
            element(added),
            serde_json::to_value(payload)?,
            default,
            required,
        ));
    }

    for (l, r) in matching.pairs() {
        if l.kind != r.kind {
            ctx.push(Change::value_update(
                element(l),
                Value::from(l.kind.as_str()),
                Value::from(r.kind.as_str()),
                true,
                true,
            ));
        }
        compare_typed(
            element(l),
            (&l.type_, l.necessity()),
            (&r.type_, r.necessity()),
            ChangeKind::ParameterChange,
            ctx,
        )?;
    }
    Ok(())
}
