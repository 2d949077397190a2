//! Endpoint comparison.

use super::matching::match_elements;
use super::{convert_types, parameter};
use crate::change::{Change, ChangeElement, ChangeKind, EndpointTarget};
use crate::context::MigrationContext;
use crate::convert::types_match;
use crate::error::Result;
use apidelta_model::document::HANDLER_NAME;
use apidelta_model::{DeltaIdentifiable, Endpoint};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::debug;

fn element(endpoint: &Endpoint, target: EndpointTarget) -> ChangeElement {
    ChangeElement::Endpoint {
        id: endpoint.delta_identifier(),
        target,
    }
}

/// Match the endpoints of both documents. Returns matched and renamed pairs.
///
/// Renames are only detected between endpoints serving the same operation
/// on the same path.
pub(super) fn compare_sets<'d>(
    lhs: &'d [Endpoint],
    rhs: &'d [Endpoint],
    ctx: &mut MigrationContext<'_>,
) -> Result<Vec<(&'d Endpoint, &'d Endpoint)>> {
    let matching = match_elements(lhs, rhs, ctx.config().rename_threshold, "endpoint", |l, r| {
        l.operation() == r.operation() && l.path() == r.path()
    })?;

    for &(l, r, score) in &matching.renamed {
        debug!(from = %l.delta_identifier, to = %r.delta_identifier, similarity = score, "endpoint rename detected");
        ctx.push(Change::rename(
            element(l, EndpointTarget::Itself),
            l.delta_identifier(),
            r.delta_identifier(),
            Some(score),
        ));
    }
    for &removed in &matching.removed {
        ctx.push(Change::deletion(
            element(removed, EndpointTarget::Itself),
            removed.delta_identifier(),
            None,
            true,
        ));
    }
    for &added in &matching.added {
        ctx.push(Change::addition(
            element(added, EndpointTarget::Itself),
            summary(added),
            None,
            false,
        ));
    }

    Ok(matching.pairs().collect())
}

/// Compact description of an added endpoint.
fn summary(endpoint: &Endpoint) -> Value {
    json!({
        "deltaIdentifier": endpoint.delta_identifier,
        "identifiers": endpoint.identifiers,
        "communicationalPattern": endpoint.communicational_pattern,
        "parameters": endpoint
            .parameters
            .iter()
            .map(|p| json!({ "name": p.name, "kind": p.kind, "type": p.type_.referenced() }))
            .collect::<Vec<_>>(),
        "response": endpoint.response.referenced(),
    })
}

/// Diff one matched endpoint pair. Changes are keyed by the old identifier.
pub(super) fn compare_pair(lhs: &Endpoint, rhs: &Endpoint, ctx: &mut MigrationContext<'_>) -> Result<()> {
    compare_identifiers(lhs, rhs, ctx);

    if lhs.communicational_pattern != rhs.communicational_pattern {
        ctx.push(Change::value_update(
            element(lhs, EndpointTarget::CommunicationalPattern),
            Value::from(lhs.communicational_pattern.as_str()),
            Value::from(rhs.communicational_pattern.as_str()),
            true,
            false,
        ));
    }

    parameter::compare(&lhs.delta_identifier, &lhs.parameters, &rhs.parameters, ctx)?;

    if !types_match(&lhs.response, &rhs.response, ctx.config().type_name_threshold) {
        convert_types(
            element(lhs, EndpointTarget::Response),
            &lhs.response,
            &rhs.response,
            ChangeKind::ResponseChange,
            ctx,
        );
    }

    if lhs.errors != rhs.errors {
        ctx.push(Change::value_update(
            element(lhs, EndpointTarget::Errors),
            serde_json::to_value(&lhs.errors)?,
            serde_json::to_value(&rhs.errors)?,
            false,
            true,
        ));
    }
    Ok(())
}

/// Identifier changes break generated clients, except for the handler name
/// which only names the server-side implementation.
fn compare_identifiers(lhs: &Endpoint, rhs: &Endpoint, ctx: &mut MigrationContext<'_>) {
    let keys: BTreeSet<&String> = lhs.identifiers.keys().chain(rhs.identifiers.keys()).collect();
    for key in keys {
        let target = element(lhs, EndpointTarget::Identifier(key.clone()));
        match (lhs.identifiers.get(key), rhs.identifiers.get(key)) {
            (Some(l), Some(r)) if l != r => ctx.push(Change::value_update(
                target,
                Value::from(l.as_str()),
                Value::from(r.as_str()),
                key != HANDLER_NAME,
                true,
            )),
            (Some(_), None) => ctx.push(Change::deletion(
                target,
                key.as_str().into(),
                None,
                false,
            )),
            (None, Some(r)) => ctx.push(Change::addition(target, Value::from(r.as_str()), None, false)),
            _ => {}
        }
    }
}
