//! Model comparison: objects and enums.

use super::matching::match_elements;
use super::{compare_typed, Matching};
use crate::change::{Change, ChangeElement, ChangeKind, EnumTarget, ObjectTarget};
use crate::context::MigrationContext;
use crate::error::Result;
use crate::similarity::type_names_match;
use apidelta_model::{DeltaIdentifiable, EnumCase, TypeDescriptor, TypeProperty};
use serde_json::Value;
use tracing::debug;

fn model_element(model: &TypeDescriptor) -> ChangeElement {
    let id = model.delta_identifier();
    if model.is_enum() {
        ChangeElement::Enum {
            id,
            target: EnumTarget::Itself,
        }
    } else {
        ChangeElement::Object {
            id,
            target: ObjectTarget::Itself,
        }
    }
}

/// Match the models of both documents. Returns matched and renamed pairs.
///
/// Model additions and deletions are not breaking on their own: every use of
/// a model surfaces as a property, parameter or response change.
pub(super) fn compare_sets<'d>(
    lhs: &'d [TypeDescriptor],
    rhs: &'d [TypeDescriptor],
    ctx: &mut MigrationContext<'_>,
) -> Result<Vec<(&'d TypeDescriptor, &'d TypeDescriptor)>> {
    let threshold = ctx.config().type_name_threshold;
    let matching = match_elements(lhs, rhs, ctx.config().rename_threshold, "model", |l, r| {
        type_names_match(&l.type_name(), &r.type_name(), threshold)
    })?;

    for &(l, r, score) in &matching.renamed {
        debug!(from = %l.type_name(), to = %r.type_name(), similarity = score, "model rename detected");
        ctx.push(Change::rename(
            model_element(l),
            l.delta_identifier(),
            r.delta_identifier(),
            Some(score),
        ));
    }
    for &removed in &matching.removed {
        ctx.push(Change::deletion(
            model_element(removed),
            removed.delta_identifier(),
            None,
            false,
        ));
    }
    for &added in &matching.added {
        ctx.push(Change::addition(
            model_element(added),
            serde_json::to_value(added.members_referenced())?,
            None,
            false,
        ));
    }

    Ok(matching.pairs().collect())
}

/// Diff one matched model pair.
pub(super) fn compare_pair(
    lhs: &TypeDescriptor,
    rhs: &TypeDescriptor,
    ctx: &mut MigrationContext<'_>,
) -> Result<()> {
    match (lhs, rhs) {
        (TypeDescriptor::Object { .. }, TypeDescriptor::Object { .. }) => compare_objects(lhs, rhs, ctx),
        (TypeDescriptor::Enum { .. }, TypeDescriptor::Enum { .. }) => compare_enums(lhs, rhs, ctx),
        _ => {
            ctx.push(Change::unsupported(
                model_element(lhs),
                format!(
                    "{} changed from {} to {}",
                    lhs.type_name(),
                    kind_label(lhs),
                    kind_label(rhs)
                ),
            ));
            Ok(())
        }
    }
}

fn kind_label(model: &TypeDescriptor) -> &'static str {
    if model.is_enum() {
        "enum"
    } else {
        "object"
    }
}

fn compare_objects(
    lhs: &TypeDescriptor,
    rhs: &TypeDescriptor,
    ctx: &mut MigrationContext<'_>,
) -> Result<()> {
    let id = lhs.delta_identifier();
    let element = |property: &TypeProperty| ChangeElement::Object {
        id: id.clone(),
        target: ObjectTarget::Property(property.delta_identifier()),
    };

    let threshold = ctx.config().type_name_threshold;
    let matching: Matching<'_, TypeProperty> = match_elements(
        lhs.properties(),
        rhs.properties(),
        ctx.config().rename_threshold,
        "property",
        |l, r| type_names_match(&l.type_.type_name(), &r.type_.type_name(), threshold),
    )?;

    for &(l, r, score) in &matching.renamed {
        debug!(model = %id, from = %l.name, to = %r.name, similarity = score, "property rename detected");
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
        let payload = TypeProperty {
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
        compare_typed(
            element(l),
            (&l.type_, l.necessity()),
            (&r.type_, r.necessity()),
            ChangeKind::PropertyChange,
            ctx,
        )?;
    }
    Ok(())
}

fn compare_enums(
    lhs: &TypeDescriptor,
    rhs: &TypeDescriptor,
    ctx: &mut MigrationContext<'_>,
) -> Result<()> {
    let id = lhs.delta_identifier();
    let element = |target: EnumTarget| ChangeElement::Enum {
        id: id.clone(),
        target,
    };

    let (lhs_raw, rhs_raw) = match (lhs.raw_value_type(), rhs.raw_value_type()) {
        (Some(l), Some(r)) => (l, r),
        _ => return Ok(()),
    };
    if lhs_raw != rhs_raw {
        ctx.push(Change::value_update(
            element(EnumTarget::RawValueType),
            Value::from(lhs_raw.name()),
            Value::from(rhs_raw.name()),
            true,
            false,
        ));
    }

    let matching: Matching<'_, EnumCase> =
        match_elements(lhs.cases(), rhs.cases(), ctx.config().rename_threshold, "case", |_, _| true)?;

    for &(l, r, score) in &matching.renamed {
        ctx.push(Change::rename(
            element(EnumTarget::Case(l.delta_identifier())),
            l.delta_identifier(),
            r.delta_identifier(),
            Some(score),
        ));
    }

    // Stored values may still carry a removed case.
    let fallback = match rhs.cases().first() {
        Some(first) if !matching.removed.is_empty() => Some(ctx.store_value(first.raw_json(rhs_raw))),
        _ => None,
    };
    for &removed in &matching.removed {
        ctx.push(Change::deletion(
            element(EnumTarget::Case(removed.delta_identifier())),
            removed.delta_identifier(),
            fallback,
            true,
        ));
    }

    for &added in &matching.added {
        ctx.push(Change::addition(
            element(EnumTarget::Case(added.delta_identifier())),
            serde_json::to_value(added)?,
            None,
            false,
        ));
    }

    for (l, r) in matching.pairs() {
        if l.raw_value != r.raw_value {
            ctx.push(Change::value_update(
                element(EnumTarget::Case(l.delta_identifier())),
                Value::from(l.raw_value.as_str()),
                Value::from(r.raw_value.as_str()),
                true,
                true,
            ));
        }
    }
    Ok(())
}
