//! Service metadata comparison.

use crate::change::{Change, ChangeElement, ServiceTarget};
use crate::context::MigrationContext;
use crate::error::Result;
use apidelta_model::{DeltaIdentifier, ExporterKind, ServiceInformation};
use serde_json::Value;

fn element(target: ServiceTarget) -> ChangeElement {
    ChangeElement::Service { target }
}

pub(super) fn compare(
    lhs: &ServiceInformation,
    rhs: &ServiceInformation,
    ctx: &mut MigrationContext<'_>,
) -> Result<()> {
    if lhs.name != rhs.name {
        ctx.push(Change::value_update(
            element(ServiceTarget::Name),
            Value::from(lhs.name.as_str()),
            Value::from(rhs.name.as_str()),
            false,
            true,
        ));
    }
    if lhs.version != rhs.version {
        ctx.push(Change::value_update(
            element(ServiceTarget::Version),
            Value::from(lhs.version.as_str()),
            Value::from(rhs.version.as_str()),
            false,
            true,
        ));
    }
    if lhs.http != rhs.http {
        ctx.push(Change::value_update(
            element(ServiceTarget::Http),
            serde_json::to_value(&lhs.http)?,
            serde_json::to_value(&rhs.http)?,
            false,
            true,
        ));
    }

    // Dropping an exporter cuts clients of that protocol off.
    for kind in [ExporterKind::Rest, ExporterKind::Grpc] {
        let target = element(ServiceTarget::Exporter(kind));
        match (lhs.exporter(kind), rhs.exporter(kind)) {
            (Some(l), Some(r)) if l != r => ctx.push(Change::value_update(
                target,
                serde_json::to_value(l)?,
                serde_json::to_value(r)?,
                false,
                true,
            )),
            (Some(_), None) => ctx.push(Change::deletion(
                target,
                DeltaIdentifier::new(kind.to_string()),
                None,
                true,
            )),
            (None, Some(r)) => ctx.push(Change::addition(target, serde_json::to_value(r)?, None, false)),
            _ => {}
        }
    }
    Ok(())
}
