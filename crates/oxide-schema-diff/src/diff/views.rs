//! View strategy: drop and recreate whenever the query text changes.

use tracing::debug;

use crate::dialect::OwnedObject;
use crate::error::Result;
use crate::ident::eq_ignore_case;
use crate::options::IdentKind;
use crate::schema::View;
use crate::stage::{Stage, StageWriter};

use super::{DiffContext, SchemaPair};

/// Whether `old` must be dropped and recreated as `new`.
///
/// Query text is compared case-insensitively, without whitespace
/// normalization.
fn modified(ctx: &DiffContext<'_>, old: &View, new: &View) -> bool {
    let kind = ctx.dialect.kind();
    ctx.options.always_recreate_views
        || !eq_ignore_case(old.rendered_query(kind), new.rendered_query(kind))
}

pub(crate) fn drop(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let Some(old_schema) = pair.old else {
        return Ok(());
    };
    for old in &old_schema.views {
        let counterpart = pair.new.and_then(|s| s.get_view(&old.name));
        if counterpart.is_none_or(|new| modified(ctx, old, new)) {
            debug!(schema = %pair.name, view = %old.name, "dropping view");
            out.write_stage(Stage::Structure, &ctx.dialect.drop_view(pair.name, &old.name))?;
        }
    }
    Ok(())
}

pub(crate) fn create(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let Some(new_schema) = pair.new else {
        return Ok(());
    };
    for new in &new_schema.views {
        let counterpart = pair.old.and_then(|s| s.get_view(&new.name));
        match counterpart {
            Some(old) if !modified(ctx, old, new) => {
                if let Some(role) = ctx.changed_owner(old.owner.as_ref(), new.owner.as_ref()) {
                    let name = ctx.dialect.qualified(pair.name, &new.name, IdentKind::Object);
                    ctx.write_owner(out, Stage::Structure, OwnedObject::View, &name, role)?;
                }
            }
            _ => {
                debug!(schema = %pair.name, view = %new.name, "creating view");
                out.write_stage(Stage::Dependents, &ctx.dialect.create_view(pair.name, new))?;
                if let Some(role) = ctx.new_owner(new.owner.as_ref()) {
                    let name = ctx.dialect.qualified(pair.name, &new.name, IdentKind::Object);
                    ctx.write_owner(out, Stage::Dependents, OwnedObject::View, &name, role)?;
                }
            }
        }
    }
    Ok(())
}
