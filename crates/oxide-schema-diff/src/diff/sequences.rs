//! Standalone sequence strategy.

use tracing::debug;

use crate::dialect::OwnedObject;
use crate::error::Result;
use crate::options::IdentKind;
use crate::stage::{Stage, StageWriter};

use super::{DiffContext, SchemaPair};

pub(crate) fn drop(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    for sequence in pair.sequences.dropped() {
        debug!(schema = %pair.name, sequence = %sequence.name, "dropping sequence");
        out.write_stage(
            Stage::Constraints,
            &ctx.dialect.drop_sequence(pair.name, &sequence.name),
        )?;
    }
    Ok(())
}

pub(crate) fn create(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    for entry in pair.sequences.entries() {
        match entry.old {
            None => {
                debug!(schema = %pair.name, sequence = %entry.new.name, "creating sequence");
                out.write_all(
                    Stage::Structure,
                    &ctx.dialect.create_sequence(pair.name, entry.new),
                )?;
                if let Some(role) = ctx.new_owner(entry.new.owner.as_ref()) {
                    let name = ctx
                        .dialect
                        .qualified(pair.name, &entry.new.name, IdentKind::Object);
                    ctx.write_owner(out, Stage::Structure, OwnedObject::Sequence, &name, role)?;
                }
            }
            Some(old) if entry.renamed => {
                debug!(
                    schema = %pair.name,
                    from = %old.name,
                    to = %entry.new.name,
                    "renaming sequence"
                );
                out.write_stage(
                    Stage::Structure,
                    &ctx.dialect
                        .rename_sequence(pair.name, &old.name, &entry.new.name),
                )?;
            }
            Some(_) => {}
        }
    }
    Ok(())
}

pub(crate) fn alter(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    for (old, new) in pair.sequences.matched() {
        if old.parameters_differ(new) {
            debug!(schema = %pair.name, sequence = %new.name, "altering sequence");
            out.write_all(
                Stage::Structure,
                &ctx.dialect.alter_sequence(pair.name, old, new),
            )?;
        }
        if let Some(role) = ctx.changed_owner(old.owner.as_ref(), new.owner.as_ref()) {
            let name = ctx
                .dialect
                .qualified(pair.name, &new.name, IdentKind::Object);
            ctx.write_owner(out, Stage::Structure, OwnedObject::Sequence, &name, role)?;
        }
    }
    Ok(())
}
