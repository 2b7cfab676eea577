//! Enumerated type strategy.
//!
//! A type whose label list changed is redefined in four steps, all in the
//! structure stage: dependent columns are released from the type, the old
//! labels are removed, the new labels are inserted and the columns are tied
//! back to the type.

use tracing::debug;

use crate::dialect::ColumnType;
use crate::error::Result;
use crate::ident::Ident;
use crate::options::IdentKind;
use crate::schema::{EnumType, Schema};
use crate::stage::{Stage, StageWriter};

use super::{DiffContext, SchemaPair};

pub(crate) fn drop(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let Some(old_schema) = pair.old else {
        return Ok(());
    };
    for ty in &old_schema.types {
        if pair.new.and_then(|s| s.get_type(&ty.name)).is_none() {
            debug!(schema = %pair.name, ty = %ty.name, "dropping type");
            out.write_stage(Stage::Constraints, &ctx.dialect.drop_enum_type(pair.name, ty))?;
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
    for ty in &new_schema.types {
        if pair.old.and_then(|s| s.get_type(&ty.name)).is_none() {
            debug!(schema = %pair.name, ty = %ty.name, "creating type");
            out.write_all(Stage::Structure, &ctx.dialect.create_enum_type(pair.name, ty))?;
        }
    }
    Ok(())
}

pub(crate) fn alter(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let (Some(old_schema), Some(new_schema)) = (pair.old, pair.new) else {
        return Ok(());
    };
    for new in &new_schema.types {
        let Some(old) = old_schema.get_type(&new.name) else {
            continue;
        };
        if old.values == new.values {
            continue;
        }
        debug!(
            schema = %pair.name,
            ty = %new.name,
            old = ?old.values,
            new = ?new.values,
            "redefining type"
        );
        let dependents = dependent_columns(pair, new);
        redefine(ctx, pair.name, new, &dependents, out)?;
    }
    Ok(())
}

/// `(table, column)` names, as they stand when the structure stage reaches
/// the type, of every column typed with `ty`.
///
/// Tables are renamed and created earlier in the structure stage, so table
/// names are the new ones. Columns of surviving tables are renamed later, so
/// their names are the old ones.
fn dependent_columns<'p>(
    pair: &'p SchemaPair<'_>,
    ty: &EnumType,
) -> Vec<(&'p Ident, &'p Ident)> {
    let is_typed = |schema: &Schema, type_name: &str| {
        ColumnType::resolve(schema, type_name)
            .enum_type()
            .is_some_and(|t| t.name == ty.name)
    };
    let mut columns = Vec::new();
    if let Some(new_schema) = pair.new {
        for table in pair.tables.created() {
            for column in &table.columns {
                if is_typed(new_schema, &column.type_name) {
                    columns.push((&table.name, &column.name));
                }
            }
        }
    }
    if let Some(old_schema) = pair.old {
        for table_pair in &pair.table_pairs {
            for column in &table_pair.old.columns {
                if is_typed(old_schema, &column.type_name) {
                    columns.push((&table_pair.new.name, &column.name));
                }
            }
        }
        // Dropped tables only go away in the constraints stage.
        for table in pair.tables.dropped() {
            for column in &table.columns {
                if is_typed(old_schema, &column.type_name) {
                    columns.push((&table.name, &column.name));
                }
            }
        }
    }
    columns
}

fn redefine(
    ctx: &DiffContext<'_>,
    schema: &Ident,
    ty: &EnumType,
    dependents: &[(&Ident, &Ident)],
    out: &mut dyn StageWriter,
) -> Result<()> {
    let dialect = ctx.dialect;
    let qualified = dialect.qualified(schema, &ty.name, IdentKind::Object);
    let step = |n: u8, what: &str| {
        format!("-- type {qualified} definition migration ({n}/4): {what}")
    };

    out.write_stage(Stage::Structure, &step(1, "release dependent columns"))?;
    for (table, column) in dependents {
        out.write_stage(
            Stage::Structure,
            &dialect.enum_dependency_release(schema, table, column, ty),
        )?;
    }

    out.write_stage(Stage::Structure, &step(2, "delete type values"))?;
    out.write_stage(Stage::Structure, &dialect.enum_values_delete(schema, ty))?;

    out.write_stage(Stage::Structure, &step(3, "insert type values"))?;
    if let Some(sql) = dialect.enum_values_insert(schema, ty) {
        out.write_stage(Stage::Structure, &sql)?;
    }

    out.write_stage(Stage::Structure, &step(4, "restore dependent columns"))?;
    for (table, column) in dependents {
        out.write_stage(
            Stage::Structure,
            &dialect.enum_dependency_restore(schema, table, column, ty),
        )?;
    }
    Ok(())
}
