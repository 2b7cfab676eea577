//! Table and column strategy.
//!
//! Table creates and renames go to the structure stage; dropped tables and
//! columns wait for the constraints stage. Column changes are sorted by
//! whether they can fail on existing rows: relaxing changes run in the
//! structure stage, while NOT NULL tightening runs in the constraints stage
//! once the data stage has backfilled NULL rows.

use tracing::debug;

use crate::dialect::{
    AlterAction, ColumnDef, ColumnDelta, ColumnPosition, ColumnType, OwnedObject,
};
use crate::error::Result;
use crate::ident::Ident;
use crate::schema::{Column, Schema, Table};
use crate::stage::{Stage, StageWriter};

use super::{DiffContext, SchemaPair, TablePair};

pub(crate) fn drop(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let dialect = ctx.dialect;
    for old in pair.tables.old() {
        match pair.tables.successor(old) {
            None => {
                debug!(schema = %pair.name, table = %old.name, "dropping table");
                out.write_stage(Stage::Constraints, &dialect.drop_table(pair.name, &old.name))?;
            }
            Some(entry) if entry.renamed => {
                let comment = format!(
                    "-- DROP TABLE {} omitted: new table {} indicates it is its replacement",
                    dialect.table_name(pair.name, &old.name),
                    dialect.table_name(pair.name, &entry.new.name)
                );
                out.write_stage(Stage::Constraints, &comment)?;
            }
            Some(_) => {}
        }
    }

    let Some(old_schema) = pair.old else {
        return Ok(());
    };
    for table_pair in &pair.table_pairs {
        drop_columns(ctx, pair.name, old_schema, table_pair, out)?;
    }
    Ok(())
}

fn drop_columns(
    ctx: &DiffContext<'_>,
    schema: &Ident,
    old_schema: &Schema,
    table_pair: &TablePair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let table = &table_pair.new.name;
    let mut actions = Vec::new();
    for column in table_pair.columns.dropped() {
        debug!(schema = %schema, table = %table, column = %column.name, "dropping column");
        let ty = ColumnType::resolve(old_schema, &column.type_name);
        if ty.enum_type().is_some() {
            if let Some(sql) = ctx.dialect.enum_constraint_drop(schema, table, &column.name) {
                out.write_stage(Stage::Constraints, &sql)?;
            }
        }
        actions.push(AlterAction::DropColumn {
            column: column.clone(),
        });
    }
    out.write_all(
        Stage::Constraints,
        &ctx.dialect.alter_table(schema, table, &actions),
    )
}

pub(crate) fn create(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let Some(new_schema) = pair.new else {
        return Ok(());
    };
    for entry in pair.tables.entries() {
        match entry.old {
            None => create_table(ctx, pair.name, new_schema, entry.new, out)?,
            Some(old) if entry.renamed => {
                debug!(
                    schema = %pair.name,
                    from = %old.name,
                    to = %entry.new.name,
                    "renaming table"
                );
                out.write_stage(
                    Stage::Structure,
                    &ctx.dialect
                        .rename_table(pair.name, &old.name, &entry.new.name),
                )?;
                out.write_all(
                    Stage::Structure,
                    &ctx.dialect
                        .rename_table_dependents(pair.name, old, &entry.new.name),
                )?;
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn create_table(
    ctx: &DiffContext<'_>,
    schema: &Ident,
    new_schema: &Schema,
    table: &Table,
    out: &mut dyn StageWriter,
) -> Result<()> {
    debug!(schema = %schema, table = %table.name, "creating table");
    let defs: Vec<ColumnDef<'_>> = table
        .columns
        .iter()
        .map(|column| ColumnDef::new(new_schema, column))
        .collect();
    out.write_stage(
        Stage::Structure,
        &ctx.dialect.create_table(schema, table, &defs),
    )?;
    if let Some(role) = ctx.new_owner(table.owner.as_ref()) {
        let name = ctx.dialect.table_name(schema, &table.name);
        ctx.write_owner(out, Stage::Structure, OwnedObject::Table, &name, role)?;
    }
    for def in &defs {
        let Some(ty) = def.ty.enum_type() else {
            continue;
        };
        if let Some(sql) =
            ctx.dialect
                .enum_constraint_add(schema, &table.name, &def.column.name, &ty.name)
        {
            out.write_stage(Stage::Structure, &sql)?;
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
    for table_pair in &pair.table_pairs {
        let mut changes = TableChanges::new(ctx, pair.name, old_schema, new_schema, table_pair);
        let mut previous: Option<&Ident> = None;
        for entry in table_pair.columns.entries() {
            match entry.old {
                None => changes.add_column(entry.new, previous),
                Some(old) => changes.change_column(old, entry.new, entry.renamed),
            }
            previous = Some(&entry.new.name);
        }
        changes.change_primary_key(table_pair);
        changes.write(out)?;

        let (old, new) = (table_pair.old, table_pair.new);
        if let Some(role) = ctx.changed_owner(old.owner.as_ref(), new.owner.as_ref()) {
            let name = ctx.dialect.table_name(pair.name, &new.name);
            ctx.write_owner(out, Stage::Structure, OwnedObject::Table, &name, role)?;
        }
    }
    Ok(())
}

/// Column and key changes of one surviving table, sorted by stage.
struct TableChanges<'a> {
    ctx: &'a DiffContext<'a>,
    schema: &'a Ident,
    old_schema: &'a Schema,
    new_schema: &'a Schema,
    /// The new table name; any rename has already run.
    table: &'a Ident,
    /// Structure stage, ahead of `relax`.
    release: Vec<String>,
    relax: Vec<AlterAction<'a>>,
    /// Structure stage, after `relax`.
    attach: Vec<String>,
    backfill: Vec<String>,
    tighten: Vec<AlterAction<'a>>,
    /// Constraints stage, after `tighten`.
    reattach: Vec<String>,
}

impl<'a> TableChanges<'a> {
    fn new(
        ctx: &'a DiffContext<'a>,
        schema: &'a Ident,
        old_schema: &'a Schema,
        new_schema: &'a Schema,
        table_pair: &TablePair<'a>,
    ) -> Self {
        Self {
            ctx,
            schema,
            old_schema,
            new_schema,
            table: &table_pair.new.name,
            release: Vec::new(),
            relax: Vec::new(),
            attach: Vec::new(),
            backfill: Vec::new(),
            tighten: Vec::new(),
            reattach: Vec::new(),
        }
    }

    fn add_column(&mut self, column: &'a Column, previous: Option<&Ident>) {
        debug!(
            schema = %self.schema,
            table = %self.table,
            column = %column.name,
            "adding column"
        );
        let mut def = ColumnDef::new(self.new_schema, column);
        let position =
            previous.map_or(ColumnPosition::First, |p| ColumnPosition::After(p.clone()));
        let attach = self.enum_constraint(&column.name, &def.ty);

        // Existing rows have no value: add nullable, fill, then tighten.
        let deferred = self.ctx.options.add_defaults
            && def.not_null()
            && column.default.is_none()
            && !def.ty.is_serial();
        if deferred {
            def.column.nullable = true;
            let tightened = ColumnDelta {
                nullable: Some(false),
                ..ColumnDelta::default()
            };
            self.tighten_column(column, &def.ty, tightened);
        }
        self.relax.push(AlterAction::AddColumn { def, position });
        self.attach.extend(attach);
    }

    fn change_column(&mut self, old: &'a Column, new: &'a Column, renamed: bool) {
        let old_ty = ColumnType::resolve(self.old_schema, &old.type_name);
        let new_ty = ColumnType::resolve(self.new_schema, &new.type_name);

        let type_changed = old_ty.normalized() != new_ty.normalized();
        // Serial and its integer base store the same thing.
        let serial_swap = !type_changed && old_ty.is_serial() != new_ty.is_serial();
        let old_nullable = old.nullable && !old_ty.is_serial();
        let new_nullable = new.nullable && !new_ty.is_serial();
        let nullable_changed = !serial_swap && old_nullable != new_nullable;
        let tightening = nullable_changed && !new_nullable;
        let default_changed = old.default != new.default;

        if type_changed && old_ty.enum_type().is_some() {
            self.release.extend(
                self.ctx
                    .dialect
                    .enum_constraint_drop(self.schema, self.table, &old.name),
            );
        }
        let attach = if type_changed {
            self.enum_constraint(&new.name, &new_ty)
        } else {
            None
        };
        let delta = ColumnDelta {
            type_changed,
            nullable: nullable_changed.then_some(new_nullable),
            default: default_changed.then(|| new.default.clone()),
            had_default: old.default.is_some(),
        };
        if !delta.is_empty() || renamed {
            debug!(
                schema = %self.schema,
                table = %self.table,
                column = %new.name,
                renamed,
                ?delta,
                "changing column"
            );
        }

        if renamed && self.ctx.dialect.rename_carries_definition() {
            let mut def = ColumnDef::new(self.new_schema, new);
            if tightening {
                def.column.nullable = true;
            }
            self.relax.push(AlterAction::RenameColumn {
                from: old.name.clone(),
                def,
                had_default: old.default.is_some(),
            });
            if tightening {
                let tightened = ColumnDelta {
                    nullable: Some(false),
                    ..ColumnDelta::default()
                };
                self.tighten_column(new, &new_ty, tightened);
                self.reattach.extend(attach);
            } else {
                self.attach.extend(attach);
            }
            return;
        }

        if renamed {
            self.relax.push(AlterAction::RenameColumn {
                from: old.name.clone(),
                def: ColumnDef::new(self.new_schema, new),
                had_default: old.default.is_some(),
            });
        }
        if delta.is_empty() {
            return;
        }

        if !type_changed && !nullable_changed {
            self.relax.push(match &new.default {
                Some(expr) => AlterAction::SetDefault {
                    column: new.name.clone(),
                    expr: expr.clone(),
                    replacing: old.default.is_some(),
                },
                None => AlterAction::DropDefault {
                    column: new.name.clone(),
                },
            });
            return;
        }

        if !tightening {
            self.relax.push(AlterAction::ModifyColumn {
                def: ColumnDef::new(self.new_schema, new),
                delta,
            });
            self.attach.extend(attach);
            return;
        }

        if type_changed {
            // Retype now; NOT NULL waits for the backfill.
            let mut def = ColumnDef::new(self.new_schema, new);
            def.column.nullable = true;
            self.relax.push(AlterAction::ModifyColumn {
                def,
                delta: ColumnDelta {
                    nullable: None,
                    ..delta
                },
            });
            self.attach.extend(attach);
            let tightened = ColumnDelta {
                nullable: Some(false),
                ..ColumnDelta::default()
            };
            self.tighten_column(new, &new_ty, tightened);
        } else {
            self.tighten_column(new, &new_ty, delta);
        }
    }

    /// Backfills NULL rows of `column`, then makes it NOT NULL.
    fn tighten_column(&mut self, column: &'a Column, ty: &ColumnType<'_>, delta: ColumnDelta) {
        if self.ctx.options.add_defaults {
            let value = column
                .default
                .clone()
                .unwrap_or_else(|| self.ctx.dialect.zero_value(ty));
            self.backfill.push(self.ctx.dialect.backfill(
                self.schema,
                self.table,
                &column.name,
                &value,
            ));
        }
        self.tighten.push(AlterAction::ModifyColumn {
            def: ColumnDef::new(self.new_schema, column),
            delta,
        });
    }

    fn enum_constraint(&self, column: &Ident, ty: &ColumnType<'_>) -> Option<String> {
        let ty = ty.enum_type()?;
        self.ctx
            .dialect
            .enum_constraint_add(self.schema, self.table, column, &ty.name)
    }

    /// Compares keys through the column matching, so renamed key columns
    /// don't count as a change.
    fn change_primary_key(&mut self, table_pair: &TablePair<'a>) {
        let (old, new) = (table_pair.old, table_pair.new);
        let carried: Vec<Option<&Ident>> = old
            .primary_key
            .iter()
            .map(|name| {
                old.get_column(name)
                    .and_then(|column| table_pair.columns.successor(column))
                    .map(|entry| &entry.new.name)
            })
            .collect();
        let unchanged = carried.len() == new.primary_key.len()
            && carried
                .iter()
                .zip(&new.primary_key)
                .all(|(key, name)| key.is_some_and(|k| k == name));
        if unchanged {
            return;
        }

        debug!(
            schema = %self.schema,
            table = %self.table,
            key = ?new.primary_key,
            "changing primary key"
        );
        let dialect = self.ctx.dialect;
        if !old.primary_key.is_empty() {
            self.release
                .push(dialect.drop_primary_key(self.schema, self.table, &old.name));
        }
        if !new.primary_key.is_empty() {
            self.reattach
                .push(dialect.add_primary_key(self.schema, self.table, &new.primary_key));
        }
    }

    fn write(self, out: &mut dyn StageWriter) -> Result<()> {
        let dialect = self.ctx.dialect;
        out.write_all(Stage::Structure, &self.release)?;
        out.write_all(
            Stage::Structure,
            &dialect.alter_table(self.schema, self.table, &self.relax),
        )?;
        out.write_all(Stage::Structure, &self.attach)?;
        out.write_all(Stage::Data, &self.backfill)?;
        out.write_all(
            Stage::Constraints,
            &dialect.alter_table(self.schema, self.table, &self.tighten),
        )?;
        out.write_all(Stage::Constraints, &self.reattach)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::options::DiffOptions;
    use crate::schema::{EnumType, RoleMap};
    use crate::stage::StagedOutput;

    fn run(kind: DialectKind, options: DiffOptions, old: &Schema, new: &Schema) -> StagedOutput {
        let dialect = kind.dialect(options.quoting);
        let roles = RoleMap::default();
        let ctx = DiffContext {
            dialect: dialect.as_ref(),
            options: &options,
            old_roles: &roles,
            new_roles: &roles,
        };
        let pair = SchemaPair::build(&new.name, Some(old), Some(new), false).unwrap();
        let mut out = StagedOutput::new();
        drop(&ctx, &pair, &mut out).unwrap();
        create(&ctx, &pair, &mut out).unwrap();
        alter(&ctx, &pair, &mut out).unwrap();
        out
    }

    fn people(columns: Vec<Column>) -> Schema {
        let table = columns
            .into_iter()
            .fold(Table::new("people"), Table::column)
            .primary_key(["id"]);
        Schema::new("public").table(table)
    }

    #[test]
    fn test_postgres_tightening_is_deferred() {
        let old = people(vec![
            Column::new("id", "int").not_null(),
            Column::new("name", "text"),
        ]);
        let new = people(vec![
            Column::new("id", "int").not_null(),
            Column::new("name", "text").not_null(),
        ]);
        let out = run(DialectKind::Postgres, DiffOptions::default(), &old, &new);

        assert!(out.stage(Stage::Structure).is_empty());
        assert_eq!(
            out.stage(Stage::Data),
            ["UPDATE public.people SET name = '' WHERE name IS NULL;"]
        );
        assert_eq!(
            out.stage(Stage::Constraints),
            ["ALTER TABLE public.people\n  ALTER COLUMN name SET NOT NULL;"]
        );
    }

    #[test]
    fn test_postgres_added_not_null_column_is_backfilled() {
        let old = people(vec![Column::new("id", "int").not_null()]);
        let new = people(vec![
            Column::new("id", "int").not_null(),
            Column::new("active", "boolean").not_null(),
        ]);
        let out = run(DialectKind::Postgres, DiffOptions::default(), &old, &new);

        assert_eq!(
            out.stage(Stage::Structure),
            ["ALTER TABLE public.people\n  ADD COLUMN active boolean;"]
        );
        assert_eq!(
            out.stage(Stage::Data),
            ["UPDATE public.people SET active = FALSE WHERE active IS NULL;"]
        );
        assert_eq!(
            out.stage(Stage::Constraints),
            ["ALTER TABLE public.people\n  ALTER COLUMN active SET NOT NULL;"]
        );
    }

    #[test]
    fn test_add_defaults_off_adds_not_null_directly() {
        let old = people(vec![Column::new("id", "int").not_null()]);
        let new = people(vec![
            Column::new("id", "int").not_null(),
            Column::new("active", "boolean").not_null(),
        ]);
        let options = DiffOptions::default().add_defaults(false);
        let out = run(DialectKind::Postgres, options, &old, &new);

        assert_eq!(
            out.stage(Stage::Structure),
            ["ALTER TABLE public.people\n  ADD COLUMN active boolean NOT NULL;"]
        );
        assert!(out.stage(Stage::Data).is_empty());
        assert!(out.stage(Stage::Constraints).is_empty());
    }

    #[test]
    fn test_postgres_rename_then_retype() {
        let old = people(vec![
            Column::new("id", "int").not_null(),
            Column::new("age", "int"),
        ]);
        let new = people(vec![
            Column::new("id", "int").not_null(),
            Column::new("years", "bigint").renamed_from("age"),
        ]);
        let out = run(DialectKind::Postgres, DiffOptions::default(), &old, &new);

        assert_eq!(
            out.stage(Stage::Structure),
            [
                "ALTER TABLE public.people RENAME COLUMN age TO years;",
                "ALTER TABLE public.people\n  ALTER COLUMN years TYPE bigint USING years::bigint;",
            ]
        );
    }

    #[test]
    fn test_primary_key_follows_renamed_column() {
        let old = people(vec![Column::new("id", "int").not_null()]);
        let new = Schema::new("public").table(
            Table::new("people")
                .column(Column::new("person_id", "int").not_null().renamed_from("id"))
                .primary_key(["person_id"]),
        );
        let out = run(DialectKind::Postgres, DiffOptions::default(), &old, &new);
        assert_eq!(
            out.stage(Stage::Structure),
            ["ALTER TABLE public.people RENAME COLUMN id TO person_id;"]
        );
        assert!(out.stage(Stage::Constraints).is_empty());
    }

    #[test]
    fn test_primary_key_change() {
        let old = people(vec![
            Column::new("id", "int").not_null(),
            Column::new("code", "text").not_null(),
        ]);
        let new = Schema::new("public").table(
            Table::new("people")
                .column(Column::new("id", "int").not_null())
                .column(Column::new("code", "text").not_null())
                .primary_key(["code"]),
        );
        let out = run(DialectKind::Postgres, DiffOptions::default(), &old, &new);
        assert_eq!(
            out.stage(Stage::Structure),
            ["ALTER TABLE public.people DROP CONSTRAINT people_pkey;"]
        );
        assert_eq!(
            out.stage(Stage::Constraints),
            ["ALTER TABLE public.people ADD CONSTRAINT people_pkey PRIMARY KEY (code);"]
        );
    }

    #[test]
    fn test_mysql_enum_column_gets_lookup_constraint() {
        let mood = EnumType::new("mood", ["happy", "sad"]);
        let old = Schema::new("public").enum_type(mood.clone());
        let new = Schema::new("public").enum_type(mood).table(
            Table::new("people")
                .column(Column::new("id", "int").not_null())
                .column(Column::new("feeling", "mood"))
                .primary_key(["id"]),
        );
        let out = run(DialectKind::Mysql, DiffOptions::default(), &old, &new);
        assert_eq!(
            out.stage(Stage::Structure),
            [
                "CREATE TABLE public.people (\n  id int NOT NULL,\n  feeling varchar(255),\n  PRIMARY KEY (id)\n);",
                "ALTER TABLE public.people ADD CONSTRAINT people_feeling_fkey FOREIGN KEY (feeling) REFERENCES public.mood (value);",
            ]
        );
    }

    #[test]
    fn test_serial_swap_is_silent() {
        let old = people(vec![Column::new("id", "serial")]);
        let new = people(vec![Column::new("id", "int").not_null()]);
        let out = run(DialectKind::Mysql, DiffOptions::default(), &old, &new);
        assert!(out.is_empty(), "unexpected output: {out:?}");
    }
}
