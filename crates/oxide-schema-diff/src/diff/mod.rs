//! Diff orchestration.
//!
//! [`Generator`] compares an optional old [`Database`] with a new one and
//! writes the statements that turn the first into the second. Work runs in
//! three passes over every schema:
//!
//! 1. drop: views, triggers, tables (and dropped columns), sequences, types,
//!    schemas;
//! 2. create: schemas, types, sequences, tables (creates and renames), views,
//!    triggers;
//! 3. alter: types, sequences, tables.
//!
//! Each statement goes to a [`Stage`]; the stage, not the pass, decides
//! execution order.

mod matching;
mod sequences;
mod tables;
mod triggers;
mod types;
mod views;

pub use matching::{Entry, Matching, Renameable};

use tracing::{debug, info};

use crate::dialect::{DialectKind, OwnedObject, SqlDialect};
use crate::error::Result;
use crate::ident::Ident;
use crate::options::{DiffOptions, IdentKind};
use crate::replication;
use crate::schema::{Column, Database, Role, RoleMap, Schema, Sequence, Table};
use crate::stage::{Stage, StageWriter};

/// Generates staged DDL for one dialect.
pub struct Generator {
    dialect: Box<dyn SqlDialect>,
    options: DiffOptions,
}

impl Generator {
    /// Creates a generator for `kind`, quoting per `options.quoting`.
    #[must_use]
    pub fn new(kind: DialectKind, options: DiffOptions) -> Self {
        Self {
            dialect: kind.dialect(options.quoting),
            options,
        }
    }

    /// Creates a generator around an existing dialect.
    #[must_use]
    pub fn with_dialect(dialect: Box<dyn SqlDialect>, options: DiffOptions) -> Self {
        Self { dialect, options }
    }

    /// Returns the dialect in use.
    #[must_use]
    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    /// Returns the options in use.
    #[must_use]
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Generates the statements creating `new` from nothing.
    pub fn build(&self, new: &Database, out: &mut dyn StageWriter) -> Result<()> {
        self.diff(None, new, out)
    }

    /// Generates the statements upgrading `old` to `new`.
    pub fn upgrade(&self, old: &Database, new: &Database, out: &mut dyn StageWriter) -> Result<()> {
        self.diff(Some(old), new, out)
    }

    /// Generates the statements turning `old` (or nothing) into `new`.
    pub fn diff(
        &self,
        old: Option<&Database>,
        new: &Database,
        out: &mut dyn StageWriter,
    ) -> Result<()> {
        info!(
            dialect = self.dialect.name(),
            upgrade = old.is_some(),
            schemas = new.schemas.len(),
            "generating DDL"
        );

        let builtin = |ty: &str| self.dialect.is_builtin_type(ty);
        if let Some(old) = old {
            old.validate(builtin)?;
        }
        new.validate(builtin)?;
        let old_schemas = old.map_or(&[][..], |db| &db.schemas);
        for schema in old_schemas.iter().chain(&new.schemas) {
            triggers::validate(schema, self.dialect.name())?;
        }
        replication::validate(old, new, self.options.ignore_old_names)?;

        let empty = Database::new();
        let ctx = DiffContext {
            dialect: self.dialect.as_ref(),
            options: &self.options,
            old_roles: &old.unwrap_or(&empty).roles,
            new_roles: &new.roles,
        };
        let pairs = SchemaPair::build_all(old, new, self.options.ignore_old_names)?;

        for pair in &pairs {
            views::drop(&ctx, pair, out)?;
        }
        for pair in &pairs {
            triggers::drop(&ctx, pair, out)?;
        }
        for pair in &pairs {
            tables::drop(&ctx, pair, out)?;
        }
        for pair in &pairs {
            sequences::drop(&ctx, pair, out)?;
        }
        for pair in &pairs {
            types::drop(&ctx, pair, out)?;
        }
        for pair in pairs.iter().filter(|p| p.new.is_none()) {
            debug!(schema = %pair.name, "dropping schema");
            out.write_stage(Stage::Constraints, &ctx.dialect.drop_schema(pair.name))?;
        }

        for pair in &pairs {
            create_schema(&ctx, pair, out)?;
        }
        for pair in &pairs {
            types::create(&ctx, pair, out)?;
        }
        for pair in &pairs {
            sequences::create(&ctx, pair, out)?;
        }
        for pair in &pairs {
            tables::create(&ctx, pair, out)?;
        }
        for pair in &pairs {
            views::create(&ctx, pair, out)?;
        }
        for pair in &pairs {
            triggers::create(&ctx, pair, out)?;
        }

        for pair in &pairs {
            types::alter(&ctx, pair, out)?;
        }
        for pair in &pairs {
            sequences::alter(&ctx, pair, out)?;
        }
        for pair in &pairs {
            tables::alter(&ctx, pair, out)?;
        }

        info!(dialect = self.dialect.name(), "DDL generation complete");
        Ok(())
    }
}

fn create_schema(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let Some(new) = pair.new else {
        return Ok(());
    };
    let name = ctx.dialect.quoted(new.name.as_str(), IdentKind::Schema);
    match pair.old {
        None => {
            debug!(schema = %new.name, "creating schema");
            out.write_stage(Stage::Structure, &ctx.dialect.create_schema(&new.name))?;
            if let Some(role) = ctx.new_owner(new.owner.as_ref()) {
                ctx.write_owner(out, Stage::Structure, OwnedObject::Schema, &name, role)?;
            }
        }
        Some(old) => {
            if let Some(role) = ctx.changed_owner(old.owner.as_ref(), new.owner.as_ref()) {
                ctx.write_owner(out, Stage::Structure, OwnedObject::Schema, &name, role)?;
            }
        }
    }
    Ok(())
}

/// Everything a strategy needs besides the schema pair.
pub(crate) struct DiffContext<'a> {
    pub dialect: &'a dyn SqlDialect,
    pub options: &'a DiffOptions,
    pub old_roles: &'a RoleMap,
    pub new_roles: &'a RoleMap,
}

impl DiffContext<'_> {
    /// Resolved owner of a new entity.
    pub fn new_owner<'r>(&'r self, role: Option<&'r Role>) -> Option<&'r str> {
        role.map(|r| self.new_roles.resolve(r))
    }

    /// Resolved new owner, if it differs from the old one.
    pub fn changed_owner<'r>(
        &'r self,
        old: Option<&'r Role>,
        new: Option<&'r Role>,
    ) -> Option<&'r str> {
        let new = self.new_owner(new)?;
        let old = old.map(|r| self.old_roles.resolve(r));
        (old != Some(new)).then_some(new)
    }

    /// Writes an owner change, if the dialect tracks owners.
    pub fn write_owner(
        &self,
        out: &mut dyn StageWriter,
        stage: Stage,
        object: OwnedObject,
        name: &str,
        role: &str,
    ) -> Result<()> {
        match self.dialect.alter_owner(object, name, role) {
            Some(sql) => out.write_stage(stage, &sql),
            None => Ok(()),
        }
    }
}

/// A surviving table with its column matching.
pub(crate) struct TablePair<'a> {
    pub old: &'a Table,
    pub new: &'a Table,
    pub columns: Matching<'a, Column>,
}

/// One schema name present in the old tree, the new tree, or both.
pub(crate) struct SchemaPair<'a> {
    pub name: &'a Ident,
    pub old: Option<&'a Schema>,
    pub new: Option<&'a Schema>,
    pub tables: Matching<'a, Table>,
    pub table_pairs: Vec<TablePair<'a>>,
    pub sequences: Matching<'a, Sequence>,
}

impl<'a> SchemaPair<'a> {
    fn build_all(
        old: Option<&'a Database>,
        new: &'a Database,
        ignore_old_names: bool,
    ) -> Result<Vec<Self>> {
        let mut pairs = Vec::new();
        for schema in &new.schemas {
            let previous = old.and_then(|db| db.get_schema(&schema.name));
            pairs.push(Self::build(
                &schema.name,
                previous,
                Some(schema),
                ignore_old_names,
            )?);
        }
        if let Some(old) = old {
            for schema in &old.schemas {
                if new.get_schema(&schema.name).is_none() {
                    pairs.push(Self::build(&schema.name, Some(schema), None, ignore_old_names)?);
                }
            }
        }
        Ok(pairs)
    }

    fn build(
        name: &'a Ident,
        old: Option<&'a Schema>,
        new: Option<&'a Schema>,
        ignore_old_names: bool,
    ) -> Result<Self> {
        let scope = name.as_str();
        let tables = Matching::build(
            scope,
            old.map_or(&[][..], |s| &s.tables),
            new.map_or(&[][..], |s| &s.tables),
            ignore_old_names,
        )?;
        let mut table_pairs = Vec::new();
        for (old_table, new_table) in tables.matched() {
            let columns = Matching::build(
                &format!("{scope}.{}", new_table.name),
                &old_table.columns,
                &new_table.columns,
                ignore_old_names,
            )?;
            table_pairs.push(TablePair {
                old: old_table,
                new: new_table,
                columns,
            });
        }
        let sequences = Matching::build(
            scope,
            old.map_or(&[][..], |s| &s.sequences),
            new.map_or(&[][..], |s| &s.sequences),
            ignore_old_names,
        )?;
        Ok(Self {
            name,
            old,
            new,
            tables,
            table_pairs,
            sequences,
        })
    }
}
