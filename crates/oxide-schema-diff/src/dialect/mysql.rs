//! MySQL dialect.
//!
//! MySQL redefines a column wholesale (`MODIFY` / `CHANGE`), positions added
//! columns, has no sequences and no schema-level enumerated types. Sequences
//! are emulated with a `__sequences` bookkeeping table; enumerated types with
//! a lookup table referenced by a foreign key.

use crate::error::{DiffError, Result};
use crate::ident::Ident;
use crate::options::{IdentKind, QuotePolicy};
use crate::schema::{EnumType, Sequence, Trigger, TriggerGranularity};

use super::{
    serial_base, AlterAction, ColumnDef, ColumnPosition, ColumnType, DialectKind, SqlDialect,
};

const SEQUENCE_TABLE: &str = "__sequences";

/// MySQL dialect.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect {
    quoting: QuotePolicy,
}

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub fn new(quoting: QuotePolicy) -> Self {
        Self { quoting }
    }

    fn sequence_table(&self, schema: &Ident) -> String {
        self.qualified(schema, &Ident::new(SEQUENCE_TABLE), IdentKind::Table)
    }

    fn col(&self, name: &str) -> String {
        self.quoted(name, IdentKind::Column)
    }

    /// One trigger name per event: MySQL triggers fire on a single event.
    fn trigger_names<'t>(&self, trigger: &'t Trigger) -> Vec<(String, &'t str)> {
        let events: Vec<&str> = trigger.events().collect();
        if events.len() == 1 {
            return vec![(trigger.name.to_string(), events[0])];
        }
        events
            .into_iter()
            .map(|event| (format!("{}_{}", trigger.name, event.to_lowercase()), event))
            .collect()
    }

    fn alter_clause(&self, table: &Ident, action: &AlterAction<'_>) -> String {
        match action {
            AlterAction::AddColumn { def, position } => {
                let position = match position {
                    ColumnPosition::First => " FIRST".to_string(),
                    ColumnPosition::After(previous) => {
                        format!(" AFTER {}", self.column_name(previous))
                    }
                };
                format!("ADD COLUMN {}{position}", self.column_definition(table, def))
            }
            AlterAction::DropColumn { column } => {
                format!("DROP COLUMN {}", self.column_name(&column.name))
            }
            AlterAction::RenameColumn { from, def, .. } => format!(
                "CHANGE COLUMN {} {}",
                self.column_name(from),
                self.column_definition(table, def)
            ),
            AlterAction::ModifyColumn { def, .. } => {
                format!("MODIFY COLUMN {}", self.column_definition(table, def))
            }
            AlterAction::SetDefault { column, expr, .. } => format!(
                "ALTER COLUMN {} SET DEFAULT {expr}",
                self.column_name(column)
            ),
            AlterAction::DropDefault { column } => {
                format!("ALTER COLUMN {} DROP DEFAULT", self.column_name(column))
            }
        }
    }

    fn drop_foreign_key(&self, schema: &Ident, table: &Ident, name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {};",
            self.table_name(schema, table),
            self.quoted(name, IdentKind::Object)
        )
    }

    fn sequence_value(value: Option<i64>, fallback: i64) -> i64 {
        value.unwrap_or(fallback)
    }
}

impl SqlDialect for MysqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Mysql
    }

    fn quoting(&self) -> &QuotePolicy {
        &self.quoting
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn supports_column_positioning(&self) -> bool {
        true
    }

    fn supports_sequences(&self) -> bool {
        false
    }

    fn rename_carries_definition(&self) -> bool {
        true
    }

    fn native_type(&self, ty: &ColumnType<'_>) -> String {
        match ty {
            ColumnType::Builtin(name) => serial_base(name)
                .map_or_else(|| (*name).to_string(), ToString::to_string),
            ColumnType::Enum { .. } => "varchar(255)".to_string(),
        }
    }

    fn column_definition(&self, _table: &Ident, def: &ColumnDef<'_>) -> String {
        let mut sql = format!(
            "{} {}",
            self.column_name(&def.column.name),
            self.native_type(&def.ty)
        );
        if def.ty.is_serial() {
            sql.push_str(" NOT NULL AUTO_INCREMENT");
            return sql;
        }
        if def.not_null() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &def.column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }

    fn rename_table(&self, schema: &Ident, old: &Ident, new: &Ident) -> String {
        format!(
            "RENAME TABLE {} TO {};",
            self.table_name(schema, old),
            self.table_name(schema, new)
        )
    }

    fn alter_table(
        &self,
        schema: &Ident,
        table: &Ident,
        actions: &[AlterAction<'_>],
    ) -> Vec<String> {
        if actions.is_empty() {
            return Vec::new();
        }
        let clauses: Vec<String> = actions
            .iter()
            .map(|action| self.alter_clause(table, action))
            .collect();
        vec![format!(
            "ALTER TABLE {}\n  {};",
            self.table_name(schema, table),
            clauses.join(",\n  ")
        )]
    }

    fn add_primary_key(&self, schema: &Ident, table: &Ident, columns: &[Ident]) -> String {
        format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({});",
            self.table_name(schema, table),
            self.column_list(columns)
        )
    }

    fn drop_primary_key(&self, schema: &Ident, table: &Ident, _constraint_table: &Ident) -> String {
        format!("ALTER TABLE {} DROP PRIMARY KEY;", self.table_name(schema, table))
    }

    fn create_trigger(&self, schema: &Ident, trigger: &Trigger) -> Result<Vec<String>> {
        if trigger.for_each == Some(TriggerGranularity::Statement) {
            return Err(DiffError::UnsupportedTrigger {
                schema: schema.to_string(),
                trigger: trigger.name.to_string(),
                dialect: self.name(),
                reason: "statement-level triggers are not supported".to_string(),
            });
        }
        let body = trigger.function.trim().trim_end_matches(';');
        Ok(self
            .trigger_names(trigger)
            .into_iter()
            .map(|(name, event)| {
                format!(
                    "CREATE TRIGGER {} {} {} ON {} FOR EACH ROW {body};",
                    self.qualified(schema, &Ident::new(name), IdentKind::Object),
                    trigger.timing.as_sql(),
                    event.to_uppercase(),
                    self.table_name(schema, &trigger.table)
                )
            })
            .collect())
    }

    fn drop_trigger(&self, schema: &Ident, trigger: &Trigger) -> Result<Vec<String>> {
        Ok(self
            .trigger_names(trigger)
            .into_iter()
            .map(|(name, _)| {
                format!(
                    "DROP TRIGGER IF EXISTS {};",
                    self.qualified(schema, &Ident::new(name), IdentKind::Object)
                )
            })
            .collect())
    }

    fn enum_constraint_drop(
        &self,
        schema: &Ident,
        table: &Ident,
        column: &Ident,
    ) -> Option<String> {
        Some(self.drop_foreign_key(schema, table, &self.enum_constraint_name(table, column)))
    }

    fn enum_dependency_release(
        &self,
        schema: &Ident,
        table: &Ident,
        column: &Ident,
        _ty: &EnumType,
    ) -> String {
        self.drop_foreign_key(schema, table, &self.enum_constraint_name(table, column))
    }

    fn create_sequence(&self, schema: &Ident, sequence: &Sequence) -> Vec<String> {
        let shim = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {} varchar(100) NOT NULL PRIMARY KEY,\n  \
             {} int NOT NULL DEFAULT 1,\n  {} bigint NOT NULL DEFAULT 1,\n  \
             {} bigint NOT NULL DEFAULT {},\n  {} bigint NOT NULL DEFAULT 1,\n  \
             {} boolean NOT NULL DEFAULT FALSE\n);",
            self.sequence_table(schema),
            self.col("name"),
            self.col("increment"),
            self.col("min_value"),
            self.col("max_value"),
            i64::MAX,
            self.col("cur_value"),
            self.col("cycle"),
        );
        let insert = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES ({}, {}, {}, {}, {}, {});",
            self.sequence_table(schema),
            self.col("name"),
            self.col("increment"),
            self.col("min_value"),
            self.col("max_value"),
            self.col("cur_value"),
            self.col("cycle"),
            self.string_literal(sequence.name.as_str()),
            Self::sequence_value(sequence.increment, 1),
            Self::sequence_value(sequence.min_value, 1),
            Self::sequence_value(sequence.max_value, i64::MAX),
            Self::sequence_value(sequence.start, 1),
            self.boolean_literal(sequence.cycle),
        );
        vec![shim, insert]
    }

    fn alter_sequence(&self, schema: &Ident, _old: &Sequence, new: &Sequence) -> Vec<String> {
        vec![format!(
            "UPDATE {} SET {} = {}, {} = {}, {} = {}, {} = {} WHERE {} = {};",
            self.sequence_table(schema),
            self.col("increment"),
            Self::sequence_value(new.increment, 1),
            self.col("min_value"),
            Self::sequence_value(new.min_value, 1),
            self.col("max_value"),
            Self::sequence_value(new.max_value, i64::MAX),
            self.col("cycle"),
            self.boolean_literal(new.cycle),
            self.col("name"),
            self.string_literal(new.name.as_str()),
        )]
    }

    fn rename_sequence(&self, schema: &Ident, old: &Ident, new: &Ident) -> String {
        format!(
            "UPDATE {} SET {} = {} WHERE {} = {};",
            self.sequence_table(schema),
            self.col("name"),
            self.string_literal(new.as_str()),
            self.col("name"),
            self.string_literal(old.as_str()),
        )
    }

    fn drop_sequence(&self, schema: &Ident, sequence: &Ident) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {};",
            self.sequence_table(schema),
            self.col("name"),
            self.string_literal(sequence.as_str()),
        )
    }
}
