//! SQL Server dialect.
//!
//! SQL Server alters one column per statement, names default constraints
//! explicitly (`DF_<table>_<column>`) so they can be dropped later, and
//! renames through `sp_rename`.

use crate::error::Result;
use crate::ident::Ident;
use crate::options::{IdentKind, QuotePolicy};
use crate::schema::{Sequence, Table, Trigger, TriggerTiming};

use super::{base_type, serial_base, AlterAction, ColumnDef, ColumnType, DialectKind, SqlDialect};

/// SQL Server dialect.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect {
    quoting: QuotePolicy,
}

impl MssqlDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub fn new(quoting: QuotePolicy) -> Self {
        Self { quoting }
    }

    fn default_constraint_name(table: &Ident, column: &Ident) -> Ident {
        Ident::new(format!("DF_{}_{}", table.as_str(), column.as_str()))
    }

    fn default_constraint(&self, table: &Ident, column: &Ident) -> String {
        self.quoted(
            Self::default_constraint_name(table, column).as_str(),
            IdentKind::Object,
        )
    }

    /// Keeps a default constraint named after its table and column.
    fn rename_default(&self, schema: &Ident, from: &Ident, to: &Ident) -> String {
        self.sp_rename(
            &format!("{}.{}", schema.as_str(), from.as_str()),
            to,
            Some("OBJECT"),
        )
    }

    fn add_default(&self, schema: &Ident, table: &Ident, column: &Ident, expr: &str) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT {expr} FOR {};",
            self.table_name(schema, table),
            self.default_constraint(table, column),
            self.column_name(column)
        )
    }

    fn drop_default(&self, schema: &Ident, table: &Ident, column: &Ident) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            self.table_name(schema, table),
            self.default_constraint(table, column)
        )
    }

    fn sp_rename(&self, object: &str, new: &Ident, kind: Option<&str>) -> String {
        let mut sql = format!(
            "EXEC sp_rename {}, {}",
            self.string_literal(object),
            self.string_literal(new.as_str())
        );
        if let Some(kind) = kind {
            sql.push_str(&format!(", {}", self.string_literal(kind)));
        }
        sql.push(';');
        sql
    }

    fn alter_statements(
        &self,
        schema: &Ident,
        table: &Ident,
        action: &AlterAction<'_>,
    ) -> Vec<String> {
        let table_name = self.table_name(schema, table);
        match action {
            AlterAction::AddColumn { def, .. } => vec![format!(
                "ALTER TABLE {table_name} ADD {};",
                self.column_definition(table, def)
            )],
            AlterAction::DropColumn { column } => {
                let mut statements = Vec::new();
                if column.default.is_some() {
                    statements.push(self.drop_default(schema, table, &column.name));
                }
                statements.push(format!(
                    "ALTER TABLE {table_name} DROP COLUMN {};",
                    self.column_name(&column.name)
                ));
                statements
            }
            AlterAction::RenameColumn {
                from,
                def,
                had_default,
            } => {
                let mut statements = vec![self.sp_rename(
                    &format!("{}.{}.{}", schema.as_str(), table.as_str(), from.as_str()),
                    &def.column.name,
                    Some("COLUMN"),
                )];
                if *had_default {
                    statements.push(self.rename_default(
                        schema,
                        &Self::default_constraint_name(table, from),
                        &Self::default_constraint_name(table, &def.column.name),
                    ));
                }
                statements
            }
            AlterAction::ModifyColumn { def, delta } => {
                let name = &def.column.name;
                let mut statements = Vec::new();
                // A bound default blocks a type change.
                let rebind = delta.had_default && (delta.default.is_some() || delta.type_changed);
                if rebind {
                    statements.push(self.drop_default(schema, table, name));
                }
                if delta.type_changed || delta.nullable.is_some() {
                    statements.push(format!(
                        "ALTER TABLE {table_name} ALTER COLUMN {} {}{};",
                        self.column_name(name),
                        self.native_type(&def.ty),
                        if def.not_null() { " NOT NULL" } else { " NULL" }
                    ));
                }
                let default = match &delta.default {
                    Some(default) => default.as_deref(),
                    None if rebind => def.column.default.as_deref(),
                    None => None,
                };
                if let Some(expr) = default {
                    statements.push(self.add_default(schema, table, name, expr));
                }
                statements
            }
            AlterAction::SetDefault {
                column,
                expr,
                replacing,
            } => {
                let mut statements = Vec::new();
                if *replacing {
                    statements.push(self.drop_default(schema, table, column));
                }
                statements.push(self.add_default(schema, table, column, expr));
                statements
            }
            AlterAction::DropDefault { column } => vec![self.drop_default(schema, table, column)],
        }
    }

    fn sequence_options(&self, sequence: &Sequence, altering: bool) -> String {
        let mut sql = String::new();
        if let Some(start) = sequence.start {
            sql.push_str(&format!(
                " {} {start}",
                if altering { "RESTART WITH" } else { "START WITH" }
            ));
        }
        if let Some(increment) = sequence.increment {
            sql.push_str(&format!(" INCREMENT BY {increment}"));
        }
        match sequence.min_value {
            Some(min) => sql.push_str(&format!(" MINVALUE {min}")),
            None if altering => sql.push_str(" NO MINVALUE"),
            None => {}
        }
        match sequence.max_value {
            Some(max) => sql.push_str(&format!(" MAXVALUE {max}")),
            None if altering => sql.push_str(" NO MAXVALUE"),
            None => {}
        }
        sql.push_str(if sequence.cycle { " CYCLE" } else { " NO CYCLE" });
        if let Some(cache) = sequence.cache {
            sql.push_str(&format!(" CACHE {cache}"));
        }
        sql
    }
}

impl SqlDialect for MssqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Mssql
    }

    fn quoting(&self) -> &QuotePolicy {
        &self.quoting
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn native_type(&self, ty: &ColumnType<'_>) -> String {
        match ty {
            ColumnType::Enum { .. } => "varchar(255)".to_string(),
            ColumnType::Builtin(name) => {
                if let Some(base) = serial_base(name) {
                    return base.to_string();
                }
                match base_type(name).as_str() {
                    "bool" | "boolean" => "bit".to_string(),
                    "text" => "varchar(max)".to_string(),
                    "bytea" => "varbinary(max)".to_string(),
                    "uuid" => "uniqueidentifier".to_string(),
                    "timestamp" | "timestamp without time zone" => "datetime2".to_string(),
                    "timestamptz" | "timestamp with time zone" => "datetimeoffset".to_string(),
                    _ => (*name).to_string(),
                }
            }
        }
    }

    fn column_definition(&self, table: &Ident, def: &ColumnDef<'_>) -> String {
        let mut sql = format!(
            "{} {}",
            self.column_name(&def.column.name),
            self.native_type(&def.ty)
        );
        if def.ty.is_serial() {
            sql.push_str(" IDENTITY(1,1) NOT NULL");
            return sql;
        }
        if def.not_null() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &def.column.default {
            sql.push_str(&format!(
                " CONSTRAINT {} DEFAULT {default}",
                self.default_constraint(table, &def.column.name)
            ));
        }
        sql
    }

    fn primary_key_clause(&self, table: &Ident, columns: &[Ident]) -> String {
        format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            self.quoted(&self.primary_key_name(table), IdentKind::Object),
            self.column_list(columns)
        )
    }

    fn rename_table(&self, schema: &Ident, old: &Ident, new: &Ident) -> String {
        self.sp_rename(&format!("{}.{}", schema.as_str(), old.as_str()), new, None)
    }

    fn rename_table_dependents(&self, schema: &Ident, old: &Table, new: &Ident) -> Vec<String> {
        old.columns
            .iter()
            .filter(|column| {
                column.default.is_some() && serial_base(&column.type_name).is_none()
            })
            .map(|column| {
                self.rename_default(
                    schema,
                    &Self::default_constraint_name(&old.name, &column.name),
                    &Self::default_constraint_name(new, &column.name),
                )
            })
            .collect()
    }

    fn alter_table(
        &self,
        schema: &Ident,
        table: &Ident,
        actions: &[AlterAction<'_>],
    ) -> Vec<String> {
        actions
            .iter()
            .flat_map(|action| self.alter_statements(schema, table, action))
            .collect()
    }

    fn create_trigger(&self, schema: &Ident, trigger: &Trigger) -> Result<Vec<String>> {
        let timing = match trigger.timing {
            TriggerTiming::Before => "INSTEAD OF",
            TriggerTiming::After => "AFTER",
        };
        let events: Vec<String> = trigger.events().map(str::to_uppercase).collect();
        Ok(vec![format!(
            "CREATE TRIGGER {} ON {} {timing} {} AS {};",
            self.qualified(schema, &trigger.name, IdentKind::Object),
            self.table_name(schema, &trigger.table),
            events.join(", "),
            trigger.function.trim().trim_end_matches(';')
        )])
    }

    fn drop_trigger(&self, schema: &Ident, trigger: &Trigger) -> Result<Vec<String>> {
        Ok(vec![format!(
            "DROP TRIGGER {};",
            self.qualified(schema, &trigger.name, IdentKind::Object)
        )])
    }

    fn create_sequence(&self, schema: &Ident, sequence: &Sequence) -> Vec<String> {
        vec![format!(
            "CREATE SEQUENCE {} AS bigint{};",
            self.qualified(schema, &sequence.name, IdentKind::Object),
            self.sequence_options(sequence, false)
        )]
    }

    fn alter_sequence(&self, schema: &Ident, old: &Sequence, new: &Sequence) -> Vec<String> {
        let mut target = new.clone();
        if old.start == new.start {
            target.start = None;
        }
        vec![format!(
            "ALTER SEQUENCE {}{};",
            self.qualified(schema, &new.name, IdentKind::Object),
            self.sequence_options(&target, true)
        )]
    }

    fn rename_sequence(&self, schema: &Ident, old: &Ident, new: &Ident) -> String {
        self.sp_rename(&format!("{}.{}", schema.as_str(), old.as_str()), new, None)
    }

    fn drop_sequence(&self, schema: &Ident, sequence: &Ident) -> String {
        format!(
            "DROP SEQUENCE {};",
            self.qualified(schema, sequence, IdentKind::Object)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::ColumnDelta;
    use crate::schema::{Column, Schema, Table};

    fn dialect() -> MssqlDialect {
        MssqlDialect::new(QuotePolicy::none())
    }

    fn dbo() -> Ident {
        Ident::new("dbo")
    }

    #[test]
    fn test_quote_identifier_doubles_brackets() {
        assert_eq!(dialect().quote_identifier("a]b"), "[a]]b]");
        assert_eq!(dialect().quoted("Order Lines", IdentKind::Table), "[Order Lines]");
    }

    #[test]
    fn test_create_table_names_constraints() {
        let schema = Schema::new("dbo");
        let table = Table::new("users")
            .column(Column::new("id", "serial"))
            .column(Column::new("active", "boolean").not_null().default("1"))
            .primary_key(["id"]);
        let defs: Vec<ColumnDef<'_>> = table
            .columns
            .iter()
            .map(|c| ColumnDef::new(&schema, c))
            .collect();
        assert_eq!(
            dialect().create_table(&dbo(), &table, &defs),
            "CREATE TABLE dbo.users (\n  id int IDENTITY(1,1) NOT NULL,\n  \
             active bit NOT NULL CONSTRAINT [DF_users_active] DEFAULT 1,\n  \
             CONSTRAINT users_pkey PRIMARY KEY (id)\n);"
        );
    }

    #[test]
    fn test_modify_column_replaces_default_constraint() {
        let schema = Schema::new("dbo");
        let column = Column::new("name", "varchar(50)").not_null().default("'x'");
        let actions = vec![AlterAction::ModifyColumn {
            def: ColumnDef::new(&schema, &column),
            delta: ColumnDelta {
                type_changed: false,
                nullable: Some(false),
                default: Some(Some("'x'".to_string())),
                had_default: true,
            },
        }];
        assert_eq!(
            dialect().alter_table(&dbo(), &Ident::new("t"), &actions),
            vec![
                "ALTER TABLE dbo.t DROP CONSTRAINT [DF_t_name];".to_string(),
                "ALTER TABLE dbo.t ALTER COLUMN name varchar(50) NOT NULL;".to_string(),
                "ALTER TABLE dbo.t ADD CONSTRAINT [DF_t_name] DEFAULT 'x' FOR name;".to_string(),
            ]
        );
    }

    #[test]
    fn test_renames_use_sp_rename() {
        let schema = Schema::new("dbo");
        let column = Column::new("full_name", "text");
        let actions = vec![AlterAction::RenameColumn {
            from: Ident::new("name"),
            def: ColumnDef::new(&schema, &column),
            had_default: false,
        }];
        assert_eq!(
            dialect().alter_table(&dbo(), &Ident::new("users"), &actions),
            vec!["EXEC sp_rename 'dbo.users.name', 'full_name', 'COLUMN';".to_string()]
        );
        assert_eq!(
            dialect().rename_table(&dbo(), &Ident::new("old"), &Ident::new("new")),
            "EXEC sp_rename 'dbo.old', 'new';"
        );
    }

    #[test]
    fn test_renames_carry_default_constraints() {
        let schema = Schema::new("dbo");
        let column = Column::new("full_name", "text").default("'x'");
        let actions = vec![AlterAction::RenameColumn {
            from: Ident::new("name"),
            def: ColumnDef::new(&schema, &column),
            had_default: true,
        }];
        assert_eq!(
            dialect().alter_table(&dbo(), &Ident::new("users"), &actions),
            vec![
                "EXEC sp_rename 'dbo.users.name', 'full_name', 'COLUMN';".to_string(),
                "EXEC sp_rename 'dbo.DF_users_name', 'DF_users_full_name', 'OBJECT';".to_string(),
            ]
        );

        let table = Table::new("orders")
            .column(Column::new("id", "serial"))
            .column(Column::new("total", "int").default("0"))
            .column(Column::new("note", "text"));
        assert_eq!(
            dialect().rename_table_dependents(&dbo(), &table, &Ident::new("purchases")),
            vec!["EXEC sp_rename 'dbo.DF_orders_total', 'DF_purchases_total', 'OBJECT';".to_string()]
        );
    }

    #[test]
    fn test_retype_rebinds_default_constraint() {
        let schema = Schema::new("dbo");
        let column = Column::new("total", "bigint").not_null().default("0");
        let actions = vec![AlterAction::ModifyColumn {
            def: ColumnDef::new(&schema, &column),
            delta: ColumnDelta {
                type_changed: true,
                nullable: None,
                default: None,
                had_default: true,
            },
        }];
        assert_eq!(
            dialect().alter_table(&dbo(), &Ident::new("t"), &actions),
            vec![
                "ALTER TABLE dbo.t DROP CONSTRAINT [DF_t_total];".to_string(),
                "ALTER TABLE dbo.t ALTER COLUMN total bigint NOT NULL;".to_string(),
                "ALTER TABLE dbo.t ADD CONSTRAINT [DF_t_total] DEFAULT 0 FOR total;".to_string(),
            ]
        );
    }

    #[test]
    fn test_before_trigger_becomes_instead_of() {
        let trigger = Trigger::new("trg", "users", TriggerTiming::Before, "INSERT UPDATE", "EXEC dbo.audit");
        assert_eq!(
            dialect().create_trigger(&dbo(), &trigger).unwrap(),
            vec!["CREATE TRIGGER dbo.trg ON dbo.users INSTEAD OF INSERT, UPDATE AS EXEC dbo.audit;".to_string()]
        );
    }

    #[test]
    fn test_zero_value_boolean_is_bit() {
        assert_eq!(dialect().zero_value(&ColumnType::Builtin("boolean")), "0");
    }

    #[test]
    fn test_sequence_statements() {
        let old = Sequence::new("s").start(1);
        let new = Sequence::new("s").start(1).increment(10);
        assert_eq!(
            dialect().create_sequence(&dbo(), &new),
            vec!["CREATE SEQUENCE dbo.s AS bigint START WITH 1 INCREMENT BY 10 NO CYCLE;".to_string()]
        );
        assert_eq!(
            dialect().alter_sequence(&dbo(), &old, &new),
            vec!["ALTER SEQUENCE dbo.s INCREMENT BY 10 NO MINVALUE NO MAXVALUE NO CYCLE;".to_string()]
        );
    }
}
