//! PostgreSQL dialect.
//!
//! PostgreSQL has native enumerated types, sequences and object owners.
//! An enumerated type is still never altered in place: a changed label list
//! goes through drop and recreate with dependent columns parked as `text`.

use crate::error::{DiffError, Result};
use crate::ident::Ident;
use crate::options::{IdentKind, QuotePolicy};
use crate::schema::{EnumType, Sequence, Trigger};

use super::{
    serial_base, split_function_call, AlterAction, ColumnType, DialectKind, OwnedObject,
    SqlDialect,
};

/// PostgreSQL dialect.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect {
    quoting: QuotePolicy,
}

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub fn new(quoting: QuotePolicy) -> Self {
        Self { quoting }
    }

    fn function_call(&self, call: &str) -> String {
        let (name, args) = split_function_call(call);
        let name = name
            .split('.')
            .map(|part| self.quoted(part, IdentKind::Function))
            .collect::<Vec<_>>()
            .join(".");
        format!("{name}{}", args.unwrap_or("()"))
    }

    fn type_name(&self, schema: &Ident, ty: &Ident) -> String {
        self.qualified(schema, ty, IdentKind::Object)
    }

    /// Type used by `ALTER COLUMN ... TYPE`, where serial pseudo-types are
    /// not accepted.
    fn alter_type(&self, ty: &ColumnType<'_>) -> String {
        match ty {
            ColumnType::Builtin(name) => serial_base(name)
                .map_or_else(|| (*name).to_string(), ToString::to_string),
            ColumnType::Enum { .. } => self.native_type(ty),
        }
    }

    fn using_cast(&self, column: &str, ty: &ColumnType<'_>) -> String {
        match ty {
            ColumnType::Enum { .. } => format!("{column}::text::{}", self.native_type(ty)),
            ColumnType::Builtin(_) => format!("{column}::{}", self.alter_type(ty)),
        }
    }

    fn alter_clauses(&self, table: &Ident, action: &AlterAction<'_>) -> Vec<String> {
        match action {
            AlterAction::AddColumn { def, .. } => {
                vec![format!("ADD COLUMN {}", self.column_definition(table, def))]
            }
            AlterAction::DropColumn { column } => {
                vec![format!("DROP COLUMN {}", self.column_name(&column.name))]
            }
            // Renames are separate statements.
            AlterAction::RenameColumn { .. } => Vec::new(),
            AlterAction::ModifyColumn { def, delta } => {
                let column = self.column_name(&def.column.name);
                let mut clauses = Vec::new();
                if delta.type_changed {
                    clauses.push(format!(
                        "ALTER COLUMN {column} TYPE {} USING {}",
                        self.alter_type(&def.ty),
                        self.using_cast(&column, &def.ty)
                    ));
                }
                match &delta.default {
                    Some(Some(expr)) => {
                        clauses.push(format!("ALTER COLUMN {column} SET DEFAULT {expr}"));
                    }
                    Some(None) => clauses.push(format!("ALTER COLUMN {column} DROP DEFAULT")),
                    None => {}
                }
                match delta.nullable {
                    Some(true) => clauses.push(format!("ALTER COLUMN {column} DROP NOT NULL")),
                    Some(false) => clauses.push(format!("ALTER COLUMN {column} SET NOT NULL")),
                    None => {}
                }
                clauses
            }
            AlterAction::SetDefault { column, expr, .. } => vec![format!(
                "ALTER COLUMN {} SET DEFAULT {expr}",
                self.column_name(column)
            )],
            AlterAction::DropDefault { column } => vec![format!(
                "ALTER COLUMN {} DROP DEFAULT",
                self.column_name(column)
            )],
        }
    }

    fn sequence_options(&self, sequence: &Sequence, altering: bool) -> String {
        let mut sql = String::new();
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
        if let Some(start) = sequence.start {
            sql.push_str(&format!(" START WITH {start}"));
        }
        if let Some(cache) = sequence.cache {
            sql.push_str(&format!(" CACHE {cache}"));
        }
        if sequence.cycle {
            sql.push_str(" CYCLE");
        } else if altering {
            sql.push_str(" NO CYCLE");
        }
        sql
    }
}

impl SqlDialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn quoting(&self) -> &QuotePolicy {
        &self.quoting
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn native_enum_types(&self) -> bool {
        true
    }

    fn native_type(&self, ty: &ColumnType<'_>) -> String {
        match ty {
            ColumnType::Builtin(name) => (*name).to_string(),
            ColumnType::Enum { schema, ty } => self.type_name(schema, &ty.name),
        }
    }

    fn alter_owner(&self, object: OwnedObject, name: &str, role: &str) -> Option<String> {
        Some(format!(
            "ALTER {} {name} OWNER TO {};",
            object.keyword(),
            self.quoted(role, IdentKind::Object)
        ))
    }

    fn rename_table(&self, schema: &Ident, old: &Ident, new: &Ident) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {};",
            self.table_name(schema, old),
            self.quoted(new.as_str(), IdentKind::Table)
        )
    }

    fn alter_table(
        &self,
        schema: &Ident,
        table: &Ident,
        actions: &[AlterAction<'_>],
    ) -> Vec<String> {
        let table_name = self.table_name(schema, table);
        let mut statements: Vec<String> = actions
            .iter()
            .filter_map(|action| match action {
                AlterAction::RenameColumn { from, def, .. } => Some(format!(
                    "ALTER TABLE {table_name} RENAME COLUMN {} TO {};",
                    self.column_name(from),
                    self.column_name(&def.column.name)
                )),
                _ => None,
            })
            .collect();
        let clauses: Vec<String> = actions
            .iter()
            .flat_map(|action| self.alter_clauses(table, action))
            .collect();
        if !clauses.is_empty() {
            statements.push(format!(
                "ALTER TABLE {table_name}\n  {};",
                clauses.join(",\n  ")
            ));
        }
        statements
    }

    fn create_trigger(&self, schema: &Ident, trigger: &Trigger) -> Result<Vec<String>> {
        let granularity = trigger
            .for_each
            .ok_or_else(|| DiffError::MissingTriggerAttribute {
                schema: schema.to_string(),
                trigger: trigger.name.to_string(),
                attribute: "for_each",
                dialect: self.name(),
            })?;
        let events: Vec<String> = trigger.events().map(str::to_uppercase).collect();
        Ok(vec![format!(
            "CREATE TRIGGER {} {} {} ON {} FOR EACH {} EXECUTE PROCEDURE {};",
            self.quoted(trigger.name.as_str(), IdentKind::Object),
            trigger.timing.as_sql(),
            events.join(" OR "),
            self.table_name(schema, &trigger.table),
            granularity.as_sql(),
            self.function_call(&trigger.function)
        )])
    }

    fn drop_trigger(&self, schema: &Ident, trigger: &Trigger) -> Result<Vec<String>> {
        Ok(vec![format!(
            "DROP TRIGGER {} ON {};",
            self.quoted(trigger.name.as_str(), IdentKind::Object),
            self.table_name(schema, &trigger.table)
        )])
    }

    fn create_enum_type(&self, schema: &Ident, ty: &EnumType) -> Vec<String> {
        let labels: Vec<String> = ty.values.iter().map(|v| self.string_literal(v)).collect();
        vec![format!(
            "CREATE TYPE {} AS ENUM ({});",
            self.type_name(schema, &ty.name),
            labels.join(", ")
        )]
    }

    fn drop_enum_type(&self, schema: &Ident, ty: &EnumType) -> String {
        format!("DROP TYPE {};", self.type_name(schema, &ty.name))
    }

    fn enum_values_delete(&self, schema: &Ident, ty: &EnumType) -> String {
        self.drop_enum_type(schema, ty)
    }

    fn enum_values_insert(&self, schema: &Ident, ty: &EnumType) -> Option<String> {
        self.create_enum_type(schema, ty).pop()
    }

    fn enum_constraint_add(
        &self,
        _schema: &Ident,
        _table: &Ident,
        _column: &Ident,
        _ty: &Ident,
    ) -> Option<String> {
        None
    }

    fn enum_constraint_drop(
        &self,
        _schema: &Ident,
        _table: &Ident,
        _column: &Ident,
    ) -> Option<String> {
        None
    }

    fn enum_dependency_release(
        &self,
        schema: &Ident,
        table: &Ident,
        column: &Ident,
        _ty: &EnumType,
    ) -> String {
        let column = self.column_name(column);
        format!(
            "ALTER TABLE {} ALTER COLUMN {column} TYPE text USING {column}::text;",
            self.table_name(schema, table)
        )
    }

    fn enum_dependency_restore(
        &self,
        schema: &Ident,
        table: &Ident,
        column: &Ident,
        ty: &EnumType,
    ) -> String {
        let column = self.column_name(column);
        let type_name = self.type_name(schema, &ty.name);
        format!(
            "ALTER TABLE {} ALTER COLUMN {column} TYPE {type_name} USING {column}::text::{type_name};",
            self.table_name(schema, table)
        )
    }

    fn create_sequence(&self, schema: &Ident, sequence: &Sequence) -> Vec<String> {
        vec![format!(
            "CREATE SEQUENCE {}{};",
            self.qualified(schema, &sequence.name, IdentKind::Object),
            self.sequence_options(sequence, false)
        )]
    }

    fn alter_sequence(&self, schema: &Ident, _old: &Sequence, new: &Sequence) -> Vec<String> {
        vec![format!(
            "ALTER SEQUENCE {}{};",
            self.qualified(schema, &new.name, IdentKind::Object),
            self.sequence_options(new, true)
        )]
    }

    fn rename_sequence(&self, schema: &Ident, old: &Ident, new: &Ident) -> String {
        format!(
            "ALTER SEQUENCE {} RENAME TO {};",
            self.qualified(schema, old, IdentKind::Object),
            self.quoted(new.as_str(), IdentKind::Object)
        )
    }

    fn drop_sequence(&self, schema: &Ident, sequence: &Ident) -> String {
        format!(
            "DROP SEQUENCE {};",
            self.qualified(schema, sequence, IdentKind::Object)
        )
    }
}
