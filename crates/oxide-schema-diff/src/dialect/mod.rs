//! Database dialect implementations.
//!
//! Each dialect turns schema entities into statement text for one database
//! family. Dialects never touch a connection; the diff strategies decide
//! *what* changes and the dialect decides how it is spelled.

mod mssql;
mod mysql;
mod postgres;

pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ident::Ident;
use crate::options::{IdentKind, QuotePolicy};
use crate::schema::{Column, EnumType, Schema, Sequence, Table, Trigger, View};

/// Supported dialect families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DialectKind {
    /// PostgreSQL 8 and later.
    #[serde(rename = "pgsql8", alias = "postgres", alias = "postgresql")]
    Postgres,
    /// MySQL 5 and later.
    #[serde(rename = "mysql5", alias = "mysql")]
    Mysql,
    /// SQL Server 2008 and later.
    #[serde(rename = "mssql10", alias = "mssql")]
    Mssql,
}

impl DialectKind {
    /// Format name, as used on the command line and in view overrides.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Postgres => "pgsql8",
            Self::Mysql => "mysql5",
            Self::Mssql => "mssql10",
        }
    }

    /// Creates the dialect with the given quoting policy.
    #[must_use]
    pub fn dialect(self, quoting: QuotePolicy) -> Box<dyn SqlDialect> {
        match self {
            Self::Postgres => Box::new(PostgresDialect::new(quoting)),
            Self::Mysql => Box::new(MysqlDialect::new(quoting)),
            Self::Mssql => Box::new(MssqlDialect::new(quoting)),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column type after resolution against its schema.
#[derive(Debug, Clone, Copy)]
pub enum ColumnType<'a> {
    /// A type the database knows natively, as written.
    Builtin(&'a str),
    /// An enumerated type defined in the schema.
    Enum {
        /// Schema defining the type.
        schema: &'a Ident,
        /// The type.
        ty: &'a EnumType,
    },
}

impl<'a> ColumnType<'a> {
    /// Resolves `type_name` in `schema`, falling back to a built-in type.
    #[must_use]
    pub fn resolve(schema: &'a Schema, type_name: &'a str) -> Self {
        match schema.resolve_type(type_name) {
            Some(ty) => Self::Enum {
                schema: &schema.name,
                ty,
            },
            None => Self::Builtin(type_name),
        }
    }

    /// The enumerated type, if any.
    #[must_use]
    pub fn enum_type(&self) -> Option<&'a EnumType> {
        match self {
            Self::Enum { ty, .. } => Some(ty),
            Self::Builtin(_) => None,
        }
    }

    /// Whether this is an auto-increment integer type.
    #[must_use]
    pub fn is_serial(&self) -> bool {
        matches!(self, Self::Builtin(name) if serial_base(name).is_some())
    }

    /// Comparison key: serial types compare equal to their integer base.
    #[must_use]
    pub fn normalized(&self) -> String {
        match self {
            Self::Builtin(name) => normalize_type(name),
            Self::Enum { schema, ty } => format!("{}.{}", schema.key(), ty.name.key()),
        }
    }
}

/// A column definition ready to render.
#[derive(Debug, Clone)]
pub struct ColumnDef<'a> {
    /// The column, possibly with attributes adjusted by the caller.
    pub column: Column,
    /// Its resolved type.
    pub ty: ColumnType<'a>,
}

impl<'a> ColumnDef<'a> {
    /// Creates a definition for `column` resolved in `schema`.
    #[must_use]
    pub fn new(schema: &'a Schema, column: &'a Column) -> Self {
        Self {
            column: column.clone(),
            ty: ColumnType::resolve(schema, &column.type_name),
        }
    }

    /// Whether the rendered column rejects NULL.
    #[must_use]
    pub fn not_null(&self) -> bool {
        !self.column.nullable
    }
}

/// Where an added column goes, for dialects that position columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    /// Before every existing column.
    First,
    /// Right after the named column.
    After(Ident),
}

/// Attribute changes carried by [`AlterAction::ModifyColumn`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDelta {
    /// The native type changed.
    pub type_changed: bool,
    /// New nullability, when it changed.
    pub nullable: Option<bool>,
    /// New default (`None` inside means dropped), when it changed.
    pub default: Option<Option<String>>,
    /// The column had a default before this change.
    pub had_default: bool,
}

impl ColumnDelta {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.type_changed && self.nullable.is_none() && self.default.is_none()
    }
}

/// One column-level change inside an `ALTER TABLE`.
#[derive(Debug, Clone)]
pub enum AlterAction<'a> {
    /// Add a column.
    AddColumn {
        /// Definition of the new column.
        def: ColumnDef<'a>,
        /// Requested position.
        position: ColumnPosition,
    },
    /// Drop a column.
    DropColumn {
        /// The column as it was.
        column: Column,
    },
    /// Rename a column.
    RenameColumn {
        /// Previous name.
        from: Ident,
        /// Definition under the new name.
        def: ColumnDef<'a>,
        /// Whether the column had a default under its previous name.
        had_default: bool,
    },
    /// Change type, nullability and default of a column.
    ModifyColumn {
        /// Full new definition.
        def: ColumnDef<'a>,
        /// What changed.
        delta: ColumnDelta,
    },
    /// Set a column default.
    SetDefault {
        /// Column name.
        column: Ident,
        /// Default expression.
        expr: String,
        /// The column already had a default.
        replacing: bool,
    },
    /// Drop a column default.
    DropDefault {
        /// Column name.
        column: Ident,
    },
}

/// Objects that carry an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedObject {
    /// A schema.
    Schema,
    /// A table.
    Table,
    /// A view.
    View,
    /// A sequence.
    Sequence,
}

impl OwnedObject {
    /// SQL keyword.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Schema => "SCHEMA",
            Self::Table => "TABLE",
            Self::View => "VIEW",
            Self::Sequence => "SEQUENCE",
        }
    }
}

/// Trait for database-specific DDL generation.
pub trait SqlDialect: Send + Sync {
    /// Returns the dialect family.
    fn kind(&self) -> DialectKind;

    /// Returns the dialect name.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns the quoting policy.
    fn quoting(&self) -> &QuotePolicy;

    /// Quotes an identifier unconditionally, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String;

    /// Quotes an identifier if the policy or its spelling requires it.
    fn quoted(&self, name: &str, kind: IdentKind) -> String {
        if self.quoting().quotes(kind) || needs_quoting(name) {
            self.quote_identifier(name)
        } else {
            name.to_string()
        }
    }

    /// Renders `schema.name`.
    fn qualified(&self, schema: &Ident, name: &Ident, kind: IdentKind) -> String {
        format!(
            "{}.{}",
            self.quoted(schema.as_str(), IdentKind::Schema),
            self.quoted(name.as_str(), kind)
        )
    }

    /// Renders a qualified table name.
    fn table_name(&self, schema: &Ident, table: &Ident) -> String {
        self.qualified(schema, table, IdentKind::Table)
    }

    /// Renders a column name.
    fn column_name(&self, column: &Ident) -> String {
        self.quoted(column.as_str(), IdentKind::Column)
    }

    /// Renders a string literal.
    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Renders a boolean literal.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Returns whether enumerated types can be altered in place.
    fn supports_enum_alteration(&self) -> bool {
        false
    }

    /// Returns whether added columns can be positioned.
    fn supports_column_positioning(&self) -> bool {
        false
    }

    /// Returns whether the database has native sequences.
    fn supports_sequences(&self) -> bool {
        true
    }

    /// Returns whether enumerated types are native database types.
    fn native_enum_types(&self) -> bool {
        false
    }

    /// Returns whether a column rename also redefines the column.
    fn rename_carries_definition(&self) -> bool {
        false
    }

    /// Returns whether `type_name` is a built-in type of this dialect.
    fn is_builtin_type(&self, type_name: &str) -> bool {
        is_builtin_type(type_name)
    }

    /// Maps a resolved column type to native syntax.
    fn native_type(&self, ty: &ColumnType<'_>) -> String;

    /// Value written into NULL rows before a column becomes NOT NULL.
    fn zero_value(&self, ty: &ColumnType<'_>) -> String {
        match ty {
            ColumnType::Enum { ty, .. } => ty
                .values
                .first()
                .map_or_else(|| "''".to_string(), |v| self.string_literal(v)),
            ColumnType::Builtin(name) => match zero_value_for(name) {
                ZeroValue::Boolean => self.boolean_literal(false).to_string(),
                ZeroValue::Literal(literal) => literal.to_string(),
            },
        }
    }

    /// Generates column definition SQL.
    fn column_definition(&self, _table: &Ident, def: &ColumnDef<'_>) -> String {
        let mut sql = format!(
            "{} {}",
            self.column_name(&def.column.name),
            self.native_type(&def.ty)
        );
        if def.not_null() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &def.column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }

    /// Renders the inline primary key clause of `CREATE TABLE`.
    fn primary_key_clause(&self, _table: &Ident, columns: &[Ident]) -> String {
        format!("PRIMARY KEY ({})", self.column_list(columns))
    }

    /// Renders a comma separated column list.
    fn column_list(&self, columns: &[Ident]) -> String {
        columns
            .iter()
            .map(|c| self.column_name(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Generates SQL for creating a schema.
    fn create_schema(&self, schema: &Ident) -> String {
        format!(
            "CREATE SCHEMA {};",
            self.quoted(schema.as_str(), IdentKind::Schema)
        )
    }

    /// Generates SQL for dropping a schema.
    fn drop_schema(&self, schema: &Ident) -> String {
        format!(
            "DROP SCHEMA {};",
            self.quoted(schema.as_str(), IdentKind::Schema)
        )
    }

    /// Generates SQL for changing an owner, if the dialect tracks owners.
    fn alter_owner(&self, _object: OwnedObject, _name: &str, _role: &str) -> Option<String> {
        None
    }

    /// Generates SQL for creating a table with all columns inline.
    fn create_table(&self, schema: &Ident, table: &Table, columns: &[ColumnDef<'_>]) -> String {
        let mut parts: Vec<String> = columns
            .iter()
            .map(|c| self.column_definition(&table.name, c))
            .collect();
        if !table.primary_key.is_empty() {
            parts.push(self.primary_key_clause(&table.name, &table.primary_key));
        }
        format!(
            "CREATE TABLE {} (\n  {}\n);",
            self.table_name(schema, &table.name),
            parts.join(",\n  ")
        )
    }

    /// Generates SQL for dropping a table.
    fn drop_table(&self, schema: &Ident, table: &Ident) -> String {
        format!("DROP TABLE {};", self.table_name(schema, table))
    }

    /// Generates SQL for renaming a table within its schema.
    fn rename_table(&self, schema: &Ident, old: &Ident, new: &Ident) -> String;

    /// Renames objects whose names derive from the table name, following
    /// a rename of `old` to `new`.
    fn rename_table_dependents(
        &self,
        _schema: &Ident,
        _old: &Table,
        _new: &Ident,
    ) -> Vec<String> {
        Vec::new()
    }

    /// Generates SQL for a batch of column changes on one table.
    fn alter_table(&self, schema: &Ident, table: &Ident, actions: &[AlterAction<'_>])
        -> Vec<String>;

    /// Name of the primary key constraint of `table`.
    fn primary_key_name(&self, table: &Ident) -> String {
        format!("{}_pkey", table.as_str())
    }

    /// Generates SQL for adding a primary key.
    fn add_primary_key(&self, schema: &Ident, table: &Ident, columns: &[Ident]) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({});",
            self.table_name(schema, table),
            self.quoted(&self.primary_key_name(table), IdentKind::Object),
            self.column_list(columns)
        )
    }

    /// Generates SQL for dropping the primary key created for `constraint_table`.
    fn drop_primary_key(&self, schema: &Ident, table: &Ident, constraint_table: &Ident) -> String {
        self.drop_constraint(schema, table, &self.primary_key_name(constraint_table))
    }

    /// Generates SQL for dropping a named constraint.
    fn drop_constraint(&self, schema: &Ident, table: &Ident, name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            self.table_name(schema, table),
            self.quoted(name, IdentKind::Object)
        )
    }

    /// Generates the row backfill run before a column becomes NOT NULL.
    fn backfill(&self, schema: &Ident, table: &Ident, column: &Ident, value: &str) -> String {
        let column = self.column_name(column);
        format!(
            "UPDATE {} SET {column} = {value} WHERE {column} IS NULL;",
            self.table_name(schema, table)
        )
    }

    /// Generates SQL for creating a view.
    fn create_view(&self, schema: &Ident, view: &View) -> String {
        format!(
            "CREATE VIEW {} AS {};",
            self.qualified(schema, &view.name, IdentKind::Object),
            view.rendered_query(self.kind())
        )
    }

    /// Generates SQL for dropping a view.
    fn drop_view(&self, schema: &Ident, view: &Ident) -> String {
        format!(
            "DROP VIEW {};",
            self.qualified(schema, view, IdentKind::Object)
        )
    }

    /// Generates SQL for creating a trigger.
    fn create_trigger(&self, schema: &Ident, trigger: &Trigger) -> Result<Vec<String>>;

    /// Generates SQL for dropping a trigger.
    fn drop_trigger(&self, schema: &Ident, trigger: &Trigger) -> Result<Vec<String>>;

    /// Generates SQL for creating an enumerated type.
    ///
    /// The default emulates the type with a lookup table holding one row per
    /// label.
    fn create_enum_type(&self, schema: &Ident, ty: &EnumType) -> Vec<String> {
        let mut statements = vec![format!(
            "CREATE TABLE {} (\n  {} varchar(255) NOT NULL PRIMARY KEY\n);",
            self.qualified(schema, &ty.name, IdentKind::Object),
            self.column_name(&Ident::new("value"))
        )];
        statements.extend(self.enum_values_insert(schema, ty));
        statements
    }

    /// Generates SQL for dropping an enumerated type.
    fn drop_enum_type(&self, schema: &Ident, ty: &EnumType) -> String {
        format!(
            "DROP TABLE {};",
            self.qualified(schema, &ty.name, IdentKind::Object)
        )
    }

    /// Generates SQL removing every label of a type.
    fn enum_values_delete(&self, schema: &Ident, ty: &EnumType) -> String {
        format!(
            "DELETE FROM {};",
            self.qualified(schema, &ty.name, IdentKind::Object)
        )
    }

    /// Generates SQL inserting the labels of a type, if it has any.
    fn enum_values_insert(&self, schema: &Ident, ty: &EnumType) -> Option<String> {
        if ty.values.is_empty() {
            return None;
        }
        let rows: Vec<String> = ty
            .values
            .iter()
            .map(|v| format!("({})", self.string_literal(v)))
            .collect();
        Some(format!(
            "INSERT INTO {} ({}) VALUES {};",
            self.qualified(schema, &ty.name, IdentKind::Object),
            self.column_name(&Ident::new("value")),
            rows.join(", ")
        ))
    }

    /// Name of the constraint tying `table.column` to its type.
    fn enum_constraint_name(&self, table: &Ident, column: &Ident) -> String {
        format!("{}_{}_fkey", table.as_str(), column.as_str())
    }

    /// Generates SQL tying a column to its enumerated type, if needed.
    fn enum_constraint_add(
        &self,
        schema: &Ident,
        table: &Ident,
        column: &Ident,
        ty: &Ident,
    ) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
            self.table_name(schema, table),
            self.quoted(&self.enum_constraint_name(table, column), IdentKind::Object),
            self.column_name(column),
            self.qualified(schema, ty, IdentKind::Object),
            self.column_name(&Ident::new("value"))
        ))
    }

    /// Generates SQL untying a column from its enumerated type, if needed.
    fn enum_constraint_drop(
        &self,
        schema: &Ident,
        table: &Ident,
        column: &Ident,
    ) -> Option<String> {
        Some(self.drop_constraint(schema, table, &self.enum_constraint_name(table, column)))
    }

    /// Generates SQL detaching a dependent column before its type is redefined.
    fn enum_dependency_release(
        &self,
        schema: &Ident,
        table: &Ident,
        column: &Ident,
        _ty: &EnumType,
    ) -> String {
        self.drop_constraint(schema, table, &self.enum_constraint_name(table, column))
    }

    /// Generates SQL reattaching a dependent column after its type is redefined.
    fn enum_dependency_restore(
        &self,
        schema: &Ident,
        table: &Ident,
        column: &Ident,
        ty: &EnumType,
    ) -> String {
        self.enum_constraint_add(schema, table, column, &ty.name)
            .unwrap_or_default()
    }

    /// Generates SQL for creating a sequence.
    fn create_sequence(&self, schema: &Ident, sequence: &Sequence) -> Vec<String>;

    /// Generates SQL for changing sequence parameters.
    fn alter_sequence(&self, schema: &Ident, old: &Sequence, new: &Sequence) -> Vec<String>;

    /// Generates SQL for renaming a sequence.
    fn rename_sequence(&self, schema: &Ident, old: &Ident, new: &Ident) -> String;

    /// Generates SQL for dropping a sequence.
    fn drop_sequence(&self, schema: &Ident, sequence: &Ident) -> String;
}

/// Whether an identifier must be quoted regardless of policy.
#[must_use]
pub fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => chars
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
        _ => false,
    };
    !plain || RESERVED_WORDS.contains(&name)
}

const RESERVED_WORDS: &[&str] = &[
    "all", "and", "as", "check", "column", "constraint", "create", "default", "desc", "distinct",
    "from", "group", "index", "key", "order", "primary", "references", "select", "table", "to",
    "user", "values", "where",
];

/// Lower-cased type name without length, precision or array suffix.
#[must_use]
pub fn base_type(type_name: &str) -> String {
    let lower = type_name.trim().to_lowercase();
    let without_args = match lower.find('(') {
        Some(open) => {
            let close = lower[open..].find(')').map_or(lower.len(), |i| open + i + 1);
            format!("{}{}", &lower[..open], &lower[close..])
        }
        None => lower,
    };
    without_args
        .trim_end_matches("[]")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The integer type behind a serial pseudo-type.
#[must_use]
pub fn serial_base(type_name: &str) -> Option<&'static str> {
    match base_type(type_name).as_str() {
        "serial" | "serial4" => Some("int"),
        "bigserial" | "serial8" => Some("bigint"),
        "smallserial" | "serial2" => Some("smallint"),
        _ => None,
    }
}

/// Comparison form of a type name: lower-cased, whitespace-collapsed, with
/// aliases and serial types folded onto their base type.
#[must_use]
pub fn normalize_type(type_name: &str) -> String {
    if let Some(base) = serial_base(type_name) {
        return base.to_string();
    }
    let lower = type_name
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" (", "(");
    let (name, args) = match lower.find('(') {
        Some(open) => lower.split_at(open),
        None => (lower.as_str(), ""),
    };
    let name = match name {
        "integer" | "int4" => "int",
        "int8" => "bigint",
        "int2" => "smallint",
        "bool" => "boolean",
        "character varying" => "varchar",
        "character" => "char",
        "float8" => "double precision",
        "timestamp without time zone" => "timestamp",
        "timestamp with time zone" => "timestamptz",
        other => other,
    };
    format!("{name}{args}")
}

const BUILTIN_TYPES: &[&str] = &[
    "bigint", "bigserial", "binary", "bit", "blob", "bool", "boolean", "bytea", "char",
    "character", "cidr", "date", "datetime", "datetime2", "datetimeoffset", "decimal", "double",
    "enum", "float", "float4", "float8", "image", "inet", "int", "int2", "int4", "int8", "integer",
    "interval", "json", "jsonb", "longblob", "longtext", "macaddr", "mediumint", "mediumtext",
    "money", "nchar", "ntext", "numeric", "nvarchar", "oid", "real", "serial", "serial2",
    "serial4", "serial8", "smalldatetime", "smallint", "smallmoney", "smallserial", "text",
    "time", "timestamp", "timestamptz", "tinyint", "tinytext", "uniqueidentifier", "uuid",
    "varbinary", "varchar", "xml", "year",
];

/// Whether `type_name` is a type every supported database understands by name.
#[must_use]
pub fn is_builtin_type(type_name: &str) -> bool {
    let base = base_type(type_name);
    let first_word = base.split(' ').next().unwrap_or_default();
    BUILTIN_TYPES.contains(&base.as_str()) || BUILTIN_TYPES.contains(&first_word)
}

/// Backfill value class of a built-in type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroValue {
    /// The dialect's false literal.
    Boolean,
    /// A literal usable in every dialect.
    Literal(&'static str),
}

/// Zero-equivalent value of a built-in type.
#[must_use]
pub fn zero_value_for(type_name: &str) -> ZeroValue {
    let base = base_type(type_name);
    let first_word = base.split(' ').next().unwrap_or_default();
    match first_word {
        "bool" | "boolean" => ZeroValue::Boolean,
        "bigint" | "bigserial" | "bit" | "decimal" | "double" | "float" | "float4" | "float8"
        | "int" | "int2" | "int4" | "int8" | "integer" | "mediumint" | "money" | "numeric"
        | "real" | "serial" | "smallint" | "smallmoney" | "smallserial" | "tinyint" | "year" => {
            ZeroValue::Literal("0")
        }
        "date" => ZeroValue::Literal("'1970-01-01'"),
        "time" => ZeroValue::Literal("'00:00:00'"),
        "datetime" | "datetime2" | "smalldatetime" | "timestamp" | "timestamptz" => {
            ZeroValue::Literal("'1970-01-01 00:00:00'")
        }
        "uuid" | "uniqueidentifier" => {
            ZeroValue::Literal("'00000000-0000-0000-0000-000000000000'")
        }
        _ => ZeroValue::Literal("''"),
    }
}

/// Splits a function reference into its name and argument list.
///
/// `"audit.log_change()"` yields `("audit.log_change", Some("()"))`.
#[must_use]
pub fn split_function_call(call: &str) -> (&str, Option<&str>) {
    let call = call.trim();
    match call.find('(') {
        Some(open) => (call[..open].trim_end(), Some(&call[open..])),
        None => (call, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_quoting() {
        assert!(!needs_quoting("users"));
        assert!(!needs_quoting("user_id2"));
        assert!(needs_quoting("Users"));
        assert!(needs_quoting("first name"));
        assert!(needs_quoting("2fa"));
        assert!(needs_quoting("table"));
        assert!(needs_quoting(""));
    }

    #[test]
    fn test_base_type() {
        assert_eq!(base_type("VARCHAR(100)"), "varchar");
        assert_eq!(base_type("character  varying(20)"), "character varying");
        assert_eq!(base_type("int[]"), "int");
        assert_eq!(base_type("numeric(10, 2)"), "numeric");
    }

    #[test]
    fn test_normalize_type_folds_aliases() {
        assert_eq!(normalize_type("serial"), "int");
        assert_eq!(normalize_type("INTEGER"), "int");
        assert_eq!(normalize_type("bigserial"), normalize_type("int8"));
        assert_eq!(normalize_type("character varying (20)"), "varchar(20)");
        assert_ne!(normalize_type("varchar(20)"), normalize_type("varchar(30)"));
    }

    #[test]
    fn test_builtin_types() {
        assert!(is_builtin_type("int"));
        assert!(is_builtin_type("double precision"));
        assert!(is_builtin_type("timestamp with time zone"));
        assert!(is_builtin_type("varchar(255)"));
        assert!(!is_builtin_type("mood"));
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(zero_value_for("text"), ZeroValue::Literal("''"));
        assert_eq!(zero_value_for("int"), ZeroValue::Literal("0"));
        assert_eq!(zero_value_for("numeric(10,2)"), ZeroValue::Literal("0"));
        assert_eq!(zero_value_for("boolean"), ZeroValue::Boolean);
        assert_eq!(zero_value_for("date"), ZeroValue::Literal("'1970-01-01'"));
    }

    #[test]
    fn test_split_function_call() {
        assert_eq!(split_function_call("audit()"), ("audit", Some("()")));
        assert_eq!(split_function_call("s.f ('x')"), ("s.f", Some("('x')")));
        assert_eq!(split_function_call("audit"), ("audit", None));
    }

    #[test]
    fn test_dialect_kind_serde_names() {
        let kind: DialectKind = serde_json::from_str("\"mysql5\"").unwrap();
        assert_eq!(kind, DialectKind::Mysql);
        assert_eq!(
            serde_json::to_string(&DialectKind::Mssql).unwrap(),
            "\"mssql10\""
        );
        assert_eq!(DialectKind::Postgres.to_string(), "pgsql8");
    }
}
