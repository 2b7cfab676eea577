//! Declarative schema object model.
//!
//! A [`Database`] is loaded once per generation run and is read-only to the
//! diff engine. Names are [`Ident`]s, so every lookup here is
//! case-insensitive.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dialect::DialectKind;
use crate::error::{DiffError, Result};
use crate::ident::Ident;
use crate::replication::ReplicationId;

/// Symbolic owner name, resolved through [`RoleMap`] at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub String);

impl Role {
    /// Creates a role reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Principals that the symbolic `ROLE_*` names resolve to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMap {
    /// Resolves `ROLE_OWNER`.
    pub owner: Option<String>,
    /// Resolves `ROLE_APPLICATION`.
    pub application: Option<String>,
    /// Resolves `ROLE_READONLY`.
    pub readonly: Option<String>,
    /// Resolves `ROLE_REPLICATION`.
    pub replication: Option<String>,
}

impl RoleMap {
    /// Resolves a role to the principal name used in SQL.
    ///
    /// Unknown symbols and unset slots resolve to themselves.
    #[must_use]
    pub fn resolve<'a>(&'a self, role: &'a Role) -> &'a str {
        let slot = match role.0.as_str() {
            "ROLE_OWNER" => &self.owner,
            "ROLE_APPLICATION" => &self.application,
            "ROLE_READONLY" => &self.readonly,
            "ROLE_REPLICATION" => &self.replication,
            _ => return &role.0,
        };
        slot.as_deref().unwrap_or(&role.0)
    }
}

/// A complete schema document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    /// Role resolution table.
    #[serde(default)]
    pub roles: RoleMap,
    /// Schemas in document order.
    #[serde(default)]
    pub schemas: Vec<Schema>,
}

impl Database {
    /// Creates an empty database document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the role map.
    #[must_use]
    pub fn roles(mut self, roles: RoleMap) -> Self {
        self.roles = roles;
        self
    }

    /// Adds a schema.
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Gets a schema by name.
    #[must_use]
    pub fn get_schema(&self, name: &Ident) -> Option<&Schema> {
        self.schemas.iter().find(|s| &s.name == name)
    }

    /// Checks the structural invariants of every schema.
    pub fn validate(&self, is_builtin_type: impl Fn(&str) -> bool) -> Result<()> {
        for schema in &self.schemas {
            schema.validate(&is_builtin_type)?;
        }
        Ok(())
    }
}

/// A named container of tables, views, triggers, types and sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name.
    pub name: Ident,
    /// Owner role.
    #[serde(default)]
    pub owner: Option<Role>,
    /// Tables in declaration order.
    #[serde(default)]
    pub tables: Vec<Table>,
    /// Views in declaration order.
    #[serde(default)]
    pub views: Vec<View>,
    /// Triggers in declaration order.
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    /// Enumerated types.
    #[serde(default)]
    pub types: Vec<EnumType>,
    /// Standalone sequences.
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            tables: Vec::new(),
            views: Vec::new(),
            triggers: Vec::new(),
            types: Vec::new(),
            sequences: Vec::new(),
        }
    }

    /// Sets the owner role.
    #[must_use]
    pub fn owner(mut self, role: impl Into<String>) -> Self {
        self.owner = Some(Role::new(role));
        self
    }

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Adds a view.
    #[must_use]
    pub fn view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    /// Adds a trigger.
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Adds an enumerated type.
    #[must_use]
    pub fn enum_type(mut self, ty: EnumType) -> Self {
        self.types.push(ty);
        self
    }

    /// Adds a sequence.
    #[must_use]
    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    /// Gets a table by name.
    #[must_use]
    pub fn get_table(&self, name: &Ident) -> Option<&Table> {
        self.tables.iter().find(|t| &t.name == name)
    }

    /// Gets a view by name.
    #[must_use]
    pub fn get_view(&self, name: &Ident) -> Option<&View> {
        self.views.iter().find(|v| &v.name == name)
    }

    /// Gets a trigger by name.
    #[must_use]
    pub fn get_trigger(&self, name: &Ident) -> Option<&Trigger> {
        self.triggers.iter().find(|t| &t.name == name)
    }

    /// Gets an enumerated type by name.
    #[must_use]
    pub fn get_type(&self, name: &Ident) -> Option<&EnumType> {
        self.types.iter().find(|t| &t.name == name)
    }

    /// Resolves a column type name to a type defined in this schema.
    ///
    /// Accepts both `type` and `schema.type` spellings.
    #[must_use]
    pub fn resolve_type(&self, type_name: &str) -> Option<&EnumType> {
        let bare = match type_name.split_once('.') {
            Some((schema, ty)) if self.name.matches(schema.trim_matches('"')) => ty,
            Some(_) => return None,
            None => type_name,
        };
        let bare = bare.trim_matches('"');
        self.types.iter().find(|t| t.name.matches(bare))
    }

    /// Checks primary keys and column type resolution.
    pub fn validate(&self, is_builtin_type: impl Fn(&str) -> bool) -> Result<()> {
        for table in &self.tables {
            for pk in &table.primary_key {
                if table.get_column(pk).is_none() {
                    return Err(DiffError::UnknownPrimaryKeyColumn {
                        schema: self.name.to_string(),
                        table: table.name.to_string(),
                        column: pk.to_string(),
                    });
                }
            }
            for column in &table.columns {
                if !is_builtin_type(&column.type_name)
                    && self.resolve_type(&column.type_name).is_none()
                {
                    return Err(DiffError::UnresolvedColumnType {
                        schema: self.name.to_string(),
                        table: table.name.to_string(),
                        column: column.name.to_string(),
                        type_name: column.type_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: Ident,
    /// Name this table had in an earlier release.
    #[serde(default, alias = "oldTableName")]
    pub old_name: Option<Ident>,
    /// Columns in declaration order.
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Primary key column names.
    #[serde(default)]
    pub primary_key: Vec<Ident>,
    /// Owner role.
    #[serde(default)]
    pub owner: Option<Role>,
    /// Replication identifier.
    #[serde(default)]
    pub replication_id: Option<ReplicationId>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            old_name: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            owner: None,
            replication_id: None,
        }
    }

    /// Marks this table as the renamed successor of `old_name`.
    #[must_use]
    pub fn renamed_from(mut self, old_name: impl Into<Ident>) -> Self {
        self.old_name = Some(old_name.into());
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Ident>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the owner role.
    #[must_use]
    pub fn owner(mut self, role: impl Into<String>) -> Self {
        self.owner = Some(Role::new(role));
        self
    }

    /// Sets the replication identifier.
    #[must_use]
    pub fn replication_id(mut self, id: ReplicationId) -> Self {
        self.replication_id = Some(id);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &Ident) -> Option<&Column> {
        self.columns.iter().find(|c| &c.name == name)
    }
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: Ident,
    /// Name this column had in an earlier release.
    #[serde(default, alias = "oldColumnName")]
    pub old_name: Option<Ident>,
    /// Declared type: a built-in type or a type of the same schema.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether NULL is allowed.
    #[serde(default = "default_nullable", alias = "null")]
    pub nullable: bool,
    /// Default expression, verbatim SQL.
    #[serde(default)]
    pub default: Option<String>,
    /// Replication identifier of the sequence backing this column.
    #[serde(default)]
    pub replication_id: Option<ReplicationId>,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    /// Creates a nullable column without a default.
    #[must_use]
    pub fn new(name: impl Into<Ident>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            old_name: None,
            type_name: type_name.into(),
            nullable: true,
            default: None,
            replication_id: None,
        }
    }

    /// Marks this column as the renamed successor of `old_name`.
    #[must_use]
    pub fn renamed_from(mut self, old_name: impl Into<Ident>) -> Self {
        self.old_name = Some(old_name.into());
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the column as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the default expression.
    #[must_use]
    pub fn default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Sets the replication identifier.
    #[must_use]
    pub fn replication_id(mut self, id: ReplicationId) -> Self {
        self.replication_id = Some(id);
        self
    }
}

/// A view definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// View name.
    pub name: Ident,
    /// Owner role.
    #[serde(default)]
    pub owner: Option<Role>,
    /// Query used when no dialect override exists.
    pub query: String,
    /// Per-dialect query overrides.
    #[serde(default)]
    pub dialect_queries: BTreeMap<DialectKind, String>,
}

impl View {
    /// Creates a view.
    #[must_use]
    pub fn new(name: impl Into<Ident>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            query: query.into(),
            dialect_queries: BTreeMap::new(),
        }
    }

    /// Sets the owner role.
    #[must_use]
    pub fn owner(mut self, role: impl Into<String>) -> Self {
        self.owner = Some(Role::new(role));
        self
    }

    /// Overrides the query for one dialect.
    #[must_use]
    pub fn query_for(mut self, dialect: DialectKind, query: impl Into<String>) -> Self {
        self.dialect_queries.insert(dialect, query.into());
        self
    }

    /// The query text rendered for `dialect`, trimmed of a trailing `;`.
    #[must_use]
    pub fn rendered_query(&self, dialect: DialectKind) -> &str {
        self.dialect_queries
            .get(&dialect)
            .unwrap_or(&self.query)
            .trim()
            .trim_end_matches(';')
            .trim_end()
    }
}

/// When a trigger fires relative to its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerTiming {
    /// Before the row change.
    #[serde(rename = "BEFORE", alias = "before", alias = "Before")]
    Before,
    /// After the row change.
    #[serde(rename = "AFTER", alias = "after", alias = "After")]
    After,
}

impl TriggerTiming {
    /// SQL keyword.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
        }
    }
}

/// Per-row or per-statement firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerGranularity {
    /// Once per affected row.
    #[serde(rename = "ROW", alias = "row", alias = "Row")]
    Row,
    /// Once per statement.
    #[serde(rename = "STATEMENT", alias = "statement", alias = "Statement")]
    Statement,
}

impl TriggerGranularity {
    /// SQL keyword.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Row => "ROW",
            Self::Statement => "STATEMENT",
        }
    }
}

/// A trigger definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name.
    pub name: Ident,
    /// Owning table, in the same schema.
    pub table: Ident,
    /// Firing timing.
    #[serde(alias = "when")]
    pub timing: TriggerTiming,
    /// Event list as written, e.g. `"INSERT, UPDATE"`.
    pub event: String,
    /// Row or statement granularity.
    #[serde(default, alias = "forEach")]
    pub for_each: Option<TriggerGranularity>,
    /// Bound function or procedure call.
    pub function: String,
}

impl Trigger {
    /// Creates a trigger without granularity.
    #[must_use]
    pub fn new(
        name: impl Into<Ident>,
        table: impl Into<Ident>,
        timing: TriggerTiming,
        event: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            timing,
            event: event.into(),
            for_each: None,
            function: function.into(),
        }
    }

    /// Sets the granularity.
    #[must_use]
    pub fn for_each(mut self, granularity: TriggerGranularity) -> Self {
        self.for_each = Some(granularity);
        self
    }

    /// Events in written order, split on commas and whitespace.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.event
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|chunk| !chunk.is_empty() && !chunk.eq_ignore_ascii_case("or"))
    }

    /// Events as a set, for order-insensitive comparison.
    #[must_use]
    pub fn event_set(&self) -> BTreeSet<Ident> {
        self.events().map(Ident::new).collect()
    }
}

/// An enumerated type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    /// Type name.
    pub name: Ident,
    /// Labels in order.
    pub values: Vec<String>,
}

impl EnumType {
    /// Creates an enumerated type.
    #[must_use]
    pub fn new<I, S>(name: impl Into<Ident>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A standalone sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: Ident,
    /// Name this sequence had in an earlier release.
    #[serde(default, alias = "oldSequenceName")]
    pub old_name: Option<Ident>,
    /// First value.
    #[serde(default)]
    pub start: Option<i64>,
    /// Step.
    #[serde(default)]
    pub increment: Option<i64>,
    /// Lower bound.
    #[serde(default)]
    pub min_value: Option<i64>,
    /// Upper bound.
    #[serde(default)]
    pub max_value: Option<i64>,
    /// Values preallocated per session.
    #[serde(default)]
    pub cache: Option<i64>,
    /// Whether the sequence wraps around.
    #[serde(default)]
    pub cycle: bool,
    /// Owner role.
    #[serde(default)]
    pub owner: Option<Role>,
    /// Replication identifier.
    #[serde(default)]
    pub replication_id: Option<ReplicationId>,
}

impl Sequence {
    /// Creates a sequence with database defaults.
    #[must_use]
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            old_name: None,
            start: None,
            increment: None,
            min_value: None,
            max_value: None,
            cache: None,
            cycle: false,
            owner: None,
            replication_id: None,
        }
    }

    /// Marks this sequence as the renamed successor of `old_name`.
    #[must_use]
    pub fn renamed_from(mut self, old_name: impl Into<Ident>) -> Self {
        self.old_name = Some(old_name.into());
        self
    }

    /// Sets the start value.
    #[must_use]
    pub fn start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the increment.
    #[must_use]
    pub fn increment(mut self, increment: i64) -> Self {
        self.increment = Some(increment);
        self
    }

    /// Sets the bounds.
    #[must_use]
    pub fn bounds(mut self, min_value: i64, max_value: i64) -> Self {
        self.min_value = Some(min_value);
        self.max_value = Some(max_value);
        self
    }

    /// Sets the cache size.
    #[must_use]
    pub fn cache(mut self, cache: i64) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Makes the sequence cycle.
    #[must_use]
    pub fn cycle(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Sets the owner role.
    #[must_use]
    pub fn owner(mut self, role: impl Into<String>) -> Self {
        self.owner = Some(Role::new(role));
        self
    }

    /// Sets the replication identifier.
    #[must_use]
    pub fn replication_id(mut self, id: ReplicationId) -> Self {
        self.replication_id = Some(id);
        self
    }

    /// Whether the generation parameters differ.
    #[must_use]
    pub fn parameters_differ(&self, other: &Self) -> bool {
        self.start != other.start
            || self.increment != other.increment
            || self.min_value != other.min_value
            || self.max_value != other.max_value
            || self.cache != other.cache
            || self.cycle != other.cycle
    }
}
