//! Replication identifier consistency checks.
//!
//! Tables, sequence-backed columns and standalone sequences may carry a
//! replication id. Within one document table ids are unique among tables,
//! and column ids share a single registry with standalone sequence ids.
//! Across an upgrade the id of a logical entity must not change unless one
//! side is [`ReplicationId::Exempt`]. The sentinel is still registered, so
//! it may appear at most once per registry.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DiffError, Result};
use crate::ident::Ident;
use crate::schema::{Column, Database, Schema, Sequence, Table};

const EXEMPT: &str = "IGNORE_REQUIRED";

/// A replication identifier, or the exempt sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawReplicationId", into = "RawReplicationId")]
pub enum ReplicationId {
    /// A numeric id.
    Id(u32),
    /// `IGNORE_REQUIRED`: exempt from the stability check.
    Exempt,
}

impl fmt::Display for ReplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Exempt => f.write_str(EXEMPT),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawReplicationId {
    Number(u32),
    Text(String),
}

impl TryFrom<RawReplicationId> for ReplicationId {
    type Error = String;

    fn try_from(raw: RawReplicationId) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawReplicationId::Number(id) => Ok(Self::Id(id)),
            RawReplicationId::Text(text) if text.eq_ignore_ascii_case(EXEMPT) => Ok(Self::Exempt),
            RawReplicationId::Text(text) => text
                .trim()
                .parse()
                .map(Self::Id)
                .map_err(|_| format!("invalid replication id '{text}'")),
        }
    }
}

impl From<ReplicationId> for RawReplicationId {
    fn from(id: ReplicationId) -> Self {
        match id {
            ReplicationId::Id(id) => Self::Number(id),
            ReplicationId::Exempt => Self::Text(EXEMPT.to_string()),
        }
    }
}

/// The kind of entity a replication id is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdCategory {
    /// A table.
    Table,
    /// The sequence behind a serial column.
    ColumnSequence,
    /// A standalone sequence.
    Sequence,
}

impl IdCategory {
    /// Name of the registry ids of this category are unique within.
    #[must_use]
    pub fn registry(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::ColumnSequence | Self::Sequence => "sequence",
        }
    }
}

impl fmt::Display for IdCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::ColumnSequence => "column sequence",
            Self::Sequence => "sequence",
        })
    }
}

/// Ids seen so far in one document.
#[derive(Debug, Default)]
pub struct IdRegistry {
    tables: HashSet<ReplicationId>,
    sequences: HashSet<ReplicationId>,
}

impl IdRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an id, failing if its registry already holds it.
    pub fn register(&mut self, category: IdCategory, id: ReplicationId) -> Result<()> {
        let registry = match category {
            IdCategory::Table => &mut self.tables,
            IdCategory::ColumnSequence | IdCategory::Sequence => &mut self.sequences,
        };
        if registry.insert(id) {
            Ok(())
        } else {
            Err(DiffError::DuplicateReplicationId { category, id })
        }
    }
}

/// Validates replication ids for a build (`old` absent) or an upgrade.
///
/// Each document gets a fresh registry. The first violation in scan order
/// (tables, then columns, then sequences) is returned.
pub fn validate(old: Option<&Database>, new: &Database, ignore_old_names: bool) -> Result<()> {
    if let Some(old) = old {
        Walker::new(old, None, ignore_old_names).run()?;
    }
    Walker::new(new, old, ignore_old_names).run()?;
    debug!(upgrade = old.is_some(), "replication ids validated");
    Ok(())
}

struct Walker<'a> {
    db: &'a Database,
    old: Option<&'a Database>,
    ignore_old_names: bool,
    registry: IdRegistry,
}

impl<'a> Walker<'a> {
    fn new(db: &'a Database, old: Option<&'a Database>, ignore_old_names: bool) -> Self {
        Self {
            db,
            old,
            ignore_old_names,
            registry: IdRegistry::new(),
        }
    }

    fn run(mut self) -> Result<()> {
        let db = self.db;
        for schema in &db.schemas {
            for table in &schema.tables {
                let old = self.old_table(schema, table).and_then(|t| t.replication_id);
                self.check(IdCategory::Table, table.replication_id, old)?;
            }
        }
        for schema in &db.schemas {
            for table in &schema.tables {
                let old_table = self.old_table(schema, table);
                for column in &table.columns {
                    let old = old_table
                        .and_then(|t| self.old_column(t, column))
                        .and_then(|c| c.replication_id);
                    self.check(IdCategory::ColumnSequence, column.replication_id, old)?;
                }
            }
        }
        for schema in &db.schemas {
            for sequence in &schema.sequences {
                let old = self
                    .old_sequence(schema, sequence)
                    .and_then(|s| s.replication_id);
                self.check(IdCategory::Sequence, sequence.replication_id, old)?;
            }
        }
        Ok(())
    }

    fn check(
        &mut self,
        category: IdCategory,
        new: Option<ReplicationId>,
        old: Option<ReplicationId>,
    ) -> Result<()> {
        let Some(new) = new else {
            return Ok(());
        };
        self.registry.register(category, new)?;
        match (new, old) {
            (ReplicationId::Id(a), Some(old @ ReplicationId::Id(b))) if a != b => {
                Err(DiffError::ReplicationIdMismatch { category, new, old })
            }
            _ => Ok(()),
        }
    }

    fn old_table(&self, schema: &Schema, table: &Table) -> Option<&'a Table> {
        let old_schema = self.old?.get_schema(&schema.name)?;
        self.previous_name(table.old_name.as_ref())
            .and_then(|name| old_schema.get_table(name))
            .or_else(|| old_schema.get_table(&table.name))
    }

    fn old_column(&self, old_table: &'a Table, column: &Column) -> Option<&'a Column> {
        self.previous_name(column.old_name.as_ref())
            .and_then(|name| old_table.get_column(name))
            .or_else(|| old_table.get_column(&column.name))
    }

    fn old_sequence(&self, schema: &Schema, sequence: &Sequence) -> Option<&'a Sequence> {
        let old_schema = self.old?.get_schema(&schema.name)?;
        let find = |name: &Ident| old_schema.sequences.iter().find(|s| &s.name == name);
        self.previous_name(sequence.old_name.as_ref())
            .and_then(find)
            .or_else(|| find(&sequence.name))
    }

    fn previous_name<'n>(&self, old_name: Option<&'n Ident>) -> Option<&'n Ident> {
        if self.ignore_old_names {
            None
        } else {
            old_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exempt_is_registered_like_any_id() {
        let mut registry = IdRegistry::new();
        registry
            .register(IdCategory::Table, ReplicationId::Exempt)
            .unwrap();
        registry
            .register(IdCategory::Sequence, ReplicationId::Exempt)
            .unwrap();
        let err = registry
            .register(IdCategory::Table, ReplicationId::Exempt)
            .unwrap_err();
        assert!(matches!(
            err,
            DiffError::DuplicateReplicationId {
                category: IdCategory::Table,
                id: ReplicationId::Exempt
            }
        ));
    }

    #[test]
    fn test_column_and_sequence_share_registry() {
        let mut registry = IdRegistry::new();
        registry
            .register(IdCategory::Table, ReplicationId::Id(1))
            .unwrap();
        registry
            .register(IdCategory::ColumnSequence, ReplicationId::Id(1))
            .unwrap();
        let err = registry
            .register(IdCategory::Sequence, ReplicationId::Id(1))
            .unwrap_err();
        assert!(matches!(
            err,
            DiffError::DuplicateReplicationId {
                category: IdCategory::Sequence,
                id: ReplicationId::Id(1)
            }
        ));
    }

    #[test]
    fn test_parse_sentinel_and_numbers() {
        let ids: Vec<ReplicationId> =
            serde_json::from_str(r#"[7, "8", "IGNORE_REQUIRED"]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                ReplicationId::Id(7),
                ReplicationId::Id(8),
                ReplicationId::Exempt
            ]
        );
        assert!(serde_json::from_str::<ReplicationId>(r#""seven""#).is_err());
        assert_eq!(
            serde_json::to_string(&ReplicationId::Exempt).unwrap(),
            r#""IGNORE_REQUIRED""#
        );
    }

    #[test]
    fn test_rename_keeps_identity() {
        let old = Database::new()
            .schema(Schema::new("app").table(Table::new("a").replication_id(ReplicationId::Id(3))));
        let new = Database::new().schema(
            Schema::new("app").table(
                Table::new("b")
                    .renamed_from("a")
                    .replication_id(ReplicationId::Id(4)),
            ),
        );
        let err = validate(Some(&old), &new, false).unwrap_err();
        assert!(matches!(err, DiffError::ReplicationIdMismatch { .. }));
        // Without rename tracking "b" is a new table.
        validate(Some(&old), &new, true).unwrap();
    }
}
