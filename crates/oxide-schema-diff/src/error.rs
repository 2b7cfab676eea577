//! Error types for schema diffing and DDL generation.

use std::path::PathBuf;

use crate::replication::{IdCategory, ReplicationId};

/// Errors that abort a generation run.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A trigger references a table that is not part of its schema.
    #[error("Failed to find trigger table {table} for trigger {trigger} in schema {schema}")]
    MissingTriggerTable {
        /// Owning schema.
        schema: String,
        /// Trigger name.
        trigger: String,
        /// Table the trigger claims to belong to.
        table: String,
    },

    /// A trigger lacks an attribute the active dialect requires.
    #[error(
        "Trigger {trigger} in schema {schema} must define '{attribute}' for {dialect} triggers"
    )]
    MissingTriggerAttribute {
        /// Owning schema.
        schema: String,
        /// Trigger name.
        trigger: String,
        /// Missing attribute.
        attribute: &'static str,
        /// Dialect that requires it.
        dialect: &'static str,
    },

    /// A trigger uses a feature the active dialect cannot express.
    #[error("Trigger {trigger} in schema {schema} is not supported by {dialect}: {reason}")]
    UnsupportedTrigger {
        /// Owning schema.
        schema: String,
        /// Trigger name.
        trigger: String,
        /// Dialect name.
        dialect: &'static str,
        /// What is unsupported.
        reason: String,
    },

    /// A primary key names a column the table does not have.
    #[error("Primary key column {column} of table {table} in schema {schema} does not exist")]
    UnknownPrimaryKeyColumn {
        /// Owning schema.
        schema: String,
        /// Table name.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A column type is neither built in nor defined in the schema.
    #[error(
        "Column {table}.{column} in schema {schema} has type {type_name}, \
         which is neither a built-in type nor a type defined in the schema"
    )]
    UnresolvedColumnType {
        /// Owning schema.
        schema: String,
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Declared type.
        type_name: String,
    },

    /// The same replication id appears twice within one registry.
    #[error(
        "{category} replication id {id} already registered in {} ids -- duplicates not allowed",
        .category.registry()
    )]
    DuplicateReplicationId {
        /// Category of the entity being registered.
        category: IdCategory,
        /// The colliding id.
        id: ReplicationId,
    },

    /// A logical entity changed its replication id between generations.
    #[error("{category} replication id {new} in new does not match replication id {old} in old")]
    ReplicationIdMismatch {
        /// Category of the entity.
        category: IdCategory,
        /// Id declared by the new schema.
        new: ReplicationId,
        /// Id declared by the old schema.
        old: ReplicationId,
    },

    /// Two new entities claim the same old entity.
    #[error(
        "Ambiguous rename in schema {schema}: {kind} {old_name} is claimed by both \
         {first} and {second}"
    )]
    AmbiguousRename {
        /// Owning schema (or table, for columns).
        schema: String,
        /// Entity kind.
        kind: &'static str,
        /// The contested old name.
        old_name: String,
        /// First claimant.
        first: String,
        /// Second claimant.
        second: String,
    },

    /// An entity declares its own name as its old name.
    #[error("{kind} {name} in schema {schema} declares itself as its old name")]
    SelfRename {
        /// Owning schema (or table, for columns).
        schema: String,
        /// Entity kind.
        kind: &'static str,
        /// Entity name.
        name: String,
    },

    /// IO error (reading documents, writing stage files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a schema document.
    #[error("Failed to parse schema document '{path}': {source}")]
    Document {
        /// Path to the document.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_json::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for diff operations.
pub type Result<T> = std::result::Result<T, DiffError>;
