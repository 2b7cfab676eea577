//! Declarative schema diffing and staged DDL generation.
//!
//! `oxide-schema-diff` compares two declarative schema documents and emits
//! the DDL that turns the first into the second, for PostgreSQL, MySQL or
//! SQL Server:
//! - Tables, columns, views, triggers, enumerated types and sequences are
//!   matched by name or through declared old names
//! - Statements are split into four ordered stages so that data can be
//!   backfilled before constraints tighten
//! - Replication identifiers are checked for uniqueness and stability
//!
//! # Architecture
//!
//! - **Schema** - The declarative object model, loaded from JSON
//! - **Diff** - The [`Generator`] and one strategy per entity kind
//! - **Dialect** - Database-specific statement text
//! - **Stage** - Where generated statements end up
//!
//! # Example
//!
//! ```rust
//! use oxide_schema_diff::prelude::*;
//!
//! let old = Database::new().schema(
//!     Schema::new("app").table(
//!         Table::new("users")
//!             .column(Column::new("id", "int").not_null())
//!             .primary_key(["id"]),
//!     ),
//! );
//! let new = Database::new().schema(
//!     Schema::new("app").table(
//!         Table::new("users")
//!             .column(Column::new("id", "int").not_null())
//!             .column(Column::new("email", "varchar(255)"))
//!             .primary_key(["id"]),
//!     ),
//! );
//!
//! let generator = Generator::new(DialectKind::Postgres, DiffOptions::default());
//! let mut out = StagedOutput::new();
//! generator.upgrade(&old, &new, &mut out).unwrap();
//!
//! assert_eq!(
//!     out.stage(Stage::Structure),
//!     ["ALTER TABLE app.users\n  ADD COLUMN email varchar(255);"]
//! );
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Full build script for a fresh database
//! oxide-schema-diff build --new schema.json --format pgsql8
//!
//! # Upgrade scripts, one file per stage
//! oxide-schema-diff upgrade --old v1.json --new v2.json --format mysql5 --output-dir out
//! ```

pub mod dialect;
pub mod diff;
pub mod error;
pub mod ident;
pub mod loader;
pub mod options;
pub mod replication;
pub mod schema;
pub mod stage;

pub use diff::Generator;
pub use error::{DiffError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::dialect::{DialectKind, SqlDialect};
    pub use crate::diff::Generator;
    pub use crate::error::{DiffError, Result};
    pub use crate::ident::Ident;
    pub use crate::loader::{load_database, parse_database};
    pub use crate::options::{DiffOptions, QuotePolicy};
    pub use crate::replication::ReplicationId;
    pub use crate::schema::{
        Column, Database, EnumType, RoleMap, Schema, Sequence, Table, Trigger,
        TriggerGranularity, TriggerTiming, View,
    };
    pub use crate::stage::{Stage, StageFiles, StageWriter, StagedOutput};
}
