//! Generation options.
//!
//! Everything the engine reads besides the two documents lives in
//! [`DiffOptions`]. Callers build it once and pass it by reference.

use serde::{Deserialize, Serialize};

/// Identifier kinds that can be quoted independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentKind {
    /// Schema names.
    Schema,
    /// Table names.
    Table,
    /// Column names.
    Column,
    /// Function and procedure names.
    Function,
    /// Views, triggers, types, sequences and constraints.
    Object,
}

/// Which identifier kinds are always quoted.
///
/// Identifiers that are not plain lower-case words are quoted regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotePolicy {
    /// Quote schema names.
    pub schema: bool,
    /// Quote table names.
    pub table: bool,
    /// Quote column names.
    pub column: bool,
    /// Quote function names.
    pub function: bool,
    /// Quote other object names.
    pub object: bool,
}

impl QuotePolicy {
    /// Quotes nothing unless required.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Quotes every identifier.
    #[must_use]
    pub fn all() -> Self {
        Self {
            schema: true,
            table: true,
            column: true,
            function: true,
            object: true,
        }
    }

    /// Whether identifiers of `kind` are always quoted.
    #[must_use]
    pub fn quotes(&self, kind: IdentKind) -> bool {
        match kind {
            IdentKind::Schema => self.schema,
            IdentKind::Table => self.table,
            IdentKind::Column => self.column,
            IdentKind::Function => self.function,
            IdentKind::Object => self.object,
        }
    }
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Identifier quoting.
    pub quoting: QuotePolicy,
    /// Drop and recreate every view even when its query is unchanged.
    pub always_recreate_views: bool,
    /// Backfill NULLs before a column becomes NOT NULL.
    pub add_defaults: bool,
    /// Match entities by name only, ignoring rename markers.
    pub ignore_old_names: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            quoting: QuotePolicy::none(),
            always_recreate_views: false,
            add_defaults: true,
            ignore_old_names: false,
        }
    }
}

impl DiffOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quoting policy.
    #[must_use]
    pub fn quoting(mut self, quoting: QuotePolicy) -> Self {
        self.quoting = quoting;
        self
    }

    /// Sets whether views are always recreated.
    #[must_use]
    pub fn always_recreate_views(mut self, value: bool) -> Self {
        self.always_recreate_views = value;
        self
    }

    /// Sets whether NOT NULL tightening backfills existing rows.
    #[must_use]
    pub fn add_defaults(mut self, value: bool) -> Self {
        self.add_defaults = value;
        self
    }

    /// Sets whether rename markers are ignored.
    #[must_use]
    pub fn ignore_old_names(mut self, value: bool) -> Self {
        self.ignore_old_names = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DiffOptions::default();
        assert!(options.add_defaults);
        assert!(!options.always_recreate_views);
        assert!(!options.quoting.quotes(IdentKind::Table));
    }

    #[test]
    fn test_quote_all() {
        let policy = QuotePolicy::all();
        for kind in [
            IdentKind::Schema,
            IdentKind::Table,
            IdentKind::Column,
            IdentKind::Function,
            IdentKind::Object,
        ] {
            assert!(policy.quotes(kind));
        }
    }
}
