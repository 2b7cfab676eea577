//! Case-insensitive identifiers.
//!
//! SQL folds unquoted identifiers, so every identity comparison in the
//! engine (schemas, tables, columns, types, triggers, sequences) goes
//! through [`Ident`]. The original spelling is kept for rendering.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// An identifier compared by its case-folded key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Ident {
    name: String,
    key: String,
}

impl Ident {
    /// Creates an identifier, computing its folded key once.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = name.to_lowercase();
        Self { name, key }
    }

    /// The identifier as written in the document.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The case-folded key used for comparisons.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Compares against a plain string without allocating an `Ident`.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.key == other.to_lowercase()
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Ident {}

impl Hash for Ident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Borrow<str> for Ident {
    fn borrow(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.name)
    }
}

impl From<String> for Ident {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Ident> for String {
    fn from(ident: Ident) -> Self {
        ident.name
    }
}

/// Case-insensitive string equality, for attributes that are not names
/// (trigger timing, view query text).
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(Ident::new("Users"), Ident::new("USERS"));
        assert_ne!(Ident::new("users"), Ident::new("user"));
        assert!(Ident::new("Orders").matches("orders"));
    }

    #[test]
    fn test_display_keeps_spelling() {
        let ident = Ident::new("CamelCase");
        assert_eq!(ident.to_string(), "CamelCase");
        assert_eq!(ident.key(), "camelcase");
    }

    #[test]
    fn test_lookup_by_folded_key() {
        let mut map = HashMap::new();
        map.insert(Ident::new("Accounts"), 1);
        assert_eq!(map.get("accounts"), Some(&1));
        assert_eq!(map.get(&Ident::new("ACCOUNTS")), Some(&1));
    }

    #[test]
    fn test_serde_roundtrip_as_string() {
        let ident: Ident = serde_json::from_str("\"Public\"").unwrap();
        assert_eq!(ident.as_str(), "Public");
        assert_eq!(serde_json::to_string(&ident).unwrap(), "\"Public\"");
    }
}
