//! Schema document loading.

use std::path::Path;

use tracing::debug;

use crate::error::{DiffError, Result};
use crate::schema::Database;

/// Reads a JSON schema document.
pub fn load_database(path: impl AsRef<Path>) -> Result<Database> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let database: Database =
        serde_json::from_str(&text).map_err(|source| DiffError::Document {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(
        path = %path.display(),
        schemas = database.schemas.len(),
        "loaded schema document"
    );
    Ok(database)
}

/// Parses a JSON schema document held in memory.
pub fn parse_database(text: &str) -> Result<Database> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"schemas": [{"name": "app", "tables": [{"name": "t", "columns": []}]}]}"#,
        )
        .unwrap();

        let db = load_database(&path).unwrap();
        assert_eq!(db.schemas.len(), 1);
        assert_eq!(db.schemas[0].tables[0].name.as_str(), "t");
    }

    #[test]
    fn test_parse_error_names_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"schemas\": [").unwrap();

        let err = load_database(&path).unwrap_err();
        assert!(matches!(err, DiffError::Document { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_database("/nonexistent/schema.json").unwrap_err();
        assert!(matches!(err, DiffError::Io(_)));
    }

    #[test]
    fn test_parse_database() {
        let db = parse_database(r#"{"schemas": []}"#).unwrap();
        assert!(db.schemas.is_empty());
        assert!(matches!(
            parse_database("[]").unwrap_err(),
            DiffError::Serialization(_)
        ));
    }
}
