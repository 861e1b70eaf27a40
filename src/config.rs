use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SqliteError};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Tables to create when a database is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }
    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }
}

/// A table name plus its raw column-definition list, passed to SQLite verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: String,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, columns: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into(),
        }
    }
}

/// Database configuration
///
/// ```toml
/// db_path = "inventory.db"
/// fresh = false
/// busy_timeout_ms = 5000
///
/// [[schema.tables]]
/// name = "items"
/// columns = "id INTEGER PRIMARY KEY AUTOINCREMENT, label VARCHAR(20), qty INT"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
    /// Drop every existing table when the database is opened
    #[serde(default)]
    pub fresh: bool,
    /// How long a connection waits on a locked file, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Tables created at open time
    #[serde(default)]
    pub schema: Schema,
}

impl SqliteConfig {
    /// Create a new SQLite config with path and schema
    pub fn new(db_path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            db_path: db_path.into(),
            fresh: false,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            schema,
        }
    }

    pub fn with_fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| SqliteError::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let config = SqliteConfig::from_toml_str("db_path = \"a.db\"").unwrap();
        assert_eq!(config.db_path, PathBuf::from("a.db"));
        assert!(!config.fresh);
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert!(config.schema.tables.is_empty());
    }

    #[test]
    fn parses_schema_tables() {
        let config = SqliteConfig::from_toml_str(
            r#"
            db_path = "inventory.db"
            fresh = true
            busy_timeout_ms = 250

            [[schema.tables]]
            name = "items"
            columns = "id INTEGER PRIMARY KEY AUTOINCREMENT, label VARCHAR(20), qty INT"
            "#,
        )
        .unwrap();
        assert!(config.fresh);
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(
            config.schema.tables,
            vec![TableDefinition::new(
                "items",
                "id INTEGER PRIMARY KEY AUTOINCREMENT, label VARCHAR(20), qty INT"
            )]
        );
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("db.toml");
        std::fs::write(&path, "db_path = \"on-disk.db\"\nfresh = true\n").unwrap();

        let config = SqliteConfig::load(&path).unwrap();
        assert_eq!(config, SqliteConfig::new("on-disk.db", Schema::new()).with_fresh(true));
        assert!(matches!(
            SqliteConfig::load(dir.path().join("missing.toml")),
            Err(SqliteError::Config(_))
        ));
    }

    #[test]
    fn rejects_missing_path() {
        let err = SqliteConfig::from_toml_str("fresh = true").unwrap_err();
        assert!(matches!(err, SqliteError::Config(_)));
    }
}
