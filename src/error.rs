use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SqliteError>;

/// Errors surfaced by the table registry and its descriptors.
///
/// Lookup misses are not errors: they come back as `Ok(None)` or a zero
/// changed-row count.
#[derive(Error, Debug)]
pub enum SqliteError {
    /// SQLite rejected the statement or the connection could not be opened.
    #[error("sqlite engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// A connection is already open on this connector.
    #[error("connection already open for {}", .path.display())]
    ConnectionBusy { path: PathBuf },

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("table '{table}' expects {expected} values, got {actual}")]
    ArityMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("config error: {0}")]
    Config(String),
}

impl SqliteError {
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        SqliteError::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        SqliteError::Schema(message.into())
    }
}

impl From<toml::de::Error> for SqliteError {
    fn from(err: toml::de::Error) -> Self {
        SqliteError::Config(err.to_string())
    }
}
