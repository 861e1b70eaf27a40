use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use log::info;

use crate::config::{Schema, SqliteConfig};
use crate::connection::{Connector, ExecMode};
use crate::error::{Result, SqliteError};
use crate::schema::{extract_column_fragment, parse_column_spec, ColumnSpec};
use crate::sqlite::{quote_identifier, SqlQuery, Value};
use crate::table::Table;

// `LIKE` would treat `_` as a wildcard and ignore case; only the literal
// `sqlite_` prefix is reserved for the engine.
const LIST_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_' ORDER BY name";
const TABLE_SQL: &str =
    "SELECT name, sql FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE";

/// A table as recorded in the engine catalog.
struct StoredTable {
    name: String,
    sql: String,
}

/// Registry key for a table name. SQLite matches table names ignoring ASCII
/// case, so `Items` and `items` name the same table.
fn table_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Registry of the tables in one SQLite file.
///
/// The name → [`Table`] map mirrors the engine catalog. Structural operations
/// (`create_table`, `delete_table`, `clear_all`) check the catalog rather than
/// trusting the map, so a table dropped by another registry on the same file
/// is noticed on the next create.
#[derive(Debug)]
pub struct Database {
    connector: Rc<Connector>,
    tables: HashMap<String, Table>,
}

impl Database {
    /// Opens `path` and loads a descriptor for every existing table.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(SqliteConfig::new(path, Schema::new()))
    }

    /// Opens `path` and drops every table in it.
    pub fn open_fresh(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(SqliteConfig::new(path, Schema::new()).with_fresh(true))
    }

    pub fn with_config(config: SqliteConfig) -> Result<Self> {
        let connector = Connector::new(
            config.db_path.clone(),
            Duration::from_millis(config.busy_timeout_ms),
        );
        let mut database = Self {
            connector: Rc::new(connector),
            tables: HashMap::new(),
        };

        if config.fresh {
            database.clear_all()?;
        } else {
            database.refresh()?;
        }
        for table in &config.schema.tables {
            database.create_table(&table.name, &table.columns)?;
        }
        info!(
            "opened {} with {} table(s)",
            config.db_path.display(),
            database.tables.len()
        );
        Ok(database)
    }

    pub fn path(&self) -> &Path {
        self.connector.path()
    }

    /// Descriptor for `name`, if this registry knows it. Names match
    /// ignoring ASCII case, as in SQLite.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&table_key(name))
    }

    /// Names this registry currently holds descriptors for, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.values().map(|t| t.name().to_string()).collect();
        names.sort();
        names
    }

    /// Creates `name` unless it already exists and returns its descriptor.
    ///
    /// `columns` is the column-definition list, passed to SQLite verbatim:
    /// `"id INTEGER PRIMARY KEY AUTOINCREMENT, label VARCHAR(20), qty INT"`.
    pub fn create_table(&mut self, name: &str, columns: &str) -> Result<&Table> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SqliteError::InvalidIdentifier(name.to_string()));
        }
        let key = table_key(name);

        let stored = self.stored_table(name)?;
        if stored.is_none() && self.tables.remove(&key).is_some() {
            info!("table '{name}' was dropped outside this registry, recreating");
        }

        if !self.tables.contains_key(&key) {
            let table = match stored {
                Some(stored) => self.table_from_catalog(stored)?,
                None => {
                    let columns = columns.trim();
                    self.connector.commit(&SqlQuery::new(format!(
                        "CREATE TABLE IF NOT EXISTS {} ({columns})",
                        quote_identifier(name)
                    )))?;
                    info!("created table '{name}'");
                    Table::from_spec(name, parse_column_spec(columns), Rc::clone(&self.connector))?
                }
            };
            self.tables.insert(key.clone(), table);
        }

        self.tables
            .get(&key)
            .ok_or_else(|| SqliteError::TableNotFound(name.to_string()))
    }

    /// Tables present in the engine catalog, sorted, without SQLite's own.
    pub fn get_existing_table_names(&self) -> Result<Vec<String>> {
        let rows = self
            .connector
            .run(&SqlQuery::new(LIST_TABLES), ExecMode::FetchAll)?
            .into_rows();
        Ok(rows
            .into_iter()
            .filter_map(|row| match row.into_iter().next() {
                Some(Value::Text(name)) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// Columns and primary key of `name`, from the registry when known and
    /// from the engine catalog otherwise.
    pub fn get_table_columns(&self, name: &str) -> Result<ColumnSpec> {
        if let Some(table) = self.table(name) {
            return Ok(table.spec());
        }
        let name = name.trim();
        let stored = self
            .stored_table(name)?
            .ok_or_else(|| SqliteError::TableNotFound(name.to_string()))?;
        spec_from_create_sql(&stored.name, &stored.sql)
    }

    /// Drops `name` and forgets its descriptor. Returns whether the engine had
    /// the table.
    pub fn delete_table(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        let stored = self.stored_table(name)?;
        let dropped = stored.as_ref().map_or(name, |stored| stored.name.as_str());
        self.connector.commit(&SqlQuery::new(format!(
            "DROP TABLE IF EXISTS {}",
            quote_identifier(dropped)
        )))?;
        self.tables.remove(&table_key(name));
        if stored.is_some() {
            info!("dropped table '{dropped}'");
        }
        Ok(stored.is_some())
    }

    /// Drops every table in the file, including ones this registry never loaded.
    pub fn clear_all(&mut self) -> Result<()> {
        for name in self.get_existing_table_names()? {
            self.delete_table(&name)?;
        }
        self.tables.clear();
        Ok(())
    }

    /// Rebuilds the registry from the engine catalog.
    pub fn refresh(&mut self) -> Result<()> {
        let mut tables = HashMap::new();
        for name in self.get_existing_table_names()? {
            let stored = self
                .stored_table(&name)?
                .ok_or_else(|| SqliteError::TableNotFound(name.clone()))?;
            tables.insert(table_key(&name), self.table_from_catalog(stored)?);
        }
        self.tables = tables;
        Ok(())
    }

    /// Descriptor built from the catalog, under the catalog's spelling of the name.
    fn table_from_catalog(&self, stored: StoredTable) -> Result<Table> {
        let spec = spec_from_create_sql(&stored.name, &stored.sql)?;
        Table::from_spec(&stored.name, spec, Rc::clone(&self.connector))
    }

    fn stored_table(&self, name: &str) -> Result<Option<StoredTable>> {
        let row = self
            .connector
            .run(&SqlQuery::new(TABLE_SQL).bind(name), ExecMode::FetchOne)?
            .into_row();
        Ok(row.and_then(|row| {
            let mut values = row.into_iter();
            match (values.next(), values.next()) {
                (Some(Value::Text(name)), Some(Value::Text(sql))) => Some(StoredTable { name, sql }),
                _ => None,
            }
        }))
    }
}

fn spec_from_create_sql(name: &str, sql: &str) -> Result<ColumnSpec> {
    extract_column_fragment(sql)
        .map(parse_column_spec)
        .ok_or_else(|| SqliteError::schema(format!("cannot read column list of '{name}' from: {sql}")))
}
