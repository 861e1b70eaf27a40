use std::rc::Rc;

use log::debug;

use crate::connection::{Connector, ExecMode};
use crate::error::{Result, SqliteError};
use crate::schema::ColumnSpec;
use crate::sqlite::{quote_identifier, Row, SqlQuery, Value};

/// Result of a row lookup: one column comes back unwrapped, anything wider
/// comes back as a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Value(Value),
    Row(Row),
}

impl Fetched {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Fetched::Value(value) => Some(value),
            Fetched::Row(_) => None,
        }
    }

    pub fn into_row(self) -> Row {
        match self {
            Fetched::Value(value) => vec![value],
            Fetched::Row(row) => row,
        }
    }
}

/// A table known to a [`Database`](crate::Database): its name, insertable
/// columns and primary key.
#[derive(Debug)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    primary_key: String,
    connector: Rc<Connector>,
}

impl Table {
    pub(crate) fn from_spec(name: &str, spec: ColumnSpec, connector: Rc<Connector>) -> Result<Self> {
        let primary_key = spec
            .resolved_primary_key()
            .ok_or_else(|| SqliteError::schema(format!("table '{name}' declares no columns")))?
            .to_string();
        Ok(Self {
            name: name.to_string(),
            columns: spec.columns,
            primary_key,
            connector,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns `insert` expects values for, in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn spec(&self) -> ColumnSpec {
        ColumnSpec {
            columns: self.columns.clone(),
            primary_key: self.primary_key.clone(),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        column == self.primary_key || self.columns.iter().any(|c| c == column)
    }

    /// Inserts one row, values matched positionally to [`Table::columns`].
    /// Returns the new row id.
    pub fn insert(&self, values: &[Value]) -> Result<i64> {
        if values.len() != self.columns.len() {
            return Err(SqliteError::ArityMismatch {
                table: self.name.clone(),
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        let statement = if self.columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(&self.name))
        } else {
            let columns = self
                .columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=values.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "INSERT INTO {} ({columns}) VALUES ({placeholders})",
                quote_identifier(&self.name)
            )
        };
        let query = SqlQuery::new(statement).with_params(values.to_vec());
        Ok(self.connector.commit(&query)?.last_insert_rowid)
    }

    /// Selects from the row whose primary key equals `key`.
    ///
    /// No columns (or `["*"]`) selects the whole row; a single named column
    /// comes back as [`Fetched::Value`].
    pub fn get(&self, key: impl Into<Value>, columns: &[&str]) -> Result<Option<Fetched>> {
        let selection = self.selection(columns)?;
        let query = SqlQuery::new(format!(
            "SELECT {selection} FROM {} WHERE {} = ?1",
            quote_identifier(&self.name),
            quote_identifier(&self.primary_key)
        ))
        .bind(key);
        let row = self.connector.run(&query, ExecMode::FetchOne)?.into_row();
        Ok(row.map(|row| shape(row, columns)))
    }

    /// Updates one column of the row whose primary key equals `key`.
    pub fn set(&self, key: impl Into<Value>, column: &str, new_value: impl Into<Value>) -> Result<usize> {
        self.check_column(column)?;
        let query = SqlQuery::new(format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            quote_identifier(&self.name),
            quote_identifier(column),
            quote_identifier(&self.primary_key)
        ))
        .bind(new_value)
        .bind(key);
        Ok(self.connector.commit(&query)?.changes)
    }

    /// Selects by equality on any column. When several rows match, the last
    /// one in engine order wins.
    pub fn get_by(
        &self,
        key_property: &str,
        key_value: impl Into<Value>,
        column: Option<&str>,
    ) -> Result<Option<Fetched>> {
        let columns: Vec<&str> = column.into_iter().collect();
        let mut rows = self.select_where(key_property, key_value.into(), &columns)?;
        if rows.len() > 1 {
            debug!(
                "{} rows in '{}' match {key_property}, keeping the last",
                rows.len(),
                self.name
            );
        }
        Ok(rows.pop().map(|row| shape(row, &columns)))
    }

    /// Every row where `key_property` equals `key_value`, in engine order.
    pub fn get_all_by(&self, key_property: &str, key_value: impl Into<Value>) -> Result<Vec<Row>> {
        self.select_where(key_property, key_value.into(), &[])
    }

    /// Same as [`Table::set`], addressed by primary key value.
    pub fn update_column(
        &self,
        key_value: impl Into<Value>,
        column: &str,
        new_value: impl Into<Value>,
    ) -> Result<usize> {
        self.set(key_value, column, new_value)
    }

    /// Deletes every row where `key_property` equals `compare_value`.
    pub fn delete_row(&self, key_property: &str, compare_value: impl Into<Value>) -> Result<usize> {
        self.check_column(key_property)?;
        let query = SqlQuery::new(format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_identifier(&self.name),
            quote_identifier(key_property)
        ))
        .bind(compare_value);
        Ok(self.connector.commit(&query)?.changes)
    }

    fn select_where(&self, key_property: &str, key_value: Value, columns: &[&str]) -> Result<Vec<Row>> {
        self.check_column(key_property)?;
        let selection = self.selection(columns)?;
        let query = SqlQuery::new(format!(
            "SELECT {selection} FROM {} WHERE {} = ?1",
            quote_identifier(&self.name),
            quote_identifier(key_property)
        ))
        .bind(key_value);
        Ok(self.connector.run(&query, ExecMode::FetchAll)?.into_rows())
    }

    fn selection(&self, columns: &[&str]) -> Result<String> {
        if is_whole_row(columns) {
            return Ok("*".to_string());
        }
        let mut quoted = Vec::with_capacity(columns.len());
        for column in columns {
            self.check_column(column)?;
            quoted.push(quote_identifier(column));
        }
        Ok(quoted.join(", "))
    }

    // A double-quoted name that matches no column is read by SQLite as a
    // string literal, so unknown names must never reach the engine.
    fn check_column(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(SqliteError::unknown_column(&self.name, column))
        }
    }
}

fn is_whole_row(columns: &[&str]) -> bool {
    matches!(columns, [] | ["*"])
}

fn shape(mut row: Row, columns: &[&str]) -> Fetched {
    if columns.len() == 1 && !is_whole_row(columns) {
        if let Some(value) = row.pop() {
            return Fetched::Value(value);
        }
    }
    Fetched::Row(row)
}
