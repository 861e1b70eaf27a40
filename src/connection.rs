//! Per-operation connection lifecycle.
//!
//! Every logical operation opens its own connection, runs one statement and
//! closes it again. A connector refuses to open a second connection while one
//! is live; callers that need several statements on one connection use
//! [`Connector::with_connection`] directly.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use rusqlite::{params_from_iter, Connection};

use crate::error::{Result, SqliteError};
use crate::sqlite::{Row, SqlQuery, Value};

/// What to do after the statement has executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Commit,
    FetchOne,
    FetchAll,
}

/// Result of a committed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    pub changes: usize,
    pub last_insert_rowid: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Committed(Committed),
    Row(Option<Row>),
    Rows(Vec<Row>),
}

impl Outcome {
    pub fn changes(&self) -> usize {
        match self {
            Outcome::Committed(committed) => committed.changes,
            _ => 0,
        }
    }

    pub fn last_insert_rowid(&self) -> Option<i64> {
        match self {
            Outcome::Committed(committed) => Some(committed.last_insert_rowid),
            _ => None,
        }
    }

    pub fn into_row(self) -> Option<Row> {
        match self {
            Outcome::Row(row) => row,
            Outcome::Rows(rows) => rows.into_iter().next(),
            Outcome::Committed(_) => None,
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Outcome::Row(row) => row.into_iter().collect(),
            Outcome::Rows(rows) => rows,
            Outcome::Committed(_) => Vec::new(),
        }
    }
}

/// Opens short-lived connections to one database file.
#[derive(Debug)]
pub struct Connector {
    path: PathBuf,
    busy_timeout: Duration,
    open: Cell<bool>,
}

/// Clears the open flag on every exit path, unwinding included.
struct OpenGuard<'a>(&'a Cell<bool>);

impl Drop for OpenGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Connector {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
            open: Cell::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// Opens a connection, hands it to `body` and closes it afterwards.
    ///
    /// Fails with [`SqliteError::ConnectionBusy`] when called while another
    /// connection from this connector is still open.
    pub fn with_connection<T>(
        &self,
        body: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        if self.open.replace(true) {
            warn!("rejecting nested connection to {}", self.path.display());
            return Err(SqliteError::ConnectionBusy {
                path: self.path.clone(),
            });
        }
        let _guard = OpenGuard(&self.open);

        let mut conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        let result = body(&mut conn);
        if let Err((_, err)) = conn.close() {
            warn!("failed to close connection to {}: {err}", self.path.display());
        }
        result
    }

    /// Executes one statement and performs the follow-up `mode` asks for.
    pub fn run(&self, query: &SqlQuery, mode: ExecMode) -> Result<Outcome> {
        debug!("{:?}: {} {:?}", mode, query.statement, query.params.values);
        self.with_connection(|conn| execute(conn, query, mode))
            .inspect_err(|err| warn!("statement failed: {} ({err})", query.statement))
    }

    /// Executes one statement and commits it.
    pub fn commit(&self, query: &SqlQuery) -> Result<Committed> {
        debug!("Commit: {} {:?}", query.statement, query.params.values);
        self.with_connection(|conn| commit(conn, query))
            .inspect_err(|err| warn!("statement failed: {} ({err})", query.statement))
    }
}

fn commit(conn: &mut Connection, query: &SqlQuery) -> Result<Committed> {
    let tx = conn.transaction()?;
    let changes = tx.execute(&query.statement, params_from_iter(query.params.values.iter()))?;
    let last_insert_rowid = tx.last_insert_rowid();
    tx.commit()?;
    Ok(Committed {
        changes,
        last_insert_rowid,
    })
}

fn execute(conn: &mut Connection, query: &SqlQuery, mode: ExecMode) -> Result<Outcome> {
    match mode {
        ExecMode::Commit => Ok(Outcome::Committed(commit(conn, query)?)),
        ExecMode::FetchOne => Ok(Outcome::Row(fetch(conn, query, Some(1))?.pop())),
        ExecMode::FetchAll => Ok(Outcome::Rows(fetch(conn, query, None)?)),
    }
}

fn fetch(conn: &Connection, query: &SqlQuery, limit: Option<usize>) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(&query.statement)?;
    let width = stmt.column_count();
    let mut rows = stmt.query(params_from_iter(query.params.values.iter()))?;

    let mut fetched = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(row.get::<_, Value>(idx)?);
        }
        fetched.push(values);
        if limit.is_some_and(|limit| fetched.len() >= limit) {
            break;
        }
    }
    Ok(fetched)
}
