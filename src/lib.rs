//! Table registry and primary-key row access over a single SQLite file.
//!
//! # Intention
//!
//! - Keep a registry of the tables in one database file, each described by its
//!   name, insertable columns and primary key.
//! - Offer row lookup, update, insert and delete keyed by primary key or by
//!   equality on any column.
//! - Open a connection per operation and close it before returning.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - Single-threaded: a [`Database`] and its [`Table`]s share one connector and
//!   are neither `Send` nor `Sync`.
//!
//! ```no_run
//! use sqlite_tables::{Database, Value};
//!
//! # fn main() -> sqlite_tables::Result<()> {
//! let mut db = Database::open("inventory.db")?;
//! let items = db.create_table(
//!     "items",
//!     "id INTEGER PRIMARY KEY AUTOINCREMENT, label VARCHAR(20), qty INT",
//! )?;
//! let id = items.insert(&[Value::from("apple"), Value::from(5)])?;
//! println!("{:?}", items.get(id, &["qty"])?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod schema;
pub mod sqlite;
pub mod table;

pub use config::{Schema, SqliteConfig, TableDefinition};
pub use connection::{Committed, Connector, ExecMode, Outcome};
pub use database::Database;
pub use error::{Result, SqliteError};
pub use schema::{extract_column_fragment, parse_column_spec, ColumnSpec};
pub use sqlite::{Params, Row, SqlQuery, Value};
pub use table::{Fetched, Table};
