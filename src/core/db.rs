//! Shared SQLite handle
//!
//! Every statement runs in SQLite's autocommit mode, so each call to
//! [`Database::execute`] is committed before it returns. There are no
//! multi-statement transactions.
//!
//! Foreign key enforcement is switched off on every connection. The bundled
//! SQLite build turns it on by default, which would make every review write
//! depend on an `employees` table in the same database; employee references
//! are checked through the employee directory when they are assigned.

use std::path::Path;
use std::rc::Rc;

use rusqlite::{Connection, OptionalExtension, Params, Row};

/// A cloneable handle to one SQLite connection
///
/// Clones share the same underlying connection, so a review store and a
/// SQL-backed employee directory can read and write the same database.
#[derive(Clone)]
pub struct Database {
    conn: Rc<Connection>,
}

impl Database {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an already open connection, disabling foreign key enforcement
    pub fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        Ok(Self {
            conn: Rc::new(conn),
        })
    }

    /// Run one statement with positional parameters, returning rows changed
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<usize> {
        self.conn.execute(sql, params)
    }

    /// Run one or more parameterless statements
    pub fn execute_batch(&self, sql: &str) -> rusqlite::Result<()> {
        self.conn.execute_batch(sql)
    }

    /// Rowid assigned by the most recent successful INSERT on this connection
    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Fetch the first row of a query, or `None` when it returns nothing
    pub fn fetch_one<T, P, F>(&self, sql: &str, params: P, f: F) -> rusqlite::Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.conn.query_row(sql, params, f).optional()
    }

    /// Fetch every row of a query in the order SQLite returns them
    pub fn fetch_all<T, P, F>(&self, sql: &str, params: P, f: F) -> rusqlite::Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, f)?;
        rows.collect()
    }
}
