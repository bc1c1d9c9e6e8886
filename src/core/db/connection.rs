/// Connection Management Module
///
/// This module provides the shared database handle the rest of the crate
/// executes against. One process uses one connection: the handle is cheap
/// to clone, every clone refers to the same underlying SQLite connection,
/// and an internal mutex keeps one statement in flight at a time.
///
/// The core is not otherwise thread-safe by design. Callers serving
/// concurrent requests must add their own per-request-connection or pooling
/// layer; the handle's serialization discipline only guarantees statements
/// do not interleave on the shared connection.
use crate::config::OrmConfig;
use crate::core::{OrmError, Result};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Process-wide database handle, registered once and never reset mid-run.
static GLOBAL_DB: OnceCell<Db> = OnceCell::new();

/// A shared handle to one SQLite connection.
///
/// Cloning the handle shares the connection; dropping the last clone closes
/// it. The handle also carries the ORM configuration used to resolve
/// primary-key column names per table.
#[derive(Debug, Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
    config: Arc<OrmConfig>,
}

impl Db {
    /// Opens a database at the given path with default configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file, or ":memory:" for an
    ///   in-memory database
    ///
    /// # Errors
    ///
    /// Returns `OrmError::Database` if the file cannot be opened.
    pub fn open(path: &str) -> Result<Db> {
        Db::open_with_config(path, OrmConfig::default())
    }

    /// Opens a database at the given path with the given configuration.
    pub fn open_with_config(path: &str, config: OrmConfig) -> Result<Db> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("opened database at {}", path);
        Ok(Db::from_connection(conn, config))
    }

    /// Opens a fresh in-memory database with default configuration.
    pub fn open_in_memory() -> Result<Db> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("opened in-memory database");
        Ok(Db::from_connection(conn, OrmConfig::default()))
    }

    /// Wraps an already-initialized connection.
    ///
    /// The ORM never opens or closes this connection beyond the lifetime of
    /// the handle; it is the caller's live connection.
    pub fn from_connection(conn: Connection, config: OrmConfig) -> Db {
        Db {
            conn: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    /// Runs a closure against the shared connection, holding the statement
    /// lock for the duration of the call.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| OrmError::Connection("database lock poisoned".to_string()))?;
        f(&guard)
    }

    /// Executes a batch of semicolon-separated statements.
    ///
    /// Used by schema bootstrap and fixture collaborators; queries built by
    /// the ORM itself go through the executor instead.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(sql)?;
            Ok(())
        })
    }

    /// The rowid generated by the most recent successful INSERT on this
    /// connection.
    pub fn last_insert_id(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.last_insert_rowid()))
    }

    /// The primary-key column name configured for the given table.
    pub fn primary_key_for(&self, table: &str) -> &str {
        self.config.primary_key_for(table)
    }
}

/// Registers the process-wide database handle.
///
/// Mirrors the classic ActiveRecord pattern of one ambient connection:
/// register once at startup, then build table handles anywhere via
/// [`crate::table::for_table`]. The explicit-handle API (`Table::new`)
/// works without any global registration and is preferred for testability.
///
/// # Errors
///
/// Returns `OrmError::Connection` if a global handle was already
/// registered; the handle is never reset mid-run.
pub fn set_global(db: Db) -> Result<()> {
    GLOBAL_DB
        .set(db)
        .map_err(|_| OrmError::Connection("global database already registered".to_string()))
}

/// Returns a clone of the process-wide database handle.
///
/// # Errors
///
/// Returns `OrmError::Connection` if no global handle was registered.
pub fn global() -> Result<Db> {
    GLOBAL_DB
        .get()
        .cloned()
        .ok_or_else(|| OrmError::Connection("no global database registered".to_string()))
}
