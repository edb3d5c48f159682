use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Shared handle to the fleet database.
///
/// A single connection lives behind a mutex. Reads borrow it directly; every
/// write runs inside a `BEGIN IMMEDIATE` transaction so a read-modify-write
/// (uniqueness check + insert, edge lookup + toggle) is atomic.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|source| Error::DatabaseOpen {
            path: path.to_path_buf(),
            source,
        })?;

        // Enable WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
        setup_database(&conn)?;
        info!(path = %path.display(), "database opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fresh in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a read-only closure against the connection.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside an immediate transaction; commits on `Ok`, rolls back on `Err`.
    pub fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;

    // ==========================================================================
    // Fleet tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS manufacturers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            country TEXT NOT NULL
        )",
        [],
    )?;

    // No ON DELETE action: manufacturer removal is decided by the delete policy
    conn.execute(
        "CREATE TABLE IF NOT EXISTS cars (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model TEXT NOT NULL,
            manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Identity (login credential) and driver profile
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS identities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS drivers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            identity_id INTEGER UNIQUE NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
            license_number TEXT UNIQUE NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    // ==========================================================================
    // Car <-> Driver assignment (join table)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS car_drivers (
            car_id INTEGER NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
            driver_id INTEGER NOT NULL REFERENCES drivers(id) ON DELETE CASCADE,
            PRIMARY KEY (car_id, driver_id)
        )",
        [],
    )?;

    // ==========================================================================
    // Sessions and per-session counters
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            identity_id INTEGER NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_counters (
            session_key TEXT PRIMARY KEY,
            num_visits INTEGER NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_cars_manufacturer ON cars(manufacturer_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_car_drivers_driver ON car_drivers(driver_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_identity ON sessions(identity_id)",
        [],
    )?;

    debug!("schema ready");
    Ok(())
}

/// Number of rows in `table`.
///
/// `table` is always one of the crate's own table names, never user input.
pub(crate) fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;

    Ok(count)
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}
