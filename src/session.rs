//! Login sessions and the per-session visit counter.
//!
//! Sessions map an opaque token (UUID v4) to an identity. The visit counter
//! is a separate key-value interface: handlers receive a [`VisitCounter`] and
//! key it by whatever session identity they hold.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;

use crate::db::{now_rfc3339, parse_timestamp, Database};
use crate::error::{Error, Result};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "taxi_session";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub identity_id: i64,
    pub created_at: DateTime<Utc>,
}

pub fn create_session(conn: &Connection, identity_id: i64) -> Result<Session> {
    let token = uuid::Uuid::new_v4().to_string();
    let created_at = now_rfc3339();

    conn.execute(
        "INSERT INTO sessions (token, identity_id, created_at) VALUES (?1, ?2, ?3)",
        params![token, identity_id, created_at],
    )?;
    debug!(identity_id, "session opened");

    Ok(Session {
        token,
        identity_id,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub fn resolve_session(conn: &Connection, token: &str) -> Result<Option<Session>> {
    let session = conn
        .query_row(
            "SELECT token, identity_id, created_at FROM sessions WHERE token = ?1",
            [token],
            |row| {
                let created_at: String = row.get(2)?;
                Ok(Session {
                    token: row.get(0)?,
                    identity_id: row.get(1)?,
                    created_at: parse_timestamp(&created_at)?,
                })
            },
        )
        .optional()?;

    Ok(session)
}

/// Close a session and drop its counters. Returns false if it was unknown.
pub fn end_session(conn: &Connection, token: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
    conn.execute("DELETE FROM session_counters WHERE session_key = ?1", [token])?;
    Ok(removed > 0)
}

// ============================================================================
// VISIT COUNTER
// ============================================================================

/// Per-key counter: returns the count before this call and stores count + 1.
pub trait VisitCounter: Send + Sync {
    fn get_and_increment(&self, key: &str) -> Result<i64>;
}

/// Counter persisted in the `session_counters` table.
pub struct SqliteVisitCounter {
    db: Arc<Database>,
}

impl SqliteVisitCounter {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl VisitCounter for SqliteVisitCounter {
    fn get_and_increment(&self, key: &str) -> Result<i64> {
        self.db.write(|tx| {
            let prior: i64 = tx
                .query_row(
                    "SELECT num_visits FROM session_counters WHERE session_key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or(0);

            tx.execute(
                "INSERT INTO session_counters (session_key, num_visits) VALUES (?1, ?2)
                 ON CONFLICT(session_key) DO UPDATE SET num_visits = excluded.num_visits",
                params![key, prior + 1],
            )?;

            Ok(prior)
        })
    }
}

/// Process-local counter, for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryVisitCounter {
    counts: Mutex<HashMap<String, i64>>,
}

impl MemoryVisitCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisitCounter for MemoryVisitCounter {
    fn get_and_increment(&self, key: &str) -> Result<i64> {
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| Error::internal("visit counter lock poisoned"))?;
        let slot = counts.entry(key.to_string()).or_insert(0);
        let prior = *slot;
        *slot += 1;
        Ok(prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::create_identity;

    fn stored(db: &Database, key: &str) -> Option<i64> {
        db.read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT num_visits FROM session_counters WHERE session_key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?)
        })
        .unwrap()
    }

    #[test]
    fn test_sqlite_counter_sequence() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let counter = SqliteVisitCounter::new(Arc::clone(&db));

        assert_eq!(counter.get_and_increment("session-a").unwrap(), 0);
        assert_eq!(stored(&db, "session-a"), Some(1));

        assert_eq!(counter.get_and_increment("session-a").unwrap(), 1);
        assert_eq!(stored(&db, "session-a"), Some(2));

        // Independent keys
        assert_eq!(counter.get_and_increment("session-b").unwrap(), 0);
    }

    #[test]
    fn test_memory_counter_sequence() {
        let counter = MemoryVisitCounter::new();
        assert_eq!(counter.get_and_increment("k").unwrap(), 0);
        assert_eq!(counter.get_and_increment("k").unwrap(), 1);
        assert_eq!(counter.get_and_increment("other").unwrap(), 0);
    }

    #[test]
    fn test_session_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let identity = db
            .write(|tx| create_identity(tx, "hunt", "password-1"))
            .unwrap();

        let session = db.write(|tx| create_session(tx, identity.id)).unwrap();
        assert_eq!(session.token.len(), 36);

        let resolved = db.read(|conn| resolve_session(conn, &session.token)).unwrap();
        assert_eq!(resolved, Some(session.clone()));

        assert!(db.write(|tx| end_session(tx, &session.token)).unwrap());
        assert!(db
            .read(|conn| resolve_session(conn, &session.token))
            .unwrap()
            .is_none());
        assert!(!db.write(|tx| end_session(tx, &session.token)).unwrap());
    }

    #[test]
    fn test_end_session_clears_counter() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let identity = db
            .write(|tx| create_identity(tx, "james", "password-1"))
            .unwrap();
        let session = db.write(|tx| create_session(tx, identity.id)).unwrap();

        let counter = SqliteVisitCounter::new(Arc::clone(&db));
        counter.get_and_increment(&session.token).unwrap();
        assert_eq!(stored(&db, &session.token), Some(1));

        db.write(|tx| end_session(tx, &session.token)).unwrap();
        assert_eq!(stored(&db, &session.token), None);
    }
}
