// Identity - login credential, kept apart from the driver profile
//
// A driver profile references exactly one identity. Authentication only ever
// touches this table; domain data lives in `drivers`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::db::{now_rfc3339, parse_timestamp};
use crate::error::{is_constraint_violation, Error, Result};
use crate::validation::{required, validate_password};

const HASH_SCHEME: &str = "sha256";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Identity> {
    let created_at: String = row.get(3)?;
    Ok(Identity {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

// ============================================================================
// PASSWORD HASHING
// ============================================================================

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash `password` with a fresh random salt: `sha256$<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{HASH_SCHEME}${salt}${}", digest(&salt, password))
}

/// Check `password` against a value produced by [`hash_password`].
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if scheme != HASH_SCHEME {
        return false;
    }

    let actual = digest(salt, password);
    // Compare without short-circuiting on the first differing byte
    actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

// ============================================================================
// STORE OPERATIONS
// ============================================================================

pub fn ensure_unique_username(conn: &Connection, username: &str) -> Result<()> {
    let taken: Option<i64> = conn
        .query_row(
            "SELECT id FROM identities WHERE username = ?1",
            [username],
            |row| row.get(0),
        )
        .optional()?;

    if taken.is_some() {
        return Err(Error::validation(
            "username",
            "a user with that username already exists",
        ));
    }
    Ok(())
}

pub fn create_identity(conn: &Connection, username: &str, password: &str) -> Result<Identity> {
    let username = required("username", username)?;
    validate_password(password)?;
    ensure_unique_username(conn, &username)?;

    let password_hash = hash_password(password);
    let created_at = now_rfc3339();

    conn.execute(
        "INSERT INTO identities (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
        params![username, password_hash, created_at],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            Error::validation("username", "a user with that username already exists")
        } else {
            e.into()
        }
    })?;

    let id = conn.last_insert_rowid();
    debug!(identity_id = id, %username, "identity created");

    Ok(Identity {
        id,
        username,
        password_hash,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Identity> {
    conn.query_row(
        "SELECT id, username, password_hash, created_at FROM identities WHERE id = ?1",
        [id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("identity", id))
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<Identity>> {
    let found = conn
        .query_row(
            "SELECT id, username, password_hash, created_at FROM identities WHERE username = ?1",
            [username],
            from_row,
        )
        .optional()?;

    Ok(found)
}

/// Resolve a username/password pair. Unknown users and wrong passwords are
/// indistinguishable to the caller.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<Identity> {
    match find_by_username(conn, username.trim())? {
        Some(identity) if verify_password(password, &identity.password_hash) => Ok(identity),
        _ => {
            warn!(username = %username.trim(), "failed login attempt");
            Err(Error::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse");
        assert!(hash.starts_with("sha256$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        assert_ne!(hash_password("same-password"), hash_password("same-password"));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$salt$abc"));
        assert!(!verify_password("x", "sha256$only-salt"));
    }

    #[test]
    fn test_create_and_authenticate() {
        let conn = test_conn();
        let identity = create_identity(&conn, "alice", "s3cret-pass").unwrap();
        assert!(identity.id > 0);
        assert_ne!(identity.password_hash, "s3cret-pass");

        let authed = authenticate(&conn, "alice", "s3cret-pass").unwrap();
        assert_eq!(authed.id, identity.id);

        assert!(matches!(
            authenticate(&conn, "alice", "bad-password"),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&conn, "nobody", "s3cret-pass"),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let conn = test_conn();
        create_identity(&conn, "bob", "password-1").unwrap();
        let err = create_identity(&conn, "bob", "password-2").unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "username"));
    }

    #[test]
    fn test_get_by_id_round_trip() {
        let conn = test_conn();
        let identity = create_identity(&conn, "carol", "password-1").unwrap();
        assert_eq!(get_by_id(&conn, identity.id).unwrap(), identity);
        assert!(get_by_id(&conn, 404).unwrap_err().is_not_found());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let conn = test_conn();
        let identity = create_identity(&conn, "dave", "password-1").unwrap();
        let json = serde_json::to_value(&identity).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "dave");
    }
}
