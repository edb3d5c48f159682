// Driver Entity - domain profile linked to a login identity
//
// Username lives on the identity; the driver row carries the license number
// and names. Creating a driver creates both rows, deleting one removes both
// along with sessions and assignment edges.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{is_constraint_violation, Error, Result};
use crate::identity;
use crate::validation::{required, validate_license_number};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: i64,
    pub identity_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Registration form for a new driver (identity + profile).
#[derive(Debug, Clone, Deserialize)]
pub struct NewDriver {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl NewDriver {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        license_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            license_number: license_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverUpdate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub license_number: String,
}

/// License-only edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseUpdate {
    #[serde(default)]
    pub license_number: String,
}

// ============================================================================
// STORE OPERATIONS
// ============================================================================

const SELECT_DRIVER: &str = "SELECT d.id, d.identity_id, i.username, d.first_name, d.last_name, d.license_number
     FROM drivers d
     JOIN identities i ON i.id = d.identity_id";

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        id: row.get(0)?,
        identity_id: row.get(1)?,
        username: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        license_number: row.get(5)?,
    })
}

fn ensure_unique_license(conn: &Connection, license_number: &str, exclude_id: Option<i64>) -> Result<()> {
    let taken: Option<i64> = conn
        .query_row(
            "SELECT id FROM drivers WHERE license_number = ?1 AND id != ?2",
            params![license_number, exclude_id.unwrap_or(0)],
            |row| row.get(0),
        )
        .optional()?;

    if taken.is_some() {
        return Err(Error::validation(
            "license_number",
            "a driver with this license number already exists",
        ));
    }
    Ok(())
}

fn check_license(conn: &Connection, license_number: &str, exclude_id: Option<i64>) -> Result<String> {
    let license_number = license_number.trim().to_string();
    validate_license_number(&license_number)?;
    ensure_unique_license(conn, &license_number, exclude_id)?;
    Ok(license_number)
}

fn map_write_error(err: rusqlite::Error) -> Error {
    if is_constraint_violation(&err) {
        Error::validation("license_number", "a driver with this license number already exists")
    } else {
        err.into()
    }
}

/// Register a driver: identity and profile are written together.
pub fn create(conn: &Connection, input: &NewDriver) -> Result<Driver> {
    let license_number = check_license(conn, &input.license_number, None)?;
    let first_name = input.first_name.trim().to_string();
    let last_name = input.last_name.trim().to_string();

    let identity = identity::create_identity(conn, &input.username, &input.password)?;

    conn.execute(
        "INSERT INTO drivers (identity_id, license_number, first_name, last_name)
         VALUES (?1, ?2, ?3, ?4)",
        params![identity.id, license_number, first_name, last_name],
    )
    .map_err(map_write_error)?;

    let id = conn.last_insert_rowid();
    info!(driver_id = id, username = %identity.username, "driver created");

    Ok(Driver {
        id,
        identity_id: identity.id,
        username: identity.username,
        first_name,
        last_name,
        license_number,
    })
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Driver> {
    conn.query_row(&format!("{SELECT_DRIVER} WHERE d.id = ?1"), [id], from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("driver", id))
}

/// The driver profile attached to a login identity, if any.
pub fn find_by_identity(conn: &Connection, identity_id: i64) -> Result<Option<Driver>> {
    let found = conn
        .query_row(
            &format!("{SELECT_DRIVER} WHERE d.identity_id = ?1"),
            [identity_id],
            from_row,
        )
        .optional()?;

    Ok(found)
}

pub fn update(conn: &Connection, id: i64, input: &DriverUpdate) -> Result<Driver> {
    get_by_id(conn, id)?;
    validate_names(input)?;
    let license_number = check_license(conn, &input.license_number, Some(id))?;

    conn.execute(
        "UPDATE drivers SET first_name = ?1, last_name = ?2, license_number = ?3 WHERE id = ?4",
        params![
            input.first_name.trim(),
            input.last_name.trim(),
            license_number,
            id
        ],
    )
    .map_err(map_write_error)?;

    get_by_id(conn, id)
}

pub fn update_license(conn: &Connection, id: i64, input: &LicenseUpdate) -> Result<Driver> {
    get_by_id(conn, id)?;
    let license_number = check_license(conn, &input.license_number, Some(id))?;

    conn.execute(
        "UPDATE drivers SET license_number = ?1 WHERE id = ?2",
        params![license_number, id],
    )
    .map_err(map_write_error)?;

    info!(driver_id = id, "driver license updated");
    get_by_id(conn, id)
}

/// Remove the driver, its assignment edges, its identity and any sessions.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let driver = get_by_id(conn, id)?;

    let edges = conn.execute("DELETE FROM car_drivers WHERE driver_id = ?1", [id])?;
    conn.execute(
        "DELETE FROM session_counters
         WHERE session_key IN (SELECT token FROM sessions WHERE identity_id = ?1)",
        [driver.identity_id],
    )?;
    conn.execute("DELETE FROM sessions WHERE identity_id = ?1", [driver.identity_id])?;
    conn.execute("DELETE FROM drivers WHERE id = ?1", [id])?;
    conn.execute("DELETE FROM identities WHERE id = ?1", [driver.identity_id])?;

    info!(driver_id = id, removed_assignments = edges, "driver deleted");
    Ok(())
}

/// All drivers ordered by username.
pub fn list_all(conn: &Connection) -> Result<Vec<Driver>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DRIVER} ORDER BY i.username, d.id"))?;

    let drivers = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(drivers)
}

/// Names are optional on the form but must not be whitespace-only when given.
pub fn validate_names(input: &DriverUpdate) -> Result<()> {
    for (field, value) in [("first_name", &input.first_name), ("last_name", &input.last_name)] {
        if !value.is_empty() {
            required(field, value)?;
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
