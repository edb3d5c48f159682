// Manufacturer Entity - referenced (not owned) by cars
//
// Name is unique across the fleet. Deleting a manufacturer never leaves a car
// pointing at nothing: the configured ManufacturerDeletePolicy either blocks
// the delete or takes the cars with it.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{is_constraint_violation, Error, Result};
use crate::validation::required;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: i64,
    pub name: String,
    pub country: String,
}

/// Writable fields of a manufacturer (create and update share it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
}

impl ManufacturerInput {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }

    fn clean(&self) -> Result<ManufacturerInput> {
        Ok(ManufacturerInput {
            name: required("name", &self.name)?,
            country: required("country", &self.country)?,
        })
    }
}

/// What happens to cars when their manufacturer is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManufacturerDeletePolicy {
    /// Refuse with a conflict while any car references the manufacturer.
    #[default]
    Restrict,
    /// Delete the manufacturer's cars (and their assignments) as well.
    Cascade,
}

impl ManufacturerDeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManufacturerDeletePolicy::Restrict => "restrict",
            ManufacturerDeletePolicy::Cascade => "cascade",
        }
    }
}

// ============================================================================
// STORE OPERATIONS
// ============================================================================

fn from_row(row: &Row<'_>) -> rusqlite::Result<Manufacturer> {
    Ok(Manufacturer {
        id: row.get(0)?,
        name: row.get(1)?,
        country: row.get(2)?,
    })
}

fn ensure_unique_name(conn: &Connection, name: &str, exclude_id: Option<i64>) -> Result<()> {
    let taken: Option<i64> = conn
        .query_row(
            "SELECT id FROM manufacturers WHERE name = ?1 AND id != ?2",
            params![name, exclude_id.unwrap_or(0)],
            |row| row.get(0),
        )
        .optional()?;

    if taken.is_some() {
        return Err(Error::validation(
            "name",
            format!("manufacturer with name '{name}' already exists"),
        ));
    }
    Ok(())
}

fn map_write_error(err: rusqlite::Error) -> Error {
    if is_constraint_violation(&err) {
        Error::validation("name", "manufacturer with this name already exists")
    } else {
        err.into()
    }
}

pub fn create(conn: &Connection, input: &ManufacturerInput) -> Result<Manufacturer> {
    let input = input.clean()?;
    ensure_unique_name(conn, &input.name, None)?;

    conn.execute(
        "INSERT INTO manufacturers (name, country) VALUES (?1, ?2)",
        params![input.name, input.country],
    )
    .map_err(map_write_error)?;

    let id = conn.last_insert_rowid();
    info!(manufacturer_id = id, name = %input.name, "manufacturer created");

    Ok(Manufacturer {
        id,
        name: input.name,
        country: input.country,
    })
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Manufacturer> {
    conn.query_row(
        "SELECT id, name, country FROM manufacturers WHERE id = ?1",
        [id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("manufacturer", id))
}

pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Manufacturer>> {
    let found = conn
        .query_row(
            "SELECT id, name, country FROM manufacturers WHERE name = ?1",
            [name],
            from_row,
        )
        .optional()?;

    Ok(found)
}

pub fn update(conn: &Connection, id: i64, input: &ManufacturerInput) -> Result<Manufacturer> {
    let input = input.clean()?;
    get_by_id(conn, id)?;
    ensure_unique_name(conn, &input.name, Some(id))?;

    conn.execute(
        "UPDATE manufacturers SET name = ?1, country = ?2 WHERE id = ?3",
        params![input.name, input.country, id],
    )
    .map_err(map_write_error)?;

    Ok(Manufacturer {
        id,
        name: input.name,
        country: input.country,
    })
}

/// Delete a manufacturer according to `policy`.
///
/// Returns the number of cars removed alongside it (always 0 for `Restrict`).
pub fn delete(conn: &Connection, id: i64, policy: ManufacturerDeletePolicy) -> Result<usize> {
    get_by_id(conn, id)?;

    let car_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cars WHERE manufacturer_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    let removed_cars = match policy {
        ManufacturerDeletePolicy::Restrict if car_count > 0 => {
            return Err(Error::conflict(format!(
                "manufacturer {id} is still referenced by {car_count} car(s)"
            )));
        }
        ManufacturerDeletePolicy::Restrict => 0,
        ManufacturerDeletePolicy::Cascade => {
            conn.execute(
                "DELETE FROM car_drivers
                 WHERE car_id IN (SELECT id FROM cars WHERE manufacturer_id = ?1)",
                [id],
            )?;
            conn.execute("DELETE FROM cars WHERE manufacturer_id = ?1", [id])?
        }
    };

    conn.execute("DELETE FROM manufacturers WHERE id = ?1", [id])?;
    info!(
        manufacturer_id = id,
        removed_cars,
        policy = policy.as_str(),
        "manufacturer deleted"
    );

    Ok(removed_cars)
}

/// All manufacturers ordered by name.
pub fn list_all(conn: &Connection) -> Result<Vec<Manufacturer>> {
    let mut stmt = conn.prepare("SELECT id, name, country FROM manufacturers ORDER BY name, id")?;

    let manufacturers = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(manufacturers)
}

// ============================================================================
// TESTS
// ============================================================================
