// Car Entity - many cars to one manufacturer
//
// A car must always point at an existing manufacturer. Deleting a car drops
// every assignment edge that touches it.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assignment;
use crate::entities::manufacturer;
use crate::error::{Error, Result};
use crate::validation::required;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    pub model: String,
    pub manufacturer_id: i64,
}

/// Writable fields of a car.
///
/// `driver_ids`, when present, replaces the car's full assignment set in the
/// same transaction as the car write. `None` leaves assignments untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarInput {
    #[serde(default)]
    pub model: String,
    /// Absent ids deserialize as 0, which never resolves.
    #[serde(default)]
    pub manufacturer_id: i64,
    #[serde(default)]
    pub driver_ids: Option<Vec<i64>>,
}

impl CarInput {
    pub fn new(model: impl Into<String>, manufacturer_id: i64) -> Self {
        Self {
            model: model.into(),
            manufacturer_id,
            driver_ids: None,
        }
    }

    pub fn with_drivers(mut self, driver_ids: Vec<i64>) -> Self {
        self.driver_ids = Some(driver_ids);
        self
    }

    fn clean(&self, conn: &Connection) -> Result<String> {
        let model = required("model", &self.model)?;

        match manufacturer::get_by_id(conn, self.manufacturer_id) {
            Ok(_) => Ok(model),
            Err(e) if e.is_not_found() => Err(Error::validation(
                "manufacturer_id",
                format!("manufacturer {} does not exist", self.manufacturer_id),
            )),
            Err(e) => Err(e),
        }
    }
}

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get(0)?,
        model: row.get(1)?,
        manufacturer_id: row.get(2)?,
    })
}

pub fn create(conn: &Connection, input: &CarInput) -> Result<Car> {
    let model = input.clean(conn)?;

    conn.execute(
        "INSERT INTO cars (model, manufacturer_id) VALUES (?1, ?2)",
        params![model, input.manufacturer_id],
    )?;
    let id = conn.last_insert_rowid();

    if let Some(driver_ids) = &input.driver_ids {
        assignment::replace_car_drivers(conn, id, driver_ids)?;
    }

    info!(car_id = id, %model, manufacturer_id = input.manufacturer_id, "car created");

    Ok(Car {
        id,
        model,
        manufacturer_id: input.manufacturer_id,
    })
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Car> {
    conn.query_row(
        "SELECT id, model, manufacturer_id FROM cars WHERE id = ?1",
        [id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("car", id))
}

pub fn update(conn: &Connection, id: i64, input: &CarInput) -> Result<Car> {
    get_by_id(conn, id)?;
    let model = input.clean(conn)?;

    conn.execute(
        "UPDATE cars SET model = ?1, manufacturer_id = ?2 WHERE id = ?3",
        params![model, input.manufacturer_id, id],
    )?;

    if let Some(driver_ids) = &input.driver_ids {
        assignment::replace_car_drivers(conn, id, driver_ids)?;
    }

    Ok(Car {
        id,
        model,
        manufacturer_id: input.manufacturer_id,
    })
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    get_by_id(conn, id)?;

    let edges = conn.execute("DELETE FROM car_drivers WHERE car_id = ?1", [id])?;
    conn.execute("DELETE FROM cars WHERE id = ?1", [id])?;
    info!(car_id = id, removed_assignments = edges, "car deleted");

    Ok(())
}

/// All cars ordered by id.
pub fn list_all(conn: &Connection) -> Result<Vec<Car>> {
    let mut stmt = conn.prepare("SELECT id, model, manufacturer_id FROM cars ORDER BY id")?;

    let cars = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(cars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::entities::driver::{self, NewDriver};
    use crate::entities::manufacturer::ManufacturerInput;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_then_get_round_trip() {
        let conn = test_conn();
        let m = manufacturer::create(&conn, &ManufacturerInput::new("Nissan", "Japan")).unwrap();

        let car = create(&conn, &CarInput::new("Leaf", m.id)).unwrap();
        assert_eq!(get_by_id(&conn, car.id).unwrap(), car);
        assert_eq!(car.manufacturer_id, m.id);
    }

    #[test]
    fn test_create_requires_model_and_manufacturer() {
        let conn = test_conn();
        let m = manufacturer::create(&conn, &ManufacturerInput::new("Peugeot", "France")).unwrap();

        let err = create(&conn, &CarInput::new("   ", m.id)).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "model"));

        let err = create(&conn, &CarInput::new("208", 999)).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "manufacturer_id"));
    }

    #[test]
    fn test_create_with_drivers_assigns_them() {
        let conn = test_conn();
        let m = manufacturer::create(&conn, &ManufacturerInput::new("Renault", "France")).unwrap();
        let d = driver::create(
            &conn,
            &NewDriver::new("rene", "password-1", "REN12345", "Rene", "Arnoux"),
        )
        .unwrap();

        let car = create(&conn, &CarInput::new("Clio", m.id).with_drivers(vec![d.id])).unwrap();
        assert!(assignment::is_assigned(&conn, d.id, car.id).unwrap());
    }

    #[test]
    fn test_update_changes_fields() {
        let conn = test_conn();
        let m1 = manufacturer::create(&conn, &ManufacturerInput::new("Dacia", "Romania")).unwrap();
        let m2 = manufacturer::create(&conn, &ManufacturerInput::new("Skoda", "Czechia")).unwrap();
        let car = create(&conn, &CarInput::new("Logan", m1.id)).unwrap();

        let updated = update(&conn, car.id, &CarInput::new("Octavia", m2.id)).unwrap();
        assert_eq!(updated.model, "Octavia");
        assert_eq!(get_by_id(&conn, car.id).unwrap().manufacturer_id, m2.id);

        let err = update(&conn, 404, &CarInput::new("Fabia", m2.id)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_removes_edges() {
        let conn = test_conn();
        let m = manufacturer::create(&conn, &ManufacturerInput::new("Citroen", "France")).unwrap();
        let d = driver::create(
            &conn,
            &NewDriver::new("andre", "password-1", "AND12345", "Andre", "C"),
        )
        .unwrap();
        let car = create(&conn, &CarInput::new("C4", m.id).with_drivers(vec![d.id])).unwrap();

        delete(&conn, car.id).unwrap();

        assert!(get_by_id(&conn, car.id).unwrap_err().is_not_found());
        let edges: i64 = conn
            .query_row("SELECT COUNT(*) FROM car_drivers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(edges, 0);
        assert!(delete(&conn, car.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_all_ordered_by_id() {
        let conn = test_conn();
        let m = manufacturer::create(&conn, &ManufacturerInput::new("Tata", "India")).unwrap();
        let a = create(&conn, &CarInput::new("Nano", m.id)).unwrap();
        let b = create(&conn, &CarInput::new("Indica", m.id)).unwrap();

        let ids: Vec<i64> = list_all(&conn).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }
}
