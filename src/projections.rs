// Read projections - joined shapes for list and detail screens
//
// Each projection loads related rows in a fixed number of queries regardless
// of how many rows come back: one JOIN for the car list, and for details the
// record itself plus one joined query for its related set.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::count_rows;
use crate::entities::car::{self, Car};
use crate::entities::driver::{self, Driver};
use crate::entities::manufacturer::{self, Manufacturer};
use crate::error::Result;

/// A car row pre-joined with its manufacturer's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarSummary {
    pub id: i64,
    pub model: String,
    pub manufacturer_id: i64,
    pub manufacturer_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarWithManufacturer {
    pub car: Car,
    pub manufacturer: Manufacturer,
}

/// Driver detail: profile plus every assigned car and its manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverDetail {
    pub driver: Driver,
    pub cars: Vec<CarWithManufacturer>,
}

/// Car detail: car, manufacturer and assigned drivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarDetail {
    pub car: Car,
    pub manufacturer: Manufacturer,
    pub drivers: Vec<Driver>,
}

/// Point-in-time entity counts for the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub driver_count: i64,
    pub car_count: i64,
    pub manufacturer_count: i64,
}

pub fn list_cars_with_manufacturer(conn: &Connection) -> Result<Vec<CarSummary>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.model, c.manufacturer_id, m.name
         FROM cars c
         JOIN manufacturers m ON m.id = c.manufacturer_id
         ORDER BY c.id",
    )?;

    let cars = stmt
        .query_map([], |row| {
            Ok(CarSummary {
                id: row.get(0)?,
                model: row.get(1)?,
                manufacturer_id: row.get(2)?,
                manufacturer_name: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(cars)
}

pub fn get_driver_with_cars(conn: &Connection, driver_id: i64) -> Result<DriverDetail> {
    let driver = driver::get_by_id(conn, driver_id)?;

    let mut stmt = conn.prepare(
        "SELECT c.id, c.model, c.manufacturer_id, m.id, m.name, m.country
         FROM car_drivers cd
         JOIN cars c ON c.id = cd.car_id
         JOIN manufacturers m ON m.id = c.manufacturer_id
         WHERE cd.driver_id = ?1
         ORDER BY c.id",
    )?;

    let cars = stmt
        .query_map(params![driver_id], |row| {
            Ok(CarWithManufacturer {
                car: Car {
                    id: row.get(0)?,
                    model: row.get(1)?,
                    manufacturer_id: row.get(2)?,
                },
                manufacturer: Manufacturer {
                    id: row.get(3)?,
                    name: row.get(4)?,
                    country: row.get(5)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DriverDetail { driver, cars })
}

pub fn get_car_with_drivers(conn: &Connection, car_id: i64) -> Result<CarDetail> {
    let car = car::get_by_id(conn, car_id)?;
    let manufacturer = manufacturer::get_by_id(conn, car.manufacturer_id)?;

    let mut stmt = conn.prepare(
        "SELECT d.id, d.identity_id, i.username, d.first_name, d.last_name, d.license_number
         FROM car_drivers cd
         JOIN drivers d ON d.id = cd.driver_id
         JOIN identities i ON i.id = d.identity_id
         WHERE cd.car_id = ?1
         ORDER BY i.username",
    )?;

    let drivers = stmt
        .query_map(params![car_id], driver::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CarDetail {
        car,
        manufacturer,
        drivers,
    })
}

pub fn counts(conn: &Connection) -> Result<Counts> {
    Ok(Counts {
        driver_count: count_rows(conn, "drivers")?,
        car_count: count_rows(conn, "cars")?,
        manufacturer_count: count_rows(conn, "manufacturers")?,
    })
}
