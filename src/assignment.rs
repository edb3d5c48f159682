// Car <-> Driver assignment
//
// The relation is the `car_drivers` join table with (car_id, driver_id) as
// primary key, so an edge is either present or absent. Callers run these
// functions inside `Database::write`, which holds the connection lock and an
// IMMEDIATE transaction: the presence check and the flip cannot interleave
// with another writer.

use std::collections::BTreeSet;

use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::info;

use crate::entities::{car, driver};
use crate::error::{Error, Result};

/// Membership of a (car, driver) pair after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentState {
    Assigned,
    Unassigned,
}

impl AssignmentState {
    pub fn is_assigned(&self) -> bool {
        matches!(self, AssignmentState::Assigned)
    }
}

pub fn is_assigned(conn: &Connection, driver_id: i64, car_id: i64) -> Result<bool> {
    let present: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM car_drivers WHERE car_id = ?1 AND driver_id = ?2)",
        params![car_id, driver_id],
        |row| row.get(0),
    )?;

    Ok(present)
}

/// Add the edge if absent, remove it if present.
pub fn toggle_assignment(conn: &Connection, driver_id: i64, car_id: i64) -> Result<AssignmentState> {
    driver::get_by_id(conn, driver_id)?;
    car::get_by_id(conn, car_id)?;

    let state = if is_assigned(conn, driver_id, car_id)? {
        conn.execute(
            "DELETE FROM car_drivers WHERE car_id = ?1 AND driver_id = ?2",
            params![car_id, driver_id],
        )?;
        AssignmentState::Unassigned
    } else {
        conn.execute(
            "INSERT INTO car_drivers (car_id, driver_id) VALUES (?1, ?2)",
            params![car_id, driver_id],
        )?;
        AssignmentState::Assigned
    };

    info!(driver_id, car_id, state = ?state, "assignment toggled");
    Ok(state)
}

/// Replace the car's whole driver set with `driver_ids` (duplicates ignored).
pub fn replace_car_drivers(conn: &Connection, car_id: i64, driver_ids: &[i64]) -> Result<()> {
    let wanted: BTreeSet<i64> = driver_ids.iter().copied().collect();

    for &driver_id in &wanted {
        match driver::get_by_id(conn, driver_id) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                return Err(Error::validation(
                    "driver_ids",
                    format!("driver {driver_id} does not exist"),
                ));
            }
            Err(e) => return Err(e),
        }
    }

    conn.execute("DELETE FROM car_drivers WHERE car_id = ?1", [car_id])?;

    let mut stmt = conn.prepare("INSERT INTO car_drivers (car_id, driver_id) VALUES (?1, ?2)")?;
    for driver_id in &wanted {
        stmt.execute(params![car_id, driver_id])?;
    }

    Ok(())
}

/// Number of edges in the relation.
pub fn count_edges(conn: &Connection) -> Result<i64> {
    crate::db::count_rows(conn, "car_drivers")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{setup_database, Database};
    use crate::entities::car::CarInput;
    use crate::entities::driver::NewDriver;
    use crate::entities::manufacturer::{self, ManufacturerInput};
    use std::sync::Arc;

    fn seed(conn: &Connection) -> (i64, i64) {
        let m = manufacturer::create(conn, &ManufacturerInput::new("Toyota", "Japan")).unwrap();
        let c = car::create(conn, &CarInput::new("Prius", m.id)).unwrap();
        let d = driver::create(
            conn,
            &NewDriver::new("ayrton", "password-1", "AYR12345", "Ayrton", "Senna"),
        )
        .unwrap();
        (d.id, c.id)
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let (driver_id, car_id) = seed(&conn);

        assert!(!is_assigned(&conn, driver_id, car_id).unwrap());

        let first = toggle_assignment(&conn, driver_id, car_id).unwrap();
        assert_eq!(first, AssignmentState::Assigned);
        assert!(is_assigned(&conn, driver_id, car_id).unwrap());

        let second = toggle_assignment(&conn, driver_id, car_id).unwrap();
        assert_eq!(second, AssignmentState::Unassigned);
        assert!(!is_assigned(&conn, driver_id, car_id).unwrap());
        assert_eq!(count_edges(&conn).unwrap(), 0);
    }

    #[test]
    fn test_toggle_unknown_ids() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let (driver_id, car_id) = seed(&conn);

        let err = toggle_assignment(&conn, 999, car_id).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "driver", .. }));

        let err = toggle_assignment(&conn, driver_id, 999).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "car", .. }));

        assert_eq!(count_edges(&conn).unwrap(), 0);
    }

    #[test]
    fn test_replace_car_drivers() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let (driver_id, car_id) = seed(&conn);
        let other = driver::create(
            &conn,
            &NewDriver::new("alain", "password-1", "ALA12345", "Alain", "Prost"),
        )
        .unwrap();

        replace_car_drivers(&conn, car_id, &[driver_id, other.id, driver_id]).unwrap();
        assert_eq!(count_edges(&conn).unwrap(), 2);

        replace_car_drivers(&conn, car_id, &[other.id]).unwrap();
        assert!(!is_assigned(&conn, driver_id, car_id).unwrap());
        assert!(is_assigned(&conn, other.id, car_id).unwrap());

        let err = replace_car_drivers(&conn, car_id, &[12345]).unwrap_err();
        assert!(err.is_validation());
        assert!(is_assigned(&conn, other.id, car_id).unwrap(), "failed replace leaves set intact");
    }

    #[test]
    fn test_concurrent_toggles_serialize() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (driver_id, car_id) = db.write(|tx| Ok(seed(tx))).unwrap();

        const THREADS: usize = 8;
        const FLIPS_PER_THREAD: usize = 25;

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    for _ in 0..FLIPS_PER_THREAD {
                        db.write(|tx| toggle_assignment(tx, driver_id, car_id))
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // 200 flips from "absent" is even: the edge must be absent, never duplicated
        let total = THREADS * FLIPS_PER_THREAD;
        let present = db.read(|conn| is_assigned(conn, driver_id, car_id)).unwrap();
        assert_eq!(present, total % 2 == 1);
        assert!(db.read(count_edges).unwrap() <= 1);
    }

    #[test]
    fn test_concurrent_odd_flip_count_leaves_edge() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (driver_id, car_id) = db.write(|tx| Ok(seed(tx))).unwrap();

        let handles: Vec<_> = (0..7)
            .map(|_| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    db.write(|tx| toggle_assignment(tx, driver_id, car_id))
                        .unwrap()
                })
            })
            .collect();

        let assigned = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(AssignmentState::is_assigned)
            .count();

        // Serial order of 7 flips starting absent: 4 adds, 3 removes
        assert_eq!(assigned, 4);
        assert_eq!(db.read(count_edges).unwrap(), 1);
    }
}
