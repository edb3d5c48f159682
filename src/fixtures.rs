// Fixture import - seed manufacturers and cars from CSV
//
// Expected header: Manufacturer,Country,Model
// Manufacturers are matched by name, so re-running an import never creates a
// second manufacturer row. A blank Model registers the manufacturer only.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::entities::car::{self, CarInput};
use crate::entities::manufacturer::{self, ManufacturerInput};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FixtureRow {
    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,

    #[serde(rename = "Country")]
    pub country: String,

    #[serde(rename = "Model", default)]
    pub model: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub manufacturers_created: usize,
    pub cars_created: usize,
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<FixtureRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let rows = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<FixtureRow>, _>>()?;

    debug!(path = %csv_path.display(), rows = rows.len(), "fixture CSV loaded");
    Ok(rows)
}

/// Apply `rows`. Run inside `Database::write` so a bad row rolls back the batch.
pub fn import_fixtures(conn: &Connection, rows: &[FixtureRow]) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        rows: rows.len(),
        ..ImportSummary::default()
    };

    for row in rows {
        let maker = match manufacturer::find_by_name(conn, row.manufacturer.trim())? {
            Some(existing) => existing,
            None => {
                summary.manufacturers_created += 1;
                manufacturer::create(
                    conn,
                    &ManufacturerInput::new(row.manufacturer.as_str(), row.country.as_str()),
                )?
            }
        };

        if row.model.trim().is_empty() {
            continue;
        }

        car::create(conn, &CarInput::new(row.model.as_str(), maker.id))?;
        summary.cars_created += 1;
    }

    info!(
        rows = summary.rows,
        manufacturers = summary.manufacturers_created,
        cars = summary.cars_created,
        "fixtures imported"
    );

    Ok(summary)
}
