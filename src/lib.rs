// Taxi Fleet Service - Core Library
// Exposes all modules for use in the CLI, the HTTP server, and tests

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod validation;
pub mod identity;
pub mod entities;
pub mod assignment;
pub mod projections;
pub mod session;
pub mod fixtures;

#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use db::{setup_database, Database};
pub use error::{Error, Result};
pub use entities::{
    Car, CarInput,
    Driver, DriverUpdate, LicenseUpdate, NewDriver,
    Manufacturer, ManufacturerDeletePolicy, ManufacturerInput,
};
pub use assignment::{toggle_assignment, AssignmentState};
pub use projections::{
    CarDetail, CarSummary, CarWithManufacturer, Counts, DriverDetail,
    counts, get_car_with_drivers, get_driver_with_cars, list_cars_with_manufacturer,
};
pub use session::{MemoryVisitCounter, SqliteVisitCounter, VisitCounter};
pub use fixtures::{import_fixtures, load_csv, FixtureRow, ImportSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
