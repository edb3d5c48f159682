// Entity Models - fleet records and their store operations
//
// Each module owns one table: row type, write inputs, and the
// create / get_by_id / update / delete / list_all functions over a
// `rusqlite::Connection`. Writes are meant to run inside `Database::write`.

pub mod manufacturer;
pub mod car;
pub mod driver;

pub use manufacturer::{Manufacturer, ManufacturerDeletePolicy, ManufacturerInput};
pub use car::{Car, CarInput};
pub use driver::{Driver, DriverUpdate, LicenseUpdate, NewDriver};
