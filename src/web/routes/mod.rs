//! HTTP route handlers.

pub mod cars;
pub mod drivers;
pub mod health;
pub mod index;
pub mod manufacturers;
