//! Configuration management for the taxi service.
//!
//! Configuration is loaded with figment, in order of precedence (highest
//! first):
//! 1. Environment variables prefixed with `TAXI_` (`TAXI_SERVER__LISTEN_ADDR`)
//! 2. A TOML file (`taxi.toml` in the working directory unless overridden)
//! 3. Default values

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::entities::ManufacturerDeletePolicy;
use crate::error::{Error, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "taxi.toml";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "taxi.db";

/// Default number of rows per list page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub fleet: FleetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Rows per page on list endpoints.
    pub page_size: usize,
    /// Behaviour when deleting a manufacturer that still has cars.
    pub manufacturer_delete: ManufacturerDeletePolicy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DATABASE_FILE_NAME),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            manufacturer_delete: ManufacturerDeletePolicy::default(),
        }
    }
}

impl Config {
    /// Load from defaults, `taxi.toml` and `TAXI_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    /// Load using `path` as the TOML layer. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TAXI_").split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.fleet.page_size == 0 {
            return Err(Error::ConfigValidation {
                message: "fleet.page_size must be greater than 0".to_string(),
            });
        }

        if self.server.listen_addr.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "server.listen_addr must not be empty".to_string(),
            });
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                message: "database.path must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
