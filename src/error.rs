//! Error types for the taxi service.
//!
//! Every core operation surfaces one of these to the caller. The request
//! layer decides how each variant is presented (field feedback, 404, login
//! redirect); nothing here is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for fleet operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// A field was missing, malformed, or violated a uniqueness rule.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// Human readable reason.
        message: String,
    },

    /// The requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind ("car", "driver", ...).
        entity: &'static str,
        /// The id that failed to resolve.
        id: i64,
    },

    /// The operation is blocked by a referential dependency.
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the blocking dependency.
        message: String,
    },

    /// The caller is not authenticated.
    #[error("authentication required")]
    Unauthorized,

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Import Errors ===
    /// Reading a fixture CSV failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for fleet operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for `field`.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means a record did not resolve.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a field validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Returns true when `err` is a SQLite UNIQUE/FOREIGN KEY constraint failure.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("license_number", "must be 8 characters");
        assert_eq!(
            err.to_string(),
            "invalid license_number: must be 8 characters"
        );
        assert!(err.is_validation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("car", 42);
        assert_eq!(err.to_string(), "car 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_conflict_display() {
        let err = Error::conflict("manufacturer 1 still has 2 cars");
        assert!(err.to_string().contains("still has 2 cars"));
    }

    #[test]
    fn test_unauthorized_display() {
        assert_eq!(Error::Unauthorized.to_string(), "authentication required");
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::Database(_)));
        }
    }

    #[test]
    fn test_constraint_violation_detection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (name TEXT UNIQUE)", []).unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('a')", []).unwrap();
        let err = conn
            .execute("INSERT INTO t (name) VALUES ('a')", [])
            .unwrap_err();
        assert!(is_constraint_violation(&err));
        assert!(!is_constraint_violation(&rusqlite::Error::InvalidQuery));
    }
}
