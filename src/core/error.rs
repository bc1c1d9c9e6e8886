/// litorm Error Module
///
/// This module defines the error types shared across the crate. It provides
/// structured error handling with proper error propagation, so that callers
/// always see where a failure originated: in the caller's own query
/// construction, or in the database backend.
use thiserror::Error;

/// Error type covering every failure mode of the ORM:
/// - Backend rejections from SQLite (schema mismatch, type error, constraint violation)
/// - Clause validation caught before execution
/// - Result decoding problems
/// - Configuration loading and validation
/// - Connection handle management
///
/// A lookup that matches zero rows is not an error; read operations report
/// absence through `Option` so call sites stay simple.
#[derive(Error, Debug)]
pub enum OrmError {
    /// Backend errors from SQLite operations, propagated unmodified
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Clause combinations rejected before execution (bad identifier,
    /// unsupported statement shape)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Result decoding and statement preparation errors
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection handle errors (poisoned lock, missing global handle)
    #[error("Connection error: {0}")]
    Connection(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use OrmError as the error type.
pub type Result<T> = std::result::Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let db_err = OrmError::Database(rusqlite::Error::ExecuteReturnedResults);
        assert!(db_err.to_string().contains("Database error"));

        let validation_err = OrmError::Validation("bad column name".to_string());
        assert!(validation_err.to_string().contains("Validation error"));

        let config_err = OrmError::Config("invalid config".to_string());
        assert!(config_err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_conversion() {
        // IO error conversion
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let orm_err: OrmError = io_err.into();
        match orm_err {
            OrmError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        // SQLite error conversion
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let orm_err: OrmError = sqlite_err.into();
        match orm_err {
            OrmError::Database(_) => {}
            _ => panic!("Expected Database error"),
        }
    }
}
