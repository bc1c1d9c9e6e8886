/// Core Module for litorm
///
/// This module contains the shared infrastructure the rest of the crate
/// builds on: the database connection/execution layer and the crate-wide
/// error type.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{OrmError, Result};
