/// Database Module
///
/// This module provides the connection and execution layer the ORM core
/// rides on, split into two concerns:
/// - **Connection Management** (`connection.rs`): the shared handle, its
///   statement lock, and the optional process-wide registration
/// - **Query Execution** (`executor.rs`): running compiled statements and
///   decoding results
///
/// All operations use the standardized `OrmError` type for consistent error
/// propagation.
pub mod connection;
pub mod executor;

pub use connection::*;
pub use executor::*;
