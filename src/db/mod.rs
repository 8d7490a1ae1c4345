pub mod sqlite;
pub mod repository;
pub mod store;
pub mod sqlite_store;
pub mod postgrest;

pub use sqlite::*;
pub use repository::*;
pub use store::*;
pub use sqlite_store::SqliteStore;
pub use postgrest::PostgrestStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}

/// Errors raised by a catalog or record backend.
///
/// Reads absorb these (logged, empty result); writes surface the message.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Store write failed: {0}")]
    Write(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Store request failed: {0}")]
    Http(String),

    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse store response: {0}")]
    ResponseParsing(String),
}
