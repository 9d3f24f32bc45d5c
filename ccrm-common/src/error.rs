//! Common error types for CCRM

use thiserror::Error;

/// Common result type for CCRM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CCRM crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested document not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document id already taken
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a missing document in `collection`
    pub fn not_found(collection: &str, id: &str) -> Self {
        Error::NotFound(format!("{}/{}", collection, id))
    }
}
