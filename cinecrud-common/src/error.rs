//! Common error types for cinecrud

use thiserror::Error;

/// Common result type for cinecrud operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across cinecrud crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization error (wraps serde_json::Error)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Write rejected because the store is full
    #[error("Storage quota exceeded: {used} of {quota} bytes")]
    QuotaExceeded { used: usize, quota: usize },

    /// In-memory store lock was poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
