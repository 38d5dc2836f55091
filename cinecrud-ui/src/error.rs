//! Error types for cinecrud-ui

use thiserror::Error;

use crate::tmdb_client::TmdbError;

/// Front-end error type
#[derive(Debug, Error)]
pub enum UiError {
    /// Storage or configuration failure from the common crate
    #[error("Common error: {0}")]
    Common(#[from] cinecrud_common::Error),

    /// Remote catalog failure
    #[error("Remote catalog error: {0}")]
    Remote(#[from] TmdbError),

    /// Terminal I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for front-end operations
pub type UiResult<T> = Result<T, UiError>;
