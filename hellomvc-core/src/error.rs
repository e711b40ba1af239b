//! Error types for hellomvc

use thiserror::Error;

/// Result type for hellomvc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hellomvc
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}
