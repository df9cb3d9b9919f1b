//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache library.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid or contradictory configuration, rejected at construction
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Write would exceed the configured entry limit
    #[error("Cache full: {0}")]
    Capacity(String),

    /// I/O or serialization failure during save/load
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Cryptographic failure, distinct from Persistence so callers can tell
    /// "wrong key" from "disk full"
    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Persistence(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;
