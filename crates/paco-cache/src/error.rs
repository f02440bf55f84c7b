//! Error types for cache operations

use thiserror::Error;

/// Errors that can occur while building or configuring the result cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;
