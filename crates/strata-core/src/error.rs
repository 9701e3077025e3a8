//! Error types for strata-core

use crate::resource::Resource;

/// Result type for strata-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A folder layer was addressed that the configuration does not hold
    #[error("Unknown workspace folder: {folder}")]
    UnknownFolder { folder: Resource },

    /// A cached settings entry could not be decoded
    #[error("Invalid cache entry {key}: {message}")]
    Cache { key: String, message: String },

    /// A log subscriber could not be installed
    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },

    // Transparent wrappers for underlying crate errors
    /// Registry error from strata-registry
    #[error(transparent)]
    Registry(#[from] strata_registry::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
