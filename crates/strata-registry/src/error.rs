//! Error types for strata-registry

/// Result type for strata-registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when registering configuration properties
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot register an empty property")]
    EmptyProperty,

    #[error("Cannot register '{key}'. This matches the override property pattern '[...]'")]
    OverrideProperty { key: String },

    #[error("Cannot register '{key}'. This property is already registered")]
    DuplicateProperty { key: String },

    #[error("Cannot register '{key}'. The associated policy {policy} is already registered with {existing}")]
    DuplicatePolicy {
        key: String,
        policy: String,
        existing: String,
    },

    #[error("Property not found: {key}")]
    PropertyNotFound { key: String },

    #[error("Invalid default override for '{key}': expected an object")]
    InvalidOverrideDefault { key: String },
}
