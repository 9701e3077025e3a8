//! Property registry and override-key syntax for Strata.
//!
//! This crate provides the metadata collaborator used while parsing
//! configuration sources: which properties exist, where they may be set,
//! and which top-level keys are override buckets.

pub mod error;
pub mod override_key;
pub mod property;
pub mod registry;
pub mod scope;

pub use error::{Error, Result};
pub use override_key::{
    OVERRIDE_PROPERTY_REGEX, is_override_key, key_from_override_identifiers,
    override_identifiers_from_key,
};
pub use property::PropertySchema;
pub use registry::ConfigurationRegistry;
pub use scope::{
    APPLICATION_SCOPES, ConfigurationScope, FOLDER_SCOPES, WORKSPACE_SCOPES, parse_scope,
};
