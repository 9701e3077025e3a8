//! Property schemas
//!
//! The metadata the registry keeps about one configuration property.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scope::ConfigurationScope;

fn default_included() -> bool {
    true
}

/// Known metadata for a configuration property.
///
/// # Example
///
/// ```
/// use strata_registry::{ConfigurationScope, PropertySchema};
/// use serde_json::json;
///
/// let schema = PropertySchema::new()
///     .with_scope(ConfigurationScope::Resource)
///     .with_default(json!("off"))
///     .restricted();
///
/// assert_eq!(schema.effective_scope(), ConfigurationScope::Resource);
/// assert!(schema.restricted);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    /// Where the property may be set; `None` means window scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ConfigurationScope>,

    /// Requires a trusted source to take effect
    #[serde(default)]
    pub restricted: bool,

    /// Built-in default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Excluded properties are known but not part of the active schema
    #[serde(default = "default_included")]
    pub included: bool,

    /// Name of the administrative policy that controls this property
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for PropertySchema {
    fn default() -> Self {
        Self {
            scope: None,
            restricted: false,
            default: None,
            included: default_included(),
            policy: None,
            description: None,
        }
    }
}

impl PropertySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: ConfigurationScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn restricted(mut self) -> Self {
        self.restricted = true;
        self
    }

    /// Mark the property as known but excluded from the active schema.
    pub fn excluded(mut self) -> Self {
        self.included = false;
        self
    }

    /// The scope used for filtering; unset scopes count as window scope.
    pub fn effective_scope(&self) -> ConfigurationScope {
        self.scope.unwrap_or_default()
    }
}
