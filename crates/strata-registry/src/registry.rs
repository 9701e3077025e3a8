//! Configuration property registry
//!
//! The registry is the collaborator that tells parsers what they know about
//! each property: its scope, whether it is restricted, its default value and
//! the policy that may force it.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use strata_tree::merge_contents;

use crate::error::{Error, Result};
use crate::override_key::{is_override_key, override_identifiers_from_key};
use crate::property::PropertySchema;

/// Registry of known configuration properties.
///
/// # Example
///
/// ```
/// use strata_registry::{ConfigurationRegistry, PropertySchema};
/// use serde_json::json;
///
/// let mut registry = ConfigurationRegistry::new();
/// registry
///     .register_property("editor.wordWrap", PropertySchema::new().with_default(json!("off")))
///     .unwrap();
///
/// assert!(registry.property("editor.wordWrap").is_some());
/// assert_eq!(registry.default_values()["editor.wordWrap"], json!("off"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigurationRegistry {
    /// Active properties keyed by dotted key
    properties: BTreeMap<String, PropertySchema>,

    /// Properties registered with `included: false`
    excluded: BTreeMap<String, PropertySchema>,

    /// Maps policy names to the property they control
    policies: HashMap<String, String>,

    /// Default overrides: either `key -> value` for registered properties or
    /// `[id] -> object` for override-scoped defaults
    default_overrides: Map<String, Value>,
}

impl ConfigurationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a property.
    ///
    /// Fails for empty keys, override keys, keys that are already registered
    /// and policy names that already control another property.
    pub fn register_property(&mut self, key: impl Into<String>, schema: PropertySchema) -> Result<()> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::EmptyProperty);
        }
        if is_override_key(&key) {
            return Err(Error::OverrideProperty { key });
        }
        if self.properties.contains_key(&key) || self.excluded.contains_key(&key) {
            return Err(Error::DuplicateProperty { key });
        }
        if let Some(policy) = &schema.policy {
            if let Some(existing) = self.policies.get(policy) {
                return Err(Error::DuplicatePolicy {
                    key,
                    policy: policy.clone(),
                    existing: existing.clone(),
                });
            }
            self.policies.insert(policy.clone(), key.clone());
        }

        tracing::debug!(%key, scope = %schema.effective_scope(), included = schema.included, "Registering property");
        if schema.included {
            self.properties.insert(key, schema);
        } else {
            self.excluded.insert(key, schema);
        }
        Ok(())
    }

    /// Register several properties, skipping and collecting the invalid ones.
    pub fn register_properties<I, K>(&mut self, properties: I) -> Vec<Error>
    where
        I: IntoIterator<Item = (K, PropertySchema)>,
        K: Into<String>,
    {
        let mut rejected = Vec::new();
        for (key, schema) in properties {
            if let Err(error) = self.register_property(key, schema) {
                tracing::warn!(%error, "Skipping invalid property");
                rejected.push(error);
            }
        }
        rejected
    }

    /// Remove a property, returning its schema.
    pub fn deregister_property(&mut self, key: &str) -> Result<PropertySchema> {
        let schema = self
            .properties
            .remove(key)
            .or_else(|| self.excluded.remove(key))
            .ok_or_else(|| Error::PropertyNotFound {
                key: key.to_string(),
            })?;
        if let Some(policy) = &schema.policy {
            self.policies.remove(policy);
        }
        Ok(schema)
    }

    /// Contribute default overrides.
    ///
    /// Plain keys replace the default of that property. Override keys such as
    /// `[markdown]` must map to objects, which are deep-merged into any
    /// earlier contribution for the same key.
    pub fn register_default_overrides(&mut self, overrides: &Map<String, Value>) -> Result<()> {
        for (key, value) in overrides {
            if is_override_key(key) {
                let Value::Object(contents) = value else {
                    return Err(Error::InvalidOverrideDefault { key: key.clone() });
                };
                match self.default_overrides.get_mut(key) {
                    Some(Value::Object(existing)) => merge_contents(existing, contents),
                    _ => {
                        self.default_overrides
                            .insert(key.clone(), Value::Object(contents.clone()));
                    }
                }
            } else {
                self.default_overrides.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Remove previously contributed default overrides.
    pub fn deregister_default_overrides<S: AsRef<str>>(&mut self, keys: &[S]) {
        for key in keys {
            self.default_overrides.shift_remove(key.as_ref());
        }
    }

    /// Get an active property's schema.
    pub fn property(&self, key: &str) -> Option<&PropertySchema> {
        self.properties.get(key)
    }

    /// Get an excluded property's schema.
    pub fn excluded_property(&self, key: &str) -> Option<&PropertySchema> {
        self.excluded.get(key)
    }

    /// All active properties, sorted by key.
    pub fn properties(&self) -> &BTreeMap<String, PropertySchema> {
        &self.properties
    }

    /// All excluded properties, sorted by key.
    pub fn excluded_properties(&self) -> &BTreeMap<String, PropertySchema> {
        &self.excluded
    }

    /// The property controlled by a policy name.
    pub fn policy_property(&self, policy: &str) -> Option<&str> {
        self.policies.get(policy).map(String::as_str)
    }

    /// Flat `{key: default}` map of every active property with a default,
    /// followed by the override-scoped default buckets.
    pub fn default_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        for (key, schema) in &self.properties {
            let value = self
                .default_overrides
                .get(key)
                .or(schema.default.as_ref());
            if let Some(value) = value {
                values.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &self.default_overrides {
            if is_override_key(key) {
                values.insert(key.clone(), value.clone());
            }
        }
        values
    }

    /// Identifiers that have override-scoped defaults.
    pub fn override_identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = Vec::new();
        for key in self.default_overrides.keys() {
            for identifier in override_identifiers_from_key(key) {
                if !identifiers.contains(&identifier) {
                    identifiers.push(identifier);
                }
            }
        }
        identifiers
    }

    /// Get the number of active properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the registry has no active properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
