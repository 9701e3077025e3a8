//! Models derived from the property registry

use serde_json::{Map, Value};

use strata_registry::ConfigurationRegistry;

use crate::model::ConfigurationModel;
use crate::parse_options::ParseOptions;
use crate::parser::ConfigurationModelParser;

/// Build the default layer from the registry's defaults.
///
/// Override-scoped defaults such as `[markdown]` become override buckets.
pub fn default_configuration_model(registry: &ConfigurationRegistry) -> ConfigurationModel {
    let mut parser = ConfigurationModelParser::new("defaults");
    parser.parse_raw(registry.default_values(), &ParseOptions::default(), registry);
    parser.into_configuration_model()
}

/// Build the policy layer from policy values keyed by policy name.
///
/// Unknown policy names are logged and skipped.
pub fn policy_configuration_model(
    registry: &ConfigurationRegistry,
    policies: &Map<String, Value>,
) -> ConfigurationModel {
    let mut model = ConfigurationModel::empty();
    for (policy, value) in policies {
        match registry.policy_property(policy) {
            Some(key) => {
                tracing::debug!(%policy, %key, "Applying policy");
                model.set_value(key, value.clone());
            }
            None => tracing::warn!(%policy, "Ignoring unknown policy"),
        }
    }
    model
}
