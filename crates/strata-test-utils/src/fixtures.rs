//! Model and registry fixtures.

use serde_json::{Value, json};
use strata_model::{ConfigurationModel, ConfigurationModelParser, ParseOptions};
use strata_registry::{ConfigurationRegistry, ConfigurationScope, PropertySchema};

/// Build an unfiltered model from a JSON object literal.
///
/// # Panics
/// Panics if `value` is not an object.
pub fn model(value: Value) -> ConfigurationModel {
    let Value::Object(raw) = value else {
        panic!("model: expected a JSON object, got {value}");
    };
    let mut parser = ConfigurationModelParser::new("fixture");
    parser.parse_raw(raw, &ParseOptions::default(), &ConfigurationRegistry::new());
    parser.into_configuration_model()
}

/// Parse settings text with the given options and registry.
pub fn parse_model(
    text: &str,
    options: &ParseOptions,
    registry: &ConfigurationRegistry,
) -> ConfigurationModel {
    let mut parser = ConfigurationModelParser::new("fixture");
    parser.parse(text, options, registry);
    parser.into_configuration_model()
}

/// A registry with a handful of editor-like properties:
///
/// | key | scope | extra |
/// |---|---|---|
/// | `editor.tabSize` | window | default `4` |
/// | `editor.wordWrap` | language overridable | default `"off"`, policy `WordWrap` |
/// | `files.exclude` | resource | default `{}` |
/// | `update.mode` | application | default `"default"` |
/// | `terminal.shell` | machine | restricted |
///
/// plus a `[markdown]` default override turning word wrap on.
///
/// # Panics
/// Panics if a registration fails, which means the fixture itself is broken.
pub fn editor_registry() -> ConfigurationRegistry {
    let mut registry = ConfigurationRegistry::new();
    let properties = [
        ("editor.tabSize", PropertySchema::new().with_default(json!(4))),
        (
            "editor.wordWrap",
            PropertySchema::new()
                .with_scope(ConfigurationScope::LanguageOverridable)
                .with_default(json!("off"))
                .with_policy("WordWrap"),
        ),
        (
            "files.exclude",
            PropertySchema::new()
                .with_scope(ConfigurationScope::Resource)
                .with_default(json!({})),
        ),
        (
            "update.mode",
            PropertySchema::new()
                .with_scope(ConfigurationScope::Application)
                .with_default(json!("default")),
        ),
        (
            "terminal.shell",
            PropertySchema::new()
                .with_scope(ConfigurationScope::Machine)
                .restricted(),
        ),
    ];
    for (key, schema) in properties {
        registry
            .register_property(key, schema)
            .unwrap_or_else(|e| panic!("editor_registry: failed to register {key}: {e}"));
    }

    let overrides = json!({"[markdown]": {"editor.wordWrap": "on"}});
    if let Value::Object(overrides) = overrides {
        registry
            .register_default_overrides(&overrides)
            .unwrap_or_else(|e| panic!("editor_registry: failed to register overrides: {e}"));
    }
    registry
}
