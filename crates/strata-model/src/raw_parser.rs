//! Filtering a raw settings object into model parts
//!
//! The raw parser decides which top-level properties of a parsed settings
//! object survive, using the property registry and the [`ParseOptions`] of
//! the layer, then builds the value tree and override buckets from what is
//! left.

use serde_json::Value;
use std::borrow::Cow;

use strata_registry::{ConfigurationRegistry, PropertySchema, is_override_key, override_identifiers_from_key};
use strata_tree::{TreeConflict, ValueTree, merge_contents, to_values_tree};

use crate::model::OverrideBucket;
use crate::parse_options::ParseOptions;

/// Everything a parser needs to build a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParseResult {
    /// Top-level keys that survived filtering, override keys included
    pub keys: Vec<String>,
    pub contents: ValueTree,
    pub overrides: Vec<OverrideBucket>,
    /// Restricted properties met while filtering
    pub restricted: Vec<String>,
    /// Set when filtering dropped at least one key
    pub has_excluded_properties: bool,
}

struct Filtered<'a> {
    raw: Cow<'a, ValueTree>,
    restricted: Vec<String>,
    has_excluded_properties: bool,
}

/// Applies [`ParseOptions`] to raw settings objects.
pub struct RawParser<'a> {
    registry: &'a ConfigurationRegistry,
    options: &'a ParseOptions,
}

impl<'a> RawParser<'a> {
    pub fn new(registry: &'a ConfigurationRegistry, options: &'a ParseOptions) -> Self {
        Self { registry, options }
    }

    /// Filter `raw` and build the model parts from what is kept.
    pub fn parse(&self, raw: &ValueTree, on_conflict: impl FnMut(TreeConflict)) -> RawParseResult {
        let filtered = self.filter(raw, true);
        let mut result = build(&filtered.raw, on_conflict);
        result.restricted = filtered.restricted;
        result.has_excluded_properties = filtered.has_excluded_properties;
        result
    }

    fn filter<'p>(&self, properties: &'p ValueTree, filter_overridden: bool) -> Filtered<'p> {
        if !self.options.requires_filtering() {
            return Filtered {
                raw: Cow::Borrowed(properties),
                restricted: Vec::new(),
                has_excluded_properties: false,
            };
        }

        let empty = ValueTree::new();
        let mut raw = ValueTree::new();
        let mut restricted = Vec::new();
        let mut has_excluded_properties = false;

        for (key, value) in properties {
            if filter_overridden && is_override_key(key) {
                let children = value.as_object().unwrap_or(&empty);
                let nested = self.filter(children, false);
                raw.insert(key.clone(), Value::Object(nested.raw.into_owned()));
                restricted.extend(nested.restricted);
                has_excluded_properties |= nested.has_excluded_properties;
                continue;
            }

            let schema = self.registry.property(key);
            if schema.is_some_and(|schema| schema.restricted) {
                restricted.push(key.clone());
            }
            if self.should_include(key, schema) {
                raw.insert(key.clone(), value.clone());
            } else {
                tracing::trace!(%key, "Filtered out property");
                has_excluded_properties = true;
            }
        }

        Filtered {
            raw: Cow::Owned(raw),
            restricted,
            has_excluded_properties,
        }
    }

    fn should_include(&self, key: &str, schema: Option<&PropertySchema>) -> bool {
        let options = self.options;
        if options.exclude.iter().any(|excluded| excluded == key) {
            return false;
        }
        if options.include.iter().any(|included| included == key) {
            return true;
        }
        if options.skip_restricted && schema.is_some_and(|schema| schema.restricted) {
            return false;
        }
        if options.skip_unregistered && schema.is_none() {
            return false;
        }

        let schema = schema.or_else(|| self.registry.excluded_property(key));
        match (schema, &options.scopes) {
            (Some(schema), Some(scopes)) => scopes.contains(&schema.effective_scope()),
            _ => true,
        }
    }
}

/// Build model parts from `raw` without filtering anything.
pub fn build(raw: &ValueTree, mut on_conflict: impl FnMut(TreeConflict)) -> RawParseResult {
    let contents = to_values_tree(raw, &mut on_conflict);
    let keys = raw.keys().cloned().collect();
    let overrides = to_overrides(raw, &mut on_conflict);
    RawParseResult {
        keys,
        contents,
        overrides,
        restricted: Vec::new(),
        has_excluded_properties: false,
    }
}

fn to_overrides(raw: &ValueTree, mut on_conflict: impl FnMut(TreeConflict)) -> Vec<OverrideBucket> {
    let mut overrides: Vec<OverrideBucket> = Vec::new();
    for (key, value) in raw {
        if !is_override_key(key) {
            continue;
        }
        let override_raw = value.as_object().cloned().unwrap_or_default();
        let identifiers = override_identifiers_from_key(key);
        let contents = to_values_tree(&override_raw, &mut on_conflict);
        match overrides
            .iter_mut()
            .find(|bucket| bucket.has_identifiers(&identifiers))
        {
            Some(bucket) => {
                merge_contents(&mut bucket.contents, &contents);
                for key in override_raw.keys() {
                    if !bucket.keys.contains(key) {
                        bucket.keys.push(key.clone());
                    }
                }
            }
            None => overrides.push(OverrideBucket {
                identifiers,
                keys: override_raw.keys().cloned().collect(),
                contents,
            }),
        }
    }
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_registry::ConfigurationScope;

    fn object(value: Value) -> ValueTree {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn registry() -> ConfigurationRegistry {
        let mut registry = ConfigurationRegistry::new();
        registry
            .register_property("a", PropertySchema::new().with_scope(ConfigurationScope::Resource))
            .unwrap();
        registry
            .register_property("b", PropertySchema::new().restricted())
            .unwrap();
        registry
            .register_property(
                "c",
                PropertySchema::new()
                    .with_scope(ConfigurationScope::Machine)
                    .excluded(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_no_options_keeps_everything() {
        let registry = registry();
        let options = ParseOptions::new();
        let raw = object(json!({"a": 1, "b": 2, "unknown": 3}));

        let result = RawParser::new(&registry, &options).parse(&raw, |_| {});

        assert_eq!(result.keys, vec!["a", "b", "unknown"]);
        assert!(result.restricted.is_empty());
        assert!(!result.has_excluded_properties);
    }

    #[test]
    fn test_include_alone_does_not_filter() {
        let registry = registry();
        let options = ParseOptions::new().with_include(["a"]);
        let raw = object(json!({"a": 1, "b": 2}));

        let result = RawParser::new(&registry, &options).parse(&raw, |_| {});

        assert_eq!(result.keys, vec!["a", "b"]);
        assert!(result.restricted.is_empty());
    }

    #[test]
    fn test_excluded_property_scope_is_used() {
        let registry = registry();
        let options = ParseOptions::new().with_scopes(&[ConfigurationScope::Machine]);
        let raw = object(json!({"a": 1, "c": 2}));

        let result = RawParser::new(&registry, &options).parse(&raw, |_| {});

        assert_eq!(result.keys, vec!["c"]);
        assert!(result.has_excluded_properties);
    }

    #[test]
    fn test_override_children_are_filtered() {
        let registry = registry();
        let options = ParseOptions::new().skip_restricted(true);
        let raw = object(json!({"[go]": {"a": 1, "b": 2}}));

        let result = RawParser::new(&registry, &options).parse(&raw, |_| {});

        assert_eq!(result.keys, vec!["[go]"]);
        assert_eq!(result.overrides.len(), 1);
        assert_eq!(result.overrides[0].keys, vec!["a"]);
        assert_eq!(result.restricted, vec!["b"]);
        assert!(result.has_excluded_properties);
    }

    #[test]
    fn test_non_object_override_is_empty_bucket() {
        let result = build(&object(json!({"[go]": 1})), |_| {});
        assert_eq!(result.overrides[0].identifiers, vec!["go"]);
        assert!(result.overrides[0].keys.is_empty());
    }

    #[test]
    fn test_build_reports_conflicts() {
        let mut conflicts = Vec::new();
        let result = build(&object(json!({"a": 1, "a.b": 2})), |c| conflicts.push(c));
        assert_eq!(Value::Object(result.contents), json!({"a": {"b": 2}}));
        assert_eq!(conflicts.len(), 1);
    }
}
