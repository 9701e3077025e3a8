//! Configuration models
//!
//! A [`ConfigurationModel`] is the parsed form of one configuration layer:
//! a value tree, the flat list of keys it was built from, and the override
//! buckets found at its top level.
//!
//! Models are treated as values. The only mutating methods are
//! [`ConfigurationModel::set_value`], [`ConfigurationModel::add_value`] and
//! [`ConfigurationModel::remove_value`], which are meant for in-memory
//! layers; everything else derives new models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use strata_registry::{is_override_key, override_identifiers_from_key};
use strata_tree::{
    ValueTree, add_to_value_tree, get_value, merge_contents, remove_from_value_tree,
    to_values_tree,
};

use crate::inspect::ModelInspection;
use crate::raw_parser;

/// Configuration that only applies for a set of identifiers, such as the
/// contents of a `[markdown]` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideBucket {
    pub identifiers: Vec<String>,
    pub keys: Vec<String>,
    pub contents: ValueTree,
}

impl OverrideBucket {
    /// Whether the bucket applies to exactly `identifiers`, in any order.
    pub fn has_identifiers(&self, identifiers: &[String]) -> bool {
        self.identifiers.len() == identifiers.len()
            && identifiers.iter().all(|id| self.identifiers.contains(id))
    }
}

/// An unfiltered source a model was built from.
#[derive(Debug, Clone)]
pub enum RawSource {
    /// A settings object as it was read
    Object(ValueTree),
    /// A model that was already unfiltered when it was merged
    Model(Arc<ConfigurationModel>),
}

/// A model returned by [`ConfigurationModel::override_model`].
///
/// Either the model itself, when the identifier has no override content,
/// or a derived model shared with the owner's cache.
#[derive(Debug, Clone)]
pub enum ModelView<'a> {
    Borrowed(&'a ConfigurationModel),
    Shared(Arc<ConfigurationModel>),
}

impl Deref for ModelView<'_> {
    type Target = ConfigurationModel;

    fn deref(&self) -> &ConfigurationModel {
        match self {
            Self::Borrowed(model) => model,
            Self::Shared(model) => model,
        }
    }
}

impl ModelView<'_> {
    /// Take an owned handle on the viewed model.
    pub fn into_shared(self) -> Arc<ConfigurationModel> {
        match self {
            Self::Borrowed(model) => Arc::new(model.clone()),
            Self::Shared(model) => model,
        }
    }
}

/// One configuration layer.
pub struct ConfigurationModel {
    contents: ValueTree,
    keys: Vec<String>,
    overrides: Vec<OverrideBucket>,
    raw: Option<Vec<RawSource>>,

    /// `None` entries mean the identifier has no override content
    override_cache: Mutex<HashMap<String, Option<Arc<ConfigurationModel>>>>,
    raw_configuration: OnceLock<Arc<ConfigurationModel>>,
}

impl ConfigurationModel {
    pub fn new(
        contents: ValueTree,
        keys: Vec<String>,
        overrides: Vec<OverrideBucket>,
        raw: Option<Vec<RawSource>>,
    ) -> Self {
        Self {
            contents,
            keys,
            overrides,
            raw,
            override_cache: Mutex::new(HashMap::new()),
            raw_configuration: OnceLock::new(),
        }
    }

    /// A model with no contents, keys or overrides.
    pub fn empty() -> Self {
        Self::new(ValueTree::new(), Vec::new(), Vec::new(), None)
    }

    pub fn contents(&self) -> &ValueTree {
        &self.contents
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn overrides(&self) -> &[OverrideBucket] {
        &self.overrides
    }

    /// The unfiltered sources, when filtering dropped something.
    pub fn raw(&self) -> Option<&[RawSource]> {
        self.raw.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.contents.is_empty() && self.overrides.is_empty()
    }

    /// Get the value of a dotted section, or the whole tree for `None`.
    pub fn get_value(&self, section: Option<&str>) -> Option<Value> {
        match section {
            Some(section) if !section.is_empty() => get_value(&self.contents, section).cloned(),
            _ => Some(Value::Object(self.contents.clone())),
        }
    }

    /// Get the value of a section as set for one override identifier.
    ///
    /// Every bucket that lists `identifier` contributes, in order, and the
    /// bucket for `identifier` alone is merged last.
    pub fn get_override_value(&self, section: Option<&str>, identifier: &str) -> Option<Value> {
        let contents = self.contents_for_override_identifier(identifier)?;
        match section {
            Some(section) if !section.is_empty() => get_value(&contents, section).cloned(),
            _ => Some(Value::Object(contents)),
        }
    }

    pub fn get_keys_for_override_identifier(&self, identifier: &str) -> Vec<String> {
        let mut keys = Vec::new();
        for bucket in &self.overrides {
            if bucket.identifiers.iter().any(|id| id == identifier) {
                extend_distinct(&mut keys, &bucket.keys);
            }
        }
        keys
    }

    pub fn get_all_override_identifiers(&self) -> Vec<String> {
        let mut identifiers = Vec::new();
        for bucket in &self.overrides {
            extend_distinct(&mut identifiers, &bucket.identifiers);
        }
        identifiers
    }

    /// The model as seen for one override identifier.
    ///
    /// Derived models are cached per identifier on this model.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_model::ConfigurationModelParser;
    /// use strata_registry::ConfigurationRegistry;
    /// use serde_json::json;
    ///
    /// let registry = ConfigurationRegistry::new();
    /// let mut parser = ConfigurationModelParser::new("example");
    /// parser.parse(
    ///     r#"{"editor.wordWrap": "off", "[markdown]": {"editor.wordWrap": "on"}}"#,
    ///     &Default::default(),
    ///     &registry,
    /// );
    /// let model = parser.configuration_model();
    ///
    /// let markdown = model.override_model("markdown");
    /// assert_eq!(markdown.get_value(Some("editor.wordWrap")), Some(json!("on")));
    /// assert_eq!(model.get_value(Some("editor.wordWrap")), Some(json!("off")));
    /// ```
    pub fn override_model(&self, identifier: &str) -> ModelView<'_> {
        let mut cache = self
            .override_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let derived = cache
            .entry(identifier.to_string())
            .or_insert_with(|| self.create_override_model(identifier).map(Arc::new));
        match derived {
            Some(model) => ModelView::Shared(Arc::clone(model)),
            None => ModelView::Borrowed(self),
        }
    }

    fn create_override_model(&self, identifier: &str) -> Option<ConfigurationModel> {
        let override_contents = self.contents_for_override_identifier(identifier)?;
        if override_contents.is_empty() {
            return None;
        }

        let mut top_level: Vec<String> = self.contents.keys().cloned().collect();
        extend_distinct(&mut top_level, override_contents.keys());

        let mut contents = ValueTree::new();
        for key in top_level {
            let value = match (self.contents.get(&key), override_contents.get(&key)) {
                (Some(Value::Object(base)), Some(Value::Object(overridden))) => {
                    let mut merged = base.clone();
                    merge_contents(&mut merged, overridden);
                    Value::Object(merged)
                }
                (_, Some(overridden)) => overridden.clone(),
                (Some(base), None) => base.clone(),
                (None, None) => continue,
            };
            contents.insert(key, value);
        }

        Some(ConfigurationModel::new(
            contents,
            self.keys.clone(),
            self.overrides.clone(),
            None,
        ))
    }

    fn contents_for_override_identifier(&self, identifier: &str) -> Option<ValueTree> {
        let mut identifier_only: Option<&ValueTree> = None;
        let mut contents: Option<ValueTree> = None;

        for bucket in &self.overrides {
            if bucket.identifiers.len() == 1 && bucket.identifiers[0] == identifier {
                identifier_only = Some(&bucket.contents);
            } else if bucket.identifiers.iter().any(|id| id == identifier) {
                merge_into(&mut contents, &bucket.contents);
            }
        }
        if let Some(identifier_only) = identifier_only {
            merge_into(&mut contents, identifier_only);
        }
        contents
    }

    /// The model without any filtering applied.
    ///
    /// This is the model itself unless filtering dropped properties, in
    /// which case it is rebuilt once from the retained raw sources.
    pub fn raw_configuration(&self) -> &ConfigurationModel {
        let Some(raw) = &self.raw else {
            return self;
        };
        self.raw_configuration.get_or_init(|| {
            let mut models: Vec<Arc<ConfigurationModel>> = raw
                .iter()
                .map(|source| match source {
                    RawSource::Object(object) => Arc::new(unfiltered_model(object)),
                    RawSource::Model(model) => Arc::clone(model),
                })
                .collect();
            if models.len() == 1 {
                return models.remove(0);
            }
            let Some((first, rest)) = models.split_first() else {
                return Arc::new(ConfigurationModel::empty());
            };
            let rest: Vec<&ConfigurationModel> = rest.iter().map(Arc::as_ref).collect();
            Arc::new(first.merge(&rest))
        })
    }

    /// Inspect a section across the unfiltered model.
    pub fn inspect(&self, section: &str, identifier: Option<&str>) -> ModelInspection<'_> {
        ModelInspection::new(self.raw_configuration(), section, identifier)
    }

    /// Merge `others` on top of this model into a new model.
    ///
    /// The right-most model wins for conflicting leaves. Empty models are
    /// skipped for contents but their raw sources are still carried over.
    pub fn merge(&self, others: &[&ConfigurationModel]) -> ConfigurationModel {
        let mut contents = self.contents.clone();
        let mut overrides = self.overrides.clone();
        let mut keys = self.keys.clone();

        let keep_raw = self.raw.is_some() || others.iter().any(|other| other.raw.is_some());
        let mut raws = Vec::new();
        if keep_raw {
            raws.extend(self.raw_sources());
        }

        for other in others {
            if keep_raw {
                raws.extend(other.raw_sources());
            }
            if other.is_empty() {
                continue;
            }

            merge_contents(&mut contents, &other.contents);
            for other_bucket in &other.overrides {
                match overrides
                    .iter_mut()
                    .find(|bucket| bucket.has_identifiers(&other_bucket.identifiers))
                {
                    Some(bucket) => {
                        merge_contents(&mut bucket.contents, &other_bucket.contents);
                        extend_distinct(&mut bucket.keys, &other_bucket.keys);
                    }
                    None => overrides.push(other_bucket.clone()),
                }
            }
            extend_distinct(&mut keys, &other.keys);
        }

        ConfigurationModel::new(contents, keys, overrides, keep_raw.then_some(raws))
    }

    /// Drop the raw sources, keeping contents, keys and overrides.
    pub fn without_raw(self) -> ConfigurationModel {
        ConfigurationModel::new(self.contents, self.keys, self.overrides, None)
    }

    fn raw_sources(&self) -> Vec<RawSource> {
        match &self.raw {
            Some(raw) => raw.clone(),
            None => vec![RawSource::Model(Arc::new(self.clone()))],
        }
    }

    /// Set a value, overwriting any existing one.
    ///
    /// Writing an override key rebuilds that override bucket.
    pub fn set_value(&mut self, key: &str, value: Value) {
        self.update_value(key, value);
    }

    /// Add a value for a key the model does not have yet.
    pub fn add_value(&mut self, key: &str, value: Value) {
        self.update_value(key, value);
    }

    /// Remove a key. Removing an override key drops its bucket.
    pub fn remove_value(&mut self, key: &str) {
        let Some(index) = self.keys.iter().position(|k| k == key) else {
            return;
        };
        self.keys.remove(index);
        remove_from_value_tree(&mut self.contents, key);
        if is_override_key(key) {
            let identifiers = override_identifiers_from_key(key);
            self.overrides.retain(|bucket| !bucket.has_identifiers(&identifiers));
        }
        self.clear_caches();
    }

    fn update_value(&mut self, key: &str, value: Value) {
        add_to_value_tree(&mut self.contents, key, value, |conflict| {
            tracing::error!("{}", conflict)
        });
        if !self.keys.iter().any(|k| k == key) {
            self.keys.push(key.to_string());
        }

        if is_override_key(key) {
            let override_raw = self
                .contents
                .get(key)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let identifiers = override_identifiers_from_key(key);
            let bucket = OverrideBucket {
                keys: override_raw.keys().cloned().collect(),
                contents: to_values_tree(&override_raw, |conflict| tracing::error!("{}", conflict)),
                identifiers,
            };
            match self
                .overrides
                .iter_mut()
                .find(|existing| existing.has_identifiers(&bucket.identifiers))
            {
                Some(existing) => *existing = bucket,
                None => self.overrides.push(bucket),
            }
        }
        self.clear_caches();
    }

    fn clear_caches(&mut self) {
        self.override_cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.raw_configuration = OnceLock::new();
    }
}

fn unfiltered_model(raw: &ValueTree) -> ConfigurationModel {
    let result = raw_parser::build(raw, |conflict| tracing::error!("{}", conflict));
    ConfigurationModel::new(result.contents, result.keys, result.overrides, None)
}

fn merge_into(target: &mut Option<ValueTree>, source: &ValueTree) {
    match target {
        Some(target) => merge_contents(target, source),
        None => *target = Some(source.clone()),
    }
}

fn extend_distinct<'a>(target: &mut Vec<String>, items: impl IntoIterator<Item = &'a String>) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

impl Clone for ConfigurationModel {
    /// Clones the data only; caches start empty.
    fn clone(&self) -> Self {
        Self::new(
            self.contents.clone(),
            self.keys.clone(),
            self.overrides.clone(),
            self.raw.clone(),
        )
    }
}

impl Default for ConfigurationModel {
    fn default() -> Self {
        Self::empty()
    }
}

/// Models compare by contents, keys and overrides.
impl PartialEq for ConfigurationModel {
    fn eq(&self, other: &Self) -> bool {
        self.contents == other.contents && self.keys == other.keys && self.overrides == other.overrides
    }
}

impl fmt::Debug for ConfigurationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationModel")
            .field("contents", &self.contents)
            .field("keys", &self.keys)
            .field("overrides", &self.overrides)
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tree(value: Value) -> ValueTree {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn model(value: Value) -> ConfigurationModel {
        unfiltered_model(&tree(value))
    }

    #[test]
    fn test_empty_model() {
        let empty = ConfigurationModel::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.get_value(None), Some(json!({})));
        assert_eq!(empty.get_value(Some("a")), None);
    }

    #[test]
    fn test_override_keys_are_keys_and_contents() {
        let m = model(json!({"a": 1, "[go]": {"a": 2}}));
        assert_eq!(m.keys(), ["a", "[go]"]);
        assert_eq!(m.get_value(Some("[go]")), Some(json!({"a": 2})));
        assert_eq!(m.overrides().len(), 1);
    }

    #[test]
    fn test_singleton_bucket_wins() {
        let m = model(json!({
            "[go]": {"a": "go"},
            "[go][rust]": {"a": "both", "b": "both"}
        }));
        assert_eq!(m.get_override_value(Some("a"), "go"), Some(json!("go")));
        assert_eq!(m.get_override_value(Some("b"), "go"), Some(json!("both")));
        assert_eq!(m.get_override_value(Some("a"), "rust"), Some(json!("both")));
        assert_eq!(m.get_override_value(Some("a"), "python"), None);
    }

    #[test]
    fn test_override_model_merges_objects() {
        let m = model(json!({
            "editor": {"wordWrap": "off", "tabSize": 4},
            "[md]": {"editor.wordWrap": "on"}
        }));
        let md = m.override_model("md");
        assert_eq!(
            md.get_value(Some("editor")),
            Some(json!({"wordWrap": "on", "tabSize": 4}))
        );
        assert_eq!(md.keys(), m.keys());
    }

    #[test]
    fn test_override_model_without_content_is_self() {
        let m = model(json!({"a": 1, "[go]": {}}));
        assert!(matches!(m.override_model("go"), ModelView::Borrowed(_)));
        assert!(matches!(m.override_model("rust"), ModelView::Borrowed(_)));
    }

    #[test]
    fn test_override_model_is_cached() {
        let m = model(json!({"a": 1, "[go]": {"a": 2}}));
        let first = m.override_model("go").into_shared();
        let second = m.override_model("go").into_shared();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_set_value_clears_override_cache() {
        let mut m = model(json!({"a": 1, "[go]": {"a": 2}}));
        assert_eq!(m.override_model("go").get_value(Some("a")), Some(json!(2)));

        m.set_value("[go]", json!({"a": 3}));
        assert_eq!(m.override_model("go").get_value(Some("a")), Some(json!(3)));
        assert_eq!(m.overrides().len(), 1);
    }

    #[test]
    fn test_remove_override_key_drops_bucket() {
        let mut m = model(json!({"a": 1, "[go]": {"a": 2}}));
        m.remove_value("[go]");
        assert!(m.overrides().is_empty());
        assert_eq!(m.keys(), ["a"]);
        assert_eq!(m.get_override_value(Some("a"), "go"), None);
    }

    #[test]
    fn test_set_then_remove() {
        let mut m = ConfigurationModel::empty();
        m.set_value("a.b", json!(1));
        m.remove_value("a.b");
        assert_eq!(m.get_value(Some("a.b")), None);
        assert!(!m.keys().contains(&"a.b".to_string()));
        assert!(m.is_empty());
    }

    #[test]
    fn test_remove_unknown_key_is_noop() {
        let mut m = model(json!({"a": 1}));
        m.remove_value("b");
        assert_eq!(m.keys(), ["a"]);
    }

    #[test]
    fn test_merge_buckets_by_identifiers() {
        let a = model(json!({"[go]": {"x": 1}, "[rust]": {"y": 1}}));
        let b = model(json!({"[go]": {"z": 2}}));
        let merged = a.merge(&[&b]);

        assert_eq!(merged.overrides().len(), 2);
        assert_eq!(merged.overrides()[0].keys, vec!["x", "z"]);
        assert_eq!(
            merged.get_override_value(None, "go"),
            Some(json!({"x": 1, "z": 2}))
        );
    }

    #[test]
    fn test_merge_buckets_ignores_identifier_order() {
        let a = model(json!({"[go][rust]": {"x": 1}}));
        let b = model(json!({"[rust][go]": {"x": 2}}));
        let merged = a.merge(&[&b]);

        assert_eq!(merged.overrides().len(), 1);
        assert_eq!(merged.get_override_value(Some("x"), "go"), Some(json!(2)));
        assert_eq!(merged.inspect("x", Some("rust")).overrides().map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_reordered_override_keys_share_a_bucket() {
        let m = model(json!({"[go][rust]": {"x": 1}, "[rust][go]": {"y": 2}}));
        assert_eq!(m.overrides().len(), 1);
        assert_eq!(m.overrides()[0].keys, vec!["x", "y"]);

        let mut m = model(json!({"[go][rust]": {"x": 1}}));
        m.set_value("[rust][go]", json!({"x": 3}));
        assert_eq!(m.overrides().len(), 1);
        assert_eq!(m.get_override_value(Some("x"), "go"), Some(json!(3)));
    }

    #[test]
    fn test_merge_does_not_touch_inputs() {
        let a = model(json!({"a": {"b": 1}}));
        let b = model(json!({"a": {"c": 2}}));
        let merged = a.merge(&[&b]);
        assert_eq!(merged.get_value(Some("a")), Some(json!({"b": 1, "c": 2})));
        assert_eq!(a.get_value(Some("a")), Some(json!({"b": 1})));
    }

    #[test]
    fn test_merge_keeps_raw_of_filtered_models() {
        let filtered = ConfigurationModel::new(
            tree(json!({"a": 1})),
            vec!["a".into()],
            Vec::new(),
            Some(vec![RawSource::Object(tree(json!({"a": 1, "b": 2})))]),
        );
        let plain = model(json!({"c": 3}));

        let merged = plain.merge(&[&filtered]);
        assert_eq!(merged.get_value(Some("b")), None);
        let raw = merged.raw_configuration();
        assert_eq!(raw.get_value(Some("b")), Some(json!(2)));
        assert_eq!(raw.get_value(Some("c")), Some(json!(3)));
    }

    #[test]
    fn test_raw_configuration_without_raw_is_self() {
        let m = model(json!({"a": 1}));
        assert!(std::ptr::eq(m.raw_configuration(), &m));
    }
}
