//! Diffing configuration models
//!
//! Diffs are computed over the unfiltered form of each model so that a
//! change to a property hidden by filtering is still reported.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use strata_tree::{ValueTree, get_value};

use crate::model::ConfigurationModel;

/// Keys that changed between two models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigurationCompareResult {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    /// Changed keys per override identifier
    pub overrides: Vec<(String, Vec<String>)>,
}

impl ConfigurationCompareResult {
    /// Added, updated and removed keys, in that order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.added.clone();
        keys.extend(self.updated.iter().cloned());
        keys.extend(self.removed.iter().cloned());
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && self.overrides.is_empty()
    }

    /// Collapse into the change descriptor handed to listeners.
    pub fn into_change(self) -> ConfigurationChange {
        ConfigurationChange {
            keys: self.keys(),
            overrides: self.overrides,
        }
    }
}

/// The keys affected by one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationChange {
    pub keys: Vec<String>,
    pub overrides: Vec<(String, Vec<String>)>,
}

impl ConfigurationChange {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.overrides.is_empty()
    }
}

/// Compare two models, either of which may be absent.
///
/// # Examples
///
/// ```
/// use strata_model::{compare, ConfigurationModel};
/// use serde_json::json;
///
/// let mut from = ConfigurationModel::empty();
/// from.set_value("a", json!(1));
/// from.set_value("b", json!(1));
/// let mut to = ConfigurationModel::empty();
/// to.set_value("b", json!(2));
/// to.set_value("c", json!(3));
///
/// let result = compare(Some(&from), Some(&to));
/// assert_eq!(result.added, vec!["c"]);
/// assert_eq!(result.removed, vec!["a"]);
/// assert_eq!(result.updated, vec!["b"]);
/// ```
pub fn compare(
    from: Option<&ConfigurationModel>,
    to: Option<&ConfigurationModel>,
) -> ConfigurationCompareResult {
    let from_raw = from.map(|model| model.raw_configuration());
    let to_raw = to.map(|model| model.raw_configuration());
    let (added, removed, updated) = compare_contents(
        from_raw.map(|model| (model.contents(), model.keys())),
        to_raw.map(|model| (model.contents(), model.keys())),
    );

    let from_identifiers = from.map(|model| model.get_all_override_identifiers()).unwrap_or_default();
    let to_identifiers = to.map(|model| model.get_all_override_identifiers()).unwrap_or_default();

    let mut overrides = Vec::new();
    if let Some(to) = to {
        for identifier in to_identifiers.iter().filter(|id| !from_identifiers.contains(id)) {
            overrides.push((identifier.clone(), to.get_keys_for_override_identifier(identifier)));
        }
    }
    if let Some(from) = from {
        for identifier in from_identifiers.iter().filter(|id| !to_identifiers.contains(id)) {
            overrides.push((identifier.clone(), from.get_keys_for_override_identifier(identifier)));
        }
    }
    if let (Some(from), Some(to)) = (from, to) {
        for identifier in from_identifiers.iter().filter(|id| to_identifiers.contains(id)) {
            let from_contents = override_contents(from, identifier);
            let to_contents = override_contents(to, identifier);
            let from_keys = from.get_keys_for_override_identifier(identifier);
            let to_keys = to.get_keys_for_override_identifier(identifier);
            let (added, removed, updated) = compare_contents(
                Some((&from_contents, from_keys.as_slice())),
                Some((&to_contents, to_keys.as_slice())),
            );

            let mut keys = added;
            keys.extend(removed);
            keys.extend(updated);
            if !keys.is_empty() {
                overrides.push((identifier.clone(), keys));
            }
        }
    }

    ConfigurationCompareResult {
        added,
        removed,
        updated,
        overrides,
    }
}

fn override_contents(model: &ConfigurationModel, identifier: &str) -> ValueTree {
    match model.get_override_value(None, identifier) {
        Some(Value::Object(contents)) => contents,
        _ => ValueTree::new(),
    }
}

type Side<'a> = Option<(&'a ValueTree, &'a [String])>;

fn compare_contents(from: Side<'_>, to: Side<'_>) -> (Vec<String>, Vec<String>, Vec<String>) {
    let added = match (from, to) {
        (Some((_, from_keys)), Some((_, to_keys))) => {
            to_keys.iter().filter(|k| !from_keys.contains(k)).cloned().collect()
        }
        (None, Some((_, to_keys))) => to_keys.to_vec(),
        _ => Vec::new(),
    };
    let removed = match (from, to) {
        (Some((_, from_keys)), Some((_, to_keys))) => {
            from_keys.iter().filter(|k| !to_keys.contains(k)).cloned().collect()
        }
        (Some((_, from_keys)), None) => from_keys.to_vec(),
        _ => Vec::new(),
    };

    let mut updated = Vec::new();
    if let (Some((from_contents, from_keys)), Some((to_contents, to_keys))) = (from, to) {
        for key in from_keys.iter().filter(|k| to_keys.contains(k)) {
            if get_value(from_contents, key) != get_value(to_contents, key) {
                updated.push(key.clone());
            }
        }
    }
    (added, removed, updated)
}

/// Union several changes, keeping the first-seen order of keys and
/// identifiers.
pub fn merge_changes(changes: &[ConfigurationChange]) -> ConfigurationChange {
    match changes {
        [] => ConfigurationChange::default(),
        [change] => change.clone(),
        _ => {
            let mut merged = ConfigurationChange::default();
            for change in changes {
                for key in &change.keys {
                    if !merged.keys.contains(key) {
                        merged.keys.push(key.clone());
                    }
                }
                for (identifier, keys) in &change.overrides {
                    let index = match merged.overrides.iter().position(|(id, _)| id == identifier) {
                        Some(index) => index,
                        None => {
                            merged.overrides.push((identifier.clone(), Vec::new()));
                            merged.overrides.len() - 1
                        }
                    };
                    let target = &mut merged.overrides[index].1;
                    for key in keys {
                        if !target.contains(key) {
                            target.push(key.clone());
                        }
                    }
                }
            }
            merged
        }
    }
}
