//! Dotted-key value trees
//!
//! A value tree is a JSON object whose nested objects are addressed with
//! dot-separated keys. The key `editor.font.size` names the `size` entry of
//! the `font` object inside the `editor` object.
//!
//! # Examples
//!
//! ```
//! use strata_tree::value_tree::{add_to_value_tree, get_value, ValueTree};
//! use serde_json::json;
//!
//! let mut tree = ValueTree::new();
//! add_to_value_tree(&mut tree, "editor.font.size", json!(12), |_| {});
//!
//! assert_eq!(get_value(&tree, "editor.font.size"), Some(&json!(12)));
//! assert_eq!(get_value(&tree, "editor.font.family"), None);
//! ```

use serde_json::{Map, Value};
use std::fmt;

/// A recursive map of configuration values.
pub type ValueTree = Map<String, Value>;

/// A write that had to replace a value of an incompatible shape.
///
/// Conflicts are never fatal: the write always goes through and the
/// conflict is only reported so callers can log it.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeConflict {
    /// The full dotted key that was being written
    pub key: String,
    /// The dotted path of the node that had to be replaced
    pub path: String,
    /// The value that was replaced
    pub existing: Value,
}

impl fmt::Display for TreeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Overwriting {} as {} is {}",
            self.key, self.path, self.existing
        )
    }
}

/// Get the value at a dotted key.
///
/// Returns `None` if any segment is missing, or if an intermediate
/// segment is not an object.
pub fn get_value<'a>(tree: &'a ValueTree, section: &str) -> Option<&'a Value> {
    let mut segments = section.split('.');
    let first = segments.next()?;
    let mut current = tree.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at a dotted key, creating intermediate objects as needed.
///
/// If an intermediate node exists but is not an object, `on_conflict` is
/// invoked and the node is replaced by an empty object before writing.
/// Replacing an object leaf with a non-object value is reported the same way.
pub fn add_to_value_tree(
    tree: &mut ValueTree,
    key: &str,
    value: Value,
    mut on_conflict: impl FnMut(TreeConflict),
) {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };

    let mut current = tree;
    if let Some(parents) = parents {
        let mut end = 0;
        for (index, segment) in parents.split('.').enumerate() {
            end = if index == 0 {
                segment.len()
            } else {
                end + 1 + segment.len()
            };

            let entry = current
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                on_conflict(TreeConflict {
                    key: key.to_string(),
                    path: key[..end].to_string(),
                    existing: entry.clone(),
                });
                *entry = Value::Object(Map::new());
            }

            current = match entry {
                Value::Object(map) => map,
                _ => return,
            };
        }
    }

    if let Some(existing) = current.get(leaf) {
        if existing.is_object() && !value.is_object() {
            on_conflict(TreeConflict {
                key: key.to_string(),
                path: key.to_string(),
                existing: existing.clone(),
            });
        }
    }
    current.insert(leaf.to_string(), value);
}

/// Remove the value at a dotted key.
///
/// Intermediate objects left empty by the removal are pruned.
/// Returns the removed value, if any.
pub fn remove_from_value_tree(tree: &mut ValueTree, key: &str) -> Option<Value> {
    let segments: Vec<&str> = key.split('.').collect();
    remove_segments(tree, &segments)
}

fn remove_segments(tree: &mut ValueTree, segments: &[&str]) -> Option<Value> {
    let (first, rest) = segments.split_first()?;
    if rest.is_empty() {
        return tree.shift_remove(*first);
    }

    let child = tree.get_mut(*first)?.as_object_mut()?;
    let removed = remove_segments(child, rest);
    if child.is_empty() {
        tree.shift_remove(*first);
    }
    removed
}

/// Build a value tree from a flat `{dottedKey: value}` map.
///
/// Keys are inserted in map iteration order, so a later key wins over an
/// earlier one when their shapes clash.
pub fn to_values_tree(properties: &ValueTree, mut on_conflict: impl FnMut(TreeConflict)) -> ValueTree {
    let mut root = ValueTree::new();
    for (key, value) in properties {
        add_to_value_tree(&mut root, key, value.clone(), &mut on_conflict);
    }
    root
}

/// Deep merge `source` into `target`.
///
/// When both sides hold an object for a key the merge recurses, otherwise
/// the value from `source` is cloned over the one in `target`.
pub fn merge_contents(target: &mut ValueTree, source: &ValueTree) {
    for (key, value) in source {
        if let (Some(Value::Object(target_child)), Value::Object(source_child)) =
            (target.get_mut(key), value)
        {
            merge_contents(target_child, source_child);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Flatten a value tree back into dotted leaf keys, in tree order.
///
/// Empty objects are kept as leaves so that no information is lost.
pub fn leaf_keys(tree: &ValueTree) -> Vec<String> {
    fn walk(prefix: &str, tree: &ValueTree, keys: &mut Vec<String>) {
        for (key, value) in tree {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match value {
                Value::Object(child) if !child.is_empty() => walk(&path, child, keys),
                _ => keys.push(path),
            }
        }
    }

    let mut keys = Vec::new();
    walk("", tree, &mut keys);
    keys
}
