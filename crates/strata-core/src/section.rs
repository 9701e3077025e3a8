//! Read-only views of a resolved section

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use strata_tree::{add_to_value_tree, get_value};

use crate::configuration::{Configuration, ConfigurationOverrides};
use crate::workspace::Workspace;

/// An immutable snapshot of a resolved section.
///
/// Lookups use paths relative to the section. The view never writes back;
/// use [`SectionView::key_for`] to build the key for
/// [`Configuration::update_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    section: Option<String>,
    value: Value,
}

impl SectionView {
    /// A missing section is viewed as an empty object.
    pub fn new(section: Option<&str>, value: Option<Value>) -> Self {
        Self {
            section: section.filter(|s| !s.is_empty()).map(str::to_string),
            value: value.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// Look up a dotted path inside the section; `""` is the section itself.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.value);
        }
        match &self.value {
            Value::Object(tree) => get_value(tree, path),
            _ => None,
        }
    }

    /// Look up a path and deserialize it, `None` if absent or mistyped.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let value = self.get(path)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// A deep copy of the section's value.
    pub fn to_snapshot(&self) -> Value {
        self.value.clone()
    }

    /// A copy of this view with `path` set to `value`.
    pub fn with_value(&self, path: &str, value: Value) -> SectionView {
        let mut view = self.clone();
        if path.is_empty() {
            view.value = value;
            return view;
        }
        if !view.value.is_object() {
            view.value = Value::Object(Map::new());
        }
        if let Value::Object(tree) = &mut view.value {
            add_to_value_tree(tree, path, value, |conflict| {
                tracing::debug!(%conflict, "Replaced non-object value in section view");
            });
        }
        view
    }

    /// The full configuration key of a path in this section.
    pub fn key_for(&self, path: &str) -> String {
        match (&self.section, path.is_empty()) {
            (Some(section), true) => section.clone(),
            (Some(section), false) => format!("{}.{}", section, path),
            (None, _) => path.to_string(),
        }
    }
}

impl Configuration {
    /// A view of `section`, or of the whole configuration for `None`.
    pub fn get_section(
        &self,
        section: Option<&str>,
        overrides: &ConfigurationOverrides,
        workspace: Option<&Workspace>,
    ) -> SectionView {
        SectionView::new(section, self.get_value(section, overrides, workspace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view() -> SectionView {
        SectionView::new(
            Some("editor"),
            Some(json!({"fontSize": 12, "minimap": {"enabled": true}})),
        )
    }

    #[test]
    fn test_get_and_has() {
        let view = view();
        assert_eq!(view.get("fontSize"), Some(&json!(12)));
        assert_eq!(view.get("minimap.enabled"), Some(&json!(true)));
        assert!(view.has("minimap"));
        assert!(!view.has("missing"));
        assert_eq!(view.get_as::<u32>("fontSize"), Some(12));
        assert_eq!(view.get_as::<String>("fontSize"), None);
    }

    #[test]
    fn test_with_value_leaves_original_untouched() {
        let view = view();
        let changed = view.with_value("minimap.enabled", json!(false));

        assert_eq!(view.get("minimap.enabled"), Some(&json!(true)));
        assert_eq!(changed.get("minimap.enabled"), Some(&json!(false)));
        assert_eq!(changed.key_for("minimap.enabled"), "editor.minimap.enabled");
    }

    #[test]
    fn test_missing_section_is_empty_object() {
        let view = SectionView::new(Some("nothing"), None);
        assert_eq!(view.to_snapshot(), json!({}));
        assert!(!view.has("a"));
        assert_eq!(view.key_for(""), "nothing");
    }
}
