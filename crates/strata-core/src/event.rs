//! Change notifications

use std::cell::OnceCell;

use strata_model::ConfigurationChange;

use crate::configuration::{Configuration, ConfigurationOverrides, Layer};
use crate::snapshot::ConfigurationData;
use crate::workspace::Workspace;

const MARKER: char = '\n';

/// The configuration as it was before a change.
#[derive(Debug, Clone)]
pub struct PreviousConfiguration {
    pub data: ConfigurationData,
    pub workspace: Option<Workspace>,
}

/// Describes a change to a [`Configuration`] and answers which sections it
/// touched.
#[derive(Debug)]
pub struct ConfigurationChangeEvent<'a> {
    change: ConfigurationChange,
    affected_keys: Vec<String>,
    /// Affected keys, each followed by a newline, after a leading newline
    affected: String,
    previous: Option<PreviousConfiguration>,
    previous_configuration: OnceCell<Option<Configuration>>,
    current: &'a Configuration,
    current_workspace: Option<&'a Workspace>,
    source: Option<Layer>,
}

impl<'a> ConfigurationChangeEvent<'a> {
    pub fn new(
        change: ConfigurationChange,
        previous: Option<PreviousConfiguration>,
        current: &'a Configuration,
        current_workspace: Option<&'a Workspace>,
    ) -> Self {
        let mut affected_keys: Vec<String> = Vec::new();
        let override_keys = change.overrides.iter().flat_map(|(_, keys)| keys);
        for key in change.keys.iter().chain(override_keys) {
            if !affected_keys.contains(key) {
                affected_keys.push(key.clone());
            }
        }

        let mut affected = String::from(MARKER);
        for key in &affected_keys {
            affected.push_str(key);
            affected.push(MARKER);
        }

        Self {
            change,
            affected_keys,
            affected,
            previous,
            previous_configuration: OnceCell::new(),
            current,
            current_workspace,
            source: None,
        }
    }

    /// Record which layer the change came from.
    pub fn with_source(mut self, source: Layer) -> Self {
        self.source = Some(source);
        self
    }

    pub fn source(&self) -> Option<Layer> {
        self.source
    }

    pub fn change(&self) -> &ConfigurationChange {
        &self.change
    }

    /// Changed keys, including keys changed inside override buckets.
    pub fn affected_keys(&self) -> &[String] {
        &self.affected_keys
    }

    /// The configuration before the change, rebuilt on first access.
    pub fn previous_configuration(&self) -> Option<&Configuration> {
        self.previous_configuration
            .get_or_init(|| {
                self.previous
                    .as_ref()
                    .map(|previous| Configuration::parse(previous.data.clone()))
            })
            .as_ref()
    }

    /// Whether `section` or anything inside it changed.
    ///
    /// `editor` is affected by a change to `editor.fontSize`, but not by one
    /// to `editorial`. With overrides, the section must also resolve to a
    /// different value before and after the change.
    pub fn affects_configuration(
        &self,
        section: &str,
        overrides: Option<&ConfigurationOverrides>,
    ) -> bool {
        if !self.matches_section(section) {
            return false;
        }
        let Some(overrides) = overrides else {
            return true;
        };

        let previous = self.previous_configuration().and_then(|configuration| {
            let workspace = self.previous.as_ref().and_then(|p| p.workspace.as_ref());
            configuration.get_value(Some(section), overrides, workspace)
        });
        let current = self
            .current
            .get_value(Some(section), overrides, self.current_workspace);
        previous != current
    }

    fn matches_section(&self, section: &str) -> bool {
        let needle = format!("{MARKER}{section}");
        self.affected.match_indices(&needle).any(|(index, _)| {
            matches!(
                self.affected[index + needle.len()..].chars().next(),
                Some(MARKER | '.')
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ConfigurationLayers;
    use rstest::rstest;
    use serde_json::json;
    use strata_model::ConfigurationModel;

    fn change(keys: &[&str]) -> ConfigurationChange {
        ConfigurationChange {
            keys: keys.iter().map(|key| key.to_string()).collect(),
            overrides: Vec::new(),
        }
    }

    #[rstest]
    #[case("editor", true)]
    #[case("editor.fontSize", true)]
    #[case("editor.font", false)]
    #[case("edit", false)]
    #[case("editor.fontSize.extra", false)]
    #[case("files.exclude", true)]
    fn test_prefix_matching(#[case] section: &str, #[case] expected: bool) {
        let configuration = Configuration::default();
        let event = ConfigurationChangeEvent::new(
            change(&["editor.fontSize", "files.exclude"]),
            None,
            &configuration,
            None,
        );
        assert_eq!(event.affects_configuration(section, None), expected);
    }

    #[test]
    fn test_later_occurrence_still_matches() {
        let configuration = Configuration::default();
        let event = ConfigurationChangeEvent::new(change(&["a.bc", "a.b"]), None, &configuration, None);
        assert!(event.affects_configuration("a.b", None));
    }

    #[test]
    fn test_override_keys_are_affected() {
        let configuration = Configuration::default();
        let event = ConfigurationChangeEvent::new(
            ConfigurationChange {
                keys: vec!["[markdown]".to_string()],
                overrides: vec![("markdown".to_string(), vec!["editor.wordWrap".to_string()])],
            },
            None,
            &configuration,
            None,
        )
        .with_source(Layer::Default);

        assert_eq!(event.affected_keys(), ["[markdown]", "editor.wordWrap"]);
        assert!(event.affects_configuration("editor", None));
        assert_eq!(event.source(), Some(Layer::Default));
    }

    #[test]
    fn test_overrides_compare_values() {
        let mut defaults = ConfigurationModel::empty();
        defaults.set_value("editor.wordWrap", json!("off"));
        defaults.set_value("[markdown]", json!({"editor.wordWrap": "on"}));
        let previous = Configuration::new(defaults.clone());

        let mut updated = defaults;
        updated.set_value("editor.wordWrap", json!("bounded"));
        let mut current = Configuration::from_layers(ConfigurationLayers::default());
        let change = current.compare_and_update_default_configuration(updated, None);

        let event = ConfigurationChangeEvent::new(
            change,
            Some(PreviousConfiguration {
                data: previous.to_data(),
                workspace: None,
            }),
            &current,
            None,
        );

        let markdown = ConfigurationOverrides::for_identifier("markdown");
        assert!(event.affects_configuration("editor.wordWrap", None));
        assert!(!event.affects_configuration("editor.wordWrap", Some(&markdown)));
        assert!(event.affects_configuration("editor.wordWrap", Some(&ConfigurationOverrides::default())));
    }
}
