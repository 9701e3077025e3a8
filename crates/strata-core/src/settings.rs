//! Settings files on disk

use serde_json::Value;
use std::path::{Path, PathBuf};

use strata_model::{ConfigurationModel, ConfigurationModelParser, ParseError, ParseOptions};
use strata_registry::{APPLICATION_SCOPES, ConfigurationRegistry};

/// Setting that lists user settings shared by every profile.
pub const APPLY_TO_ALL_PROFILES_SETTING: &str = "workbench.settings.applyToAllProfiles";

const SETTINGS_FILE_NAME: &str = "settings.json";

/// The default location of the user settings file.
pub fn default_user_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("strata").join(SETTINGS_FILE_NAME))
}

/// A settings file parsed into a model.
///
/// A missing or unreadable file loads as an empty model; a file with
/// syntax errors loads as an empty model with the errors recorded.
#[derive(Debug)]
pub struct SettingsFile {
    path: PathBuf,
    options: ParseOptions,
    parser: ConfigurationModelParser,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>, options: ParseOptions) -> Self {
        let path = path.into();
        let parser = ConfigurationModelParser::new(path.display().to_string());
        Self {
            path,
            options,
            parser,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Read and parse the file.
    pub fn load(&mut self, registry: &ConfigurationRegistry) -> ConfigurationModel {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Settings file not found");
                String::new()
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Failed to read settings file");
                String::new()
            }
        };
        let content = if content.trim().is_empty() { "{}" } else { &content };

        self.parser.parse(content, &self.options, registry);
        tracing::debug!(
            path = %self.path.display(),
            keys = self.parser.configuration_model().keys().len(),
            "Loaded settings file"
        );
        self.parser.configuration_model().clone()
    }

    /// Re-filter the last loaded content, optionally with new options.
    pub fn reparse(
        &mut self,
        options: Option<ParseOptions>,
        registry: &ConfigurationRegistry,
    ) -> ConfigurationModel {
        if let Some(options) = options {
            self.options = options;
        }
        self.parser.reparse(&self.options, registry);
        self.parser.configuration_model().clone()
    }

    pub fn configuration_model(&self) -> &ConfigurationModel {
        self.parser.configuration_model()
    }

    /// Restricted settings found in the last load, kept or not.
    pub fn restricted_settings(&self) -> &[String] {
        self.parser.restricted_configurations()
    }

    pub fn errors(&self) -> &[ParseError] {
        self.parser.errors()
    }
}

/// The application-scoped part of the default profile's settings.
///
/// Besides application-scoped properties it keeps every setting listed in
/// [`APPLY_TO_ALL_PROFILES_SETTING`].
#[derive(Debug)]
pub struct ApplicationSettings {
    file: SettingsFile,
}

impl ApplicationSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let options = ParseOptions::new()
            .with_scopes(APPLICATION_SCOPES)
            .skip_unregistered(true);
        Self {
            file: SettingsFile::new(path, options),
        }
    }

    pub fn file(&self) -> &SettingsFile {
        &self.file
    }

    pub fn load(&mut self, registry: &ConfigurationRegistry) -> ConfigurationModel {
        let model = self.file.load(registry);
        let shared: Vec<String> = match model.get_value(Some(APPLY_TO_ALL_PROFILES_SETTING)) {
            Some(Value::Array(keys)) => keys
                .into_iter()
                .filter_map(|key| key.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        if shared.is_empty() && self.file.options().include.is_empty() {
            return model;
        }
        let options = self.file.options().clone().with_include(shared);
        self.file.reparse(Some(options), registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_registry::{ConfigurationScope, PropertySchema};
    use tempfile::TempDir;

    fn registry() -> ConfigurationRegistry {
        let mut registry = ConfigurationRegistry::new();
        registry
            .register_property(
                "update.mode",
                PropertySchema::new().with_scope(ConfigurationScope::Application),
            )
            .unwrap();
        registry
            .register_property(APPLY_TO_ALL_PROFILES_SETTING, PropertySchema::new().with_scope(ConfigurationScope::Application))
            .unwrap();
        registry
            .register_property("editor.fontSize", PropertySchema::new())
            .unwrap();
        registry
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut file = SettingsFile::new(dir.path().join("missing.json"), ParseOptions::default());
        let model = file.load(&registry());
        assert!(model.is_empty());
        assert!(file.errors().is_empty());
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "").unwrap();

        let mut file = SettingsFile::new(&path, ParseOptions::default());
        assert!(file.load(&registry()).is_empty());
        assert!(file.errors().is_empty());
    }

    #[test]
    fn test_reparse_uses_new_options() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"update.mode": "manual", "editor.fontSize": 12}"#).unwrap();
        let registry = registry();

        let mut file = SettingsFile::new(&path, ParseOptions::default());
        assert_eq!(file.load(&registry).keys().len(), 2);

        std::fs::remove_file(&path).unwrap();
        let options = ParseOptions::new().with_scopes(APPLICATION_SCOPES);
        let model = file.reparse(Some(options), &registry);
        assert_eq!(model.keys(), ["update.mode"]);
    }

    #[test]
    fn test_application_settings_include_shared_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "update.mode": "manual",
                "editor.fontSize": 14,
                "workbench.settings.applyToAllProfiles": ["editor.fontSize"]
            }"#,
        )
        .unwrap();

        let mut settings = ApplicationSettings::new(&path);
        let model = settings.load(&registry());
        assert_eq!(model.get_value(Some("update.mode")), Some(json!("manual")));
        assert_eq!(model.get_value(Some("editor.fontSize")), Some(json!(14)));
    }

    #[test]
    fn test_default_user_settings_path_ends_with_file_name() {
        if let Some(path) = default_user_settings_path() {
            assert!(path.ends_with("strata/settings.json"));
        }
    }
}
