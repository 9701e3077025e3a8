//! End-to-end tests for the resolution pipeline
//!
//! Settings text flows through parsing, layering, caching and change
//! events the way an editor host drives it.

use pretty_assertions::assert_eq;
use serde_json::json;
use strata_core::{
    CachedFolderSettings, Configuration, ConfigurationChangeEvent, ConfigurationData,
    ConfigurationLayers, ConfigurationOverrides, InMemoryConfigurationCache, Layer,
    PreviousConfiguration, Resource, SettingsFile, Workspace,
};
use strata_model::{ParseOptions, default_configuration_model};
use strata_registry::WORKSPACE_SCOPES;
use strata_test_utils::{SettingsDir, editor_registry};

/// Set up user and workspace settings on disk.
fn setup_settings() -> SettingsDir {
    let dir = SettingsDir::new();
    dir.write(
        "user.json",
        r#"{
            // personal defaults
            "editor.tabSize": 2,
            "editor.wordWrap": "bounded",
            "[markdown]": {
                "editor.tabSize": 4,
            },
        }"#,
    );
    dir.write(
        "workspace.json",
        r#"{
            "files.exclude": {"target": true},
            "terminal.shell": "/bin/sh"
        }"#,
    );
    dir
}

fn load_configuration(dir: &SettingsDir) -> (Configuration, Vec<String>) {
    let registry = editor_registry();
    let mut user = SettingsFile::new(dir.path("user.json"), ParseOptions::default());
    let mut workspace = SettingsFile::new(
        dir.path("workspace.json"),
        ParseOptions::new().with_scopes(WORKSPACE_SCOPES).skip_restricted(true),
    );

    let configuration = Configuration::from_layers(ConfigurationLayers {
        defaults: default_configuration_model(&registry),
        local_user: user.load(&registry),
        workspace: workspace.load(&registry),
        ..Default::default()
    });
    (configuration, workspace.restricted_settings().to_vec())
}

#[test]
fn test_files_resolve_through_layers() {
    let dir = setup_settings();
    let (configuration, restricted) = load_configuration(&dir);
    let markdown = ConfigurationOverrides::for_identifier("markdown");

    assert_eq!(restricted, vec!["terminal.shell"]);
    assert_eq!(
        configuration.get_value(Some("editor.tabSize"), &markdown, None),
        Some(json!(4))
    );
    assert_eq!(
        configuration.get_value(Some("files.exclude"), &ConfigurationOverrides::default(), None),
        Some(json!({"target": true}))
    );
    assert_eq!(
        configuration.get_value(Some("terminal.shell"), &ConfigurationOverrides::default(), None),
        None
    );

    let section = configuration.get_section(Some("editor"), &markdown, None);
    assert_eq!(section.get_as::<u32>("tabSize"), Some(4));
    assert_eq!(section.key_for("tabSize"), "editor.tabSize");
}

#[test]
fn test_cached_folder_settings_feed_folder_layer() {
    let registry = editor_registry();
    let cache = InMemoryConfigurationCache::new();
    let folder = Resource::from("/repo/app");

    let writer = CachedFolderSettings::new(&folder);
    writer
        .update(Some(r#"{"files.exclude": {"dist": true}, "editor.tabSize": 8}"#), &cache)
        .unwrap();
    assert_eq!(cache.len(), 1);

    let mut reader = CachedFolderSettings::new(&folder);
    let model = reader.load(&cache, &registry);

    let mut configuration = Configuration::from_layers(ConfigurationLayers {
        defaults: default_configuration_model(&registry),
        workspace: strata_test_utils::model(json!({"files.exclude": {"target": true}})),
        ..Default::default()
    });
    let change = configuration.compare_and_update_folder_configuration(folder.clone(), model);
    assert!(change.keys.contains(&"files.exclude".to_string()));

    let workspace = Workspace::from_folders(["/repo/app"]);
    let inside = ConfigurationOverrides::for_resource("/repo/app/src/main.rs");
    assert_eq!(
        configuration.get_value(Some("files.exclude"), &inside, Some(&workspace)),
        Some(json!({"target": true, "dist": true}))
    );
    // Window-scoped keys are not accepted from folder settings.
    assert_eq!(
        configuration.get_value(Some("editor.tabSize"), &inside, Some(&workspace)),
        Some(json!(4))
    );

    writer.update(None, &cache).unwrap();
    assert!(cache.is_empty());
}

#[test]
fn test_edit_produces_scoped_change_event() {
    let dir = setup_settings();
    let (mut configuration, _) = load_configuration(&dir);
    let previous = PreviousConfiguration {
        data: configuration.to_data(),
        workspace: None,
    };

    dir.write(
        "user.json",
        r#"{"editor.tabSize": 2, "editor.wordWrap": "bounded", "[markdown]": {"editor.tabSize": 6}}"#,
    );
    let registry = editor_registry();
    let mut user = SettingsFile::new(dir.path("user.json"), ParseOptions::default());
    let change = configuration.compare_and_update_local_user_configuration(user.load(&registry));

    let event = ConfigurationChangeEvent::new(change, Some(previous), &configuration, None)
        .with_source(Layer::UserLocal);
    let markdown = ConfigurationOverrides::for_identifier("markdown");
    let rust = ConfigurationOverrides::for_identifier("rust");

    assert_eq!(event.source(), Some(Layer::UserLocal));
    assert!(event.affects_configuration("editor.tabSize", None));
    assert!(event.affects_configuration("editor.tabSize", Some(&markdown)));
    assert!(!event.affects_configuration("editor.tabSize", Some(&rust)));
    assert!(!event.affects_configuration("editor.wordWrap", None));
}

#[test]
fn test_snapshot_survives_json() {
    let dir = setup_settings();
    let (mut configuration, _) = load_configuration(&dir);
    configuration.update_folder_configuration(
        Resource::from("/repo/app"),
        strata_test_utils::model(json!({"files.exclude": {"dist": true}})),
    );

    let json = configuration.to_data().to_json().unwrap();
    let restored = Configuration::parse(ConfigurationData::from_json(&json).unwrap());
    let workspace = Workspace::from_folders(["/repo/app"]);
    let inside = ConfigurationOverrides::for_resource("/repo/app/readme.md").with_override_identifier("markdown");

    for key in ["editor.tabSize", "editor.wordWrap", "files.exclude"] {
        assert_eq!(
            restored.get_value(Some(key), &inside, Some(&workspace)),
            configuration.get_value(Some(key), &inside, Some(&workspace)),
            "{key}"
        );
    }

    let inspected = restored.inspect("editor.tabSize", &inside, Some(&workspace));
    assert_eq!(inspected.user_value(), Some(&json!(4)));
    assert_eq!(inspected.default_value(), Some(&json!(4)));
}
