//! Profile scenarios: application settings shared with a user profile,
//! and a remote user layer on top of the local one.

use pretty_assertions::assert_eq;
use serde_json::json;
use strata_core::{
    APPLY_TO_ALL_PROFILES_SETTING, ApplicationSettings, Configuration, ConfigurationLayers,
    ConfigurationOverrides, Layer, SettingsFile,
};
use strata_model::{ParseOptions, default_configuration_model};
use strata_registry::{ConfigurationRegistry, ConfigurationScope, PropertySchema};
use strata_test_utils::{SettingsDir, editor_registry};

fn registry() -> ConfigurationRegistry {
    let mut registry = editor_registry();
    registry
        .register_property(
            APPLY_TO_ALL_PROFILES_SETTING,
            PropertySchema::new().with_scope(ConfigurationScope::Application),
        )
        .unwrap();
    registry
}

fn global() -> ConfigurationOverrides {
    ConfigurationOverrides::default()
}

#[test]
fn test_shared_settings_reach_profile() {
    let dir = SettingsDir::new();
    let registry = registry();
    dir.write(
        "default/settings.json",
        r#"{
            "update.mode": "manual",
            "editor.tabSize": 3,
            "files.exclude": {"tmp": true},
            "workbench.settings.applyToAllProfiles": ["editor.tabSize"]
        }"#,
    );
    dir.write("profile/settings.json", r#"{"files.exclude": {"out": true}}"#);

    let mut application = ApplicationSettings::new(dir.path("default/settings.json"));
    let mut profile = SettingsFile::new(dir.path("profile/settings.json"), ParseOptions::default());
    let mut configuration = Configuration::from_layers(ConfigurationLayers {
        defaults: default_configuration_model(&registry),
        application: application.load(&registry),
        local_user: profile.load(&registry),
        ..Default::default()
    });

    assert_eq!(configuration.get_value(Some("update.mode"), &global(), None), Some(json!("manual")));
    assert_eq!(configuration.get_value(Some("editor.tabSize"), &global(), None), Some(json!(3)));
    // Not shared, so only the profile's own value applies.
    assert_eq!(
        configuration.get_value(Some("files.exclude"), &global(), None),
        Some(json!({"out": true}))
    );

    dir.write(
        "default/settings.json",
        r#"{
            "update.mode": "manual",
            "editor.tabSize": 3,
            "workbench.settings.applyToAllProfiles": []
        }"#,
    );
    let change = configuration.compare_and_update_application_configuration(application.load(&registry));

    assert!(change.keys.contains(&"editor.tabSize".to_string()));
    assert_eq!(configuration.get_value(Some("editor.tabSize"), &global(), None), Some(json!(4)));
    assert_eq!(configuration.get_value(Some("update.mode"), &global(), None), Some(json!("manual")));
}

#[test]
fn test_remote_user_overrides_local() {
    let dir = SettingsDir::new();
    let registry = registry();
    dir.write("local.json", r#"{"editor.tabSize": 5, "editor.wordWrap": "on"}"#);
    dir.write("remote.json", r#"{"editor.tabSize": 7}"#);

    let mut local = SettingsFile::new(dir.path("local.json"), ParseOptions::default());
    let mut remote = SettingsFile::new(dir.path("remote.json"), ParseOptions::default());
    let mut configuration = Configuration::from_layers(ConfigurationLayers {
        defaults: default_configuration_model(&registry),
        local_user: local.load(&registry),
        remote_user: remote.load(&registry),
        ..Default::default()
    });

    assert_eq!(configuration.get_value(Some("editor.tabSize"), &global(), None), Some(json!(7)));
    assert_eq!(configuration.get_value(Some("editor.wordWrap"), &global(), None), Some(json!("on")));

    let inspected = configuration.inspect("editor.tabSize", &global(), None);
    assert_eq!(inspected.user_local_value(), Some(&json!(5)));
    assert_eq!(inspected.user_remote_value(), Some(&json!(7)));
    assert_eq!(inspected.user_value(), Some(&json!(7)));
    assert_eq!(inspected.layer_value(Layer::Default), Some(&json!(4)));

    dir.write("remote.json", "{}");
    let change = configuration.compare_and_update_remote_user_configuration(remote.load(&registry));
    assert_eq!(change.keys, vec!["editor.tabSize"]);
    assert_eq!(configuration.get_value(Some("editor.tabSize"), &global(), None), Some(json!(5)));
}
