//! Loading the layers named on the command line

use colored::Colorize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use strata_core::{
    ApplicationSettings, Configuration, ConfigurationLayers, ConfigurationOverrides, Resource,
    SettingsFile, Workspace, default_user_settings_path,
};
use strata_model::{
    ConfigurationModel, ParseOptions, default_configuration_model, policy_configuration_model,
};
use strata_registry::{ConfigurationRegistry, FOLDER_SCOPES, PropertySchema, WORKSPACE_SCOPES};

use crate::cli::{LayerArgs, ScopeArgs};
use crate::error::{CliError, Result};

/// A configuration assembled from settings files.
pub struct CliContext {
    pub registry: ConfigurationRegistry,
    pub configuration: Configuration,
    pub workspace: Option<Workspace>,
}

impl CliContext {
    pub fn load(args: &LayerArgs) -> Result<Self> {
        let registry = match &args.schema {
            Some(path) => load_registry(path)?,
            None => ConfigurationRegistry::new(),
        };

        let mut defaults = default_configuration_model(&registry);
        if let Some(path) = &args.defaults {
            defaults = defaults.merge(&[&load_file(path, ParseOptions::default(), &registry)]);
        }

        let policy = match &args.policy {
            Some(path) => {
                let policies = read_object(path)?;
                policy_configuration_model(&registry, &policies)
            }
            None => ConfigurationModel::empty(),
        };

        let application = match &args.application {
            Some(path) => {
                let mut settings = ApplicationSettings::new(path);
                let model = settings.load(&registry);
                report_errors(settings.file());
                model
            }
            None => ConfigurationModel::empty(),
        };

        let user_path = args.user.clone().or_else(default_user_settings_path);
        let local_user = match &user_path {
            Some(path) => load_file(path, ParseOptions::default(), &registry),
            None => ConfigurationModel::empty(),
        };

        let remote_user = load_optional(args.remote_user.as_deref(), ParseOptions::default(), &registry);
        let workspace_model = load_optional(
            args.workspace.as_deref(),
            ParseOptions::new().with_scopes(WORKSPACE_SCOPES),
            &registry,
        );

        let mut folders = BTreeMap::new();
        for (folder, path) in &args.folders {
            let model = load_file(path, ParseOptions::new().with_scopes(FOLDER_SCOPES), &registry);
            folders.insert(Resource::from(folder.as_str()), model);
        }
        let workspace = (!args.folders.is_empty())
            .then(|| Workspace::from_folders(args.folders.iter().map(|(folder, _)| folder.as_str())));

        let configuration = Configuration::from_layers(ConfigurationLayers {
            defaults,
            policy,
            application,
            local_user,
            remote_user,
            workspace: workspace_model,
            folders,
            ..Default::default()
        });
        tracing::debug!(
            keys = configuration.all_keys().len(),
            folders = args.folders.len(),
            "Loaded configuration"
        );

        Ok(Self {
            registry,
            configuration,
            workspace,
        })
    }

    pub fn overrides(scope: &ScopeArgs) -> ConfigurationOverrides {
        ConfigurationOverrides {
            resource: scope.resource.as_deref().map(Resource::from),
            override_identifier: scope.language.clone(),
        }
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(object) => Ok(object),
        _ => Err(CliError::user(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

/// Load property schemas from a `{"key": schema}` file.
pub fn load_registry(path: &Path) -> Result<ConfigurationRegistry> {
    let mut registry = ConfigurationRegistry::new();
    for (key, schema) in read_object(path)? {
        let schema: PropertySchema = serde_json::from_value(schema)?;
        registry.register_property(key, schema)?;
    }
    Ok(registry)
}

/// Load a settings file, reporting syntax errors on stderr.
pub fn load_file(path: &Path, options: ParseOptions, registry: &ConfigurationRegistry) -> ConfigurationModel {
    let mut file = SettingsFile::new(path, options);
    let model = file.load(registry);
    report_errors(&file);
    model
}

fn load_optional(path: Option<&Path>, options: ParseOptions, registry: &ConfigurationRegistry) -> ConfigurationModel {
    match path {
        Some(path) => load_file(path, options, registry),
        None => ConfigurationModel::empty(),
    }
}

fn report_errors(file: &SettingsFile) {
    for error in file.errors() {
        eprintln!(
            "{}: {}: {}",
            "warning".yellow().bold(),
            file.path().display(),
            error
        );
    }
}
