//! The layered configuration and its query, update and diff operations

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use strata_model::{ConfigurationChange, ConfigurationModel, compare};
use strata_registry::override_identifiers_from_key;

use crate::consolidation::ConsolidationCache;
use crate::error::{Error, Result};
use crate::inspect::{ConfigurationInspectValue, InspectedLayers};
use crate::resource::Resource;
use crate::workspace::Workspace;

/// The source layers of a configuration, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    Default,
    Policy,
    Application,
    UserLocal,
    UserRemote,
    Workspace,
    WorkspaceFolder,
    Memory,
}

impl Layer {
    pub const ALL: [Layer; 8] = [
        Layer::Default,
        Layer::Policy,
        Layer::Application,
        Layer::UserLocal,
        Layer::UserRemote,
        Layer::Workspace,
        Layer::WorkspaceFolder,
        Layer::Memory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Default => "default",
            Layer::Policy => "policy",
            Layer::Application => "application",
            Layer::UserLocal => "userLocal",
            Layer::UserRemote => "userRemote",
            Layer::Workspace => "workspace",
            Layer::WorkspaceFolder => "workspaceFolder",
            Layer::Memory => "memory",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a query is scoped to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationOverrides {
    /// The resource whose folder and memory layers apply
    pub resource: Option<Resource>,
    /// A language or other override identifier such as `markdown`
    pub override_identifier: Option<String>,
}

impl ConfigurationOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_resource(resource: impl Into<Resource>) -> Self {
        Self::new().with_resource(resource)
    }

    pub fn for_identifier(identifier: impl Into<String>) -> Self {
        Self::new().with_override_identifier(identifier)
    }

    pub fn with_resource(mut self, resource: impl Into<Resource>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_override_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.override_identifier = Some(identifier.into());
        self
    }
}

/// Initial contents of every layer of a [`Configuration`].
#[derive(Debug, Default)]
pub struct ConfigurationLayers {
    pub defaults: ConfigurationModel,
    pub policy: ConfigurationModel,
    pub application: ConfigurationModel,
    pub local_user: ConfigurationModel,
    pub remote_user: ConfigurationModel,
    pub workspace: ConfigurationModel,
    pub folders: BTreeMap<Resource, ConfigurationModel>,
    pub memory: ConfigurationModel,
    pub memory_by_resource: HashMap<Resource, ConfigurationModel>,
}

/// Keys defined by each layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationKeys {
    pub default: Vec<String>,
    pub policy: Vec<String>,
    pub user: Vec<String>,
    pub workspace: Vec<String>,
    pub workspace_folder: Vec<String>,
}

/// A layered configuration.
///
/// Queries merge `default < application < user < workspace < folder <
/// memory`, then lay policy values over the result. Merged models are
/// cached and shared; replacing a layer drops the merges built from it.
#[derive(Debug)]
pub struct Configuration {
    pub(crate) defaults: Arc<ConfigurationModel>,
    pub(crate) policy: Arc<ConfigurationModel>,
    pub(crate) application: Arc<ConfigurationModel>,
    pub(crate) local_user: Arc<ConfigurationModel>,
    pub(crate) remote_user: Arc<ConfigurationModel>,
    pub(crate) workspace: Arc<ConfigurationModel>,
    pub(crate) folders: BTreeMap<Resource, Arc<ConfigurationModel>>,
    pub(crate) memory: Arc<ConfigurationModel>,
    pub(crate) memory_by_resource: HashMap<Resource, Arc<ConfigurationModel>>,
    pub(crate) cache: Mutex<ConsolidationCache>,
}

impl Configuration {
    /// A configuration with only a default layer.
    pub fn new(defaults: ConfigurationModel) -> Self {
        Self::from_layers(ConfigurationLayers {
            defaults,
            ..Default::default()
        })
    }

    pub fn from_layers(layers: ConfigurationLayers) -> Self {
        Self {
            defaults: Arc::new(layers.defaults),
            policy: Arc::new(layers.policy),
            application: Arc::new(layers.application),
            local_user: Arc::new(layers.local_user),
            remote_user: Arc::new(layers.remote_user),
            workspace: Arc::new(layers.workspace),
            folders: layers
                .folders
                .into_iter()
                .map(|(folder, model)| (folder, Arc::new(model)))
                .collect(),
            memory: Arc::new(layers.memory),
            memory_by_resource: layers
                .memory_by_resource
                .into_iter()
                .map(|(resource, model)| (resource, Arc::new(model)))
                .collect(),
            cache: Mutex::new(ConsolidationCache::default()),
        }
    }

    pub fn defaults(&self) -> &ConfigurationModel {
        &self.defaults
    }

    pub fn policy(&self) -> &ConfigurationModel {
        &self.policy
    }

    pub fn application(&self) -> &ConfigurationModel {
        &self.application
    }

    pub fn local_user(&self) -> &ConfigurationModel {
        &self.local_user
    }

    pub fn remote_user(&self) -> &ConfigurationModel {
        &self.remote_user
    }

    pub fn workspace(&self) -> &ConfigurationModel {
        &self.workspace
    }

    pub fn folder(&self, folder: &Resource) -> Option<&ConfigurationModel> {
        self.folders.get(folder).map(Arc::as_ref)
    }

    pub fn folders(&self) -> impl Iterator<Item = (&Resource, &ConfigurationModel)> {
        self.folders.iter().map(|(folder, model)| (folder, model.as_ref()))
    }

    pub fn memory(&self) -> &ConfigurationModel {
        &self.memory
    }

    /// Resolve `section`, or the whole merged tree for `None`.
    pub fn get_value(
        &self,
        section: Option<&str>,
        overrides: &ConfigurationOverrides,
        workspace: Option<&Workspace>,
    ) -> Option<Value> {
        self.consolidated_model(section, overrides, workspace)
            .get_value(section)
    }

    /// Write to the memory layer; `None` removes the key.
    ///
    /// With a resource the write only affects queries for that resource.
    pub fn update_value(
        &mut self,
        key: &str,
        value: Option<Value>,
        overrides: &ConfigurationOverrides,
    ) {
        let memory = match &overrides.resource {
            Some(resource) => self.memory_by_resource.entry(resource.clone()).or_default(),
            None => &mut self.memory,
        };
        let memory = Arc::make_mut(memory);
        match value {
            Some(value) => memory.set_value(key, value),
            None => memory.remove_value(key),
        }
        tracing::debug!(key, resource = ?overrides.resource, "Updated memory configuration");

        if overrides.resource.is_none() {
            self.cache_mut().invalidate_workspace();
        }
    }

    /// Break a key's value down by layer.
    pub fn inspect(
        &self,
        key: &str,
        overrides: &ConfigurationOverrides,
        workspace: Option<&Workspace>,
    ) -> ConfigurationInspectValue {
        let consolidated = self.consolidated_model(Some(key), overrides, workspace);
        let folder = self.folder_model_for_resource(overrides.resource.as_ref(), workspace);
        let memory = overrides
            .resource
            .as_ref()
            .and_then(|resource| self.memory_by_resource.get(resource))
            .unwrap_or(&self.memory);

        let mut override_identifiers: Vec<String> = Vec::new();
        for bucket in consolidated.overrides() {
            for identifier in &bucket.identifiers {
                if !override_identifiers.contains(identifier)
                    && consolidated
                        .get_override_value(Some(key), identifier)
                        .is_some()
                {
                    override_identifiers.push(identifier.clone());
                }
            }
        }

        ConfigurationInspectValue::new(
            key,
            overrides.override_identifier.clone(),
            consolidated.get_value(Some(key)),
            (!override_identifiers.is_empty()).then_some(override_identifiers),
            InspectedLayers {
                default: Arc::clone(&self.defaults),
                policy: (!self.policy.is_empty()).then(|| Arc::clone(&self.policy)),
                application: (!self.application.is_empty()).then(|| Arc::clone(&self.application)),
                user: self.user_configuration(),
                user_local: Arc::clone(&self.local_user),
                user_remote: Arc::clone(&self.remote_user),
                workspace: workspace.map(|_| Arc::clone(&self.workspace)),
                workspace_folder: folder,
                memory: Arc::clone(memory),
            },
        )
    }

    /// Keys defined per layer; folder keys are those of `resource`'s folder.
    pub fn keys(&self, resource: Option<&Resource>, workspace: Option<&Workspace>) -> ConfigurationKeys {
        ConfigurationKeys {
            default: self.defaults.keys().to_vec(),
            policy: self.policy.keys().to_vec(),
            user: self.user_configuration().keys().to_vec(),
            workspace: self.workspace.keys().to_vec(),
            workspace_folder: self
                .folder_model_for_resource(resource, workspace)
                .map(|folder| folder.keys().to_vec())
                .unwrap_or_default(),
        }
    }

    /// Every key of the default, user, workspace and folder layers.
    ///
    /// Policy, application and memory keys are not listed.
    pub fn all_keys(&self) -> Vec<String> {
        let user = self.user_configuration();
        self.collect_distinct(&user, |model| model.keys().to_vec())
    }

    pub fn all_override_identifiers(&self) -> Vec<String> {
        let user = self.user_configuration();
        self.collect_distinct(&user, ConfigurationModel::get_all_override_identifiers)
    }

    pub fn get_all_keys_for_override_identifier(&self, identifier: &str) -> Vec<String> {
        let user = self.user_configuration();
        self.collect_distinct(&user, |model| {
            model.get_keys_for_override_identifier(identifier)
        })
    }

    fn collect_distinct(
        &self,
        user: &ConfigurationModel,
        items: impl Fn(&ConfigurationModel) -> Vec<String>,
    ) -> Vec<String> {
        let mut collected: Vec<String> = Vec::new();
        let models = [self.defaults.as_ref(), user, self.workspace.as_ref()]
            .into_iter()
            .chain(self.folders.values().map(Arc::as_ref));
        for model in models {
            for item in items(model) {
                if !collected.contains(&item) {
                    collected.push(item);
                }
            }
        }
        collected
    }

    pub fn update_default_configuration(&mut self, defaults: ConfigurationModel) {
        self.defaults = Arc::new(defaults);
        self.cache_mut().invalidate_workspace();
    }

    /// Policy values are laid over each query, so no cached merge is stale.
    pub fn update_policy_configuration(&mut self, policy: ConfigurationModel) {
        self.policy = Arc::new(policy);
    }

    pub fn update_application_configuration(&mut self, application: ConfigurationModel) {
        self.application = Arc::new(application);
        self.cache_mut().invalidate_workspace();
    }

    pub fn update_local_user_configuration(&mut self, user: ConfigurationModel) {
        self.local_user = Arc::new(user);
        let cache = self.cache_mut();
        cache.invalidate_user();
        cache.invalidate_workspace();
    }

    pub fn update_remote_user_configuration(&mut self, user: ConfigurationModel) {
        self.remote_user = Arc::new(user);
        let cache = self.cache_mut();
        cache.invalidate_user();
        cache.invalidate_workspace();
    }

    pub fn update_workspace_configuration(&mut self, workspace: ConfigurationModel) {
        self.workspace = Arc::new(workspace);
        self.cache_mut().invalidate_workspace();
    }

    pub fn update_folder_configuration(&mut self, folder: Resource, model: ConfigurationModel) {
        self.cache_mut().invalidate_folder(&folder);
        self.folders.insert(folder, Arc::new(model));
    }

    pub fn delete_folder_configuration(&mut self, folder: &Resource) {
        self.folders.remove(folder);
        self.cache_mut().invalidate_folder(folder);
    }

    /// Replace the default layer and describe what changed.
    ///
    /// `keys` names the changed keys when the caller already knows them;
    /// otherwise they are computed by diffing the old and new defaults.
    /// For changed override keys the affected keys of each identifier are
    /// reported as well.
    pub fn compare_and_update_default_configuration(
        &mut self,
        defaults: ConfigurationModel,
        keys: Option<Vec<String>>,
    ) -> ConfigurationChange {
        let keys = keys.unwrap_or_else(|| compare(Some(&*self.defaults), Some(&defaults)).keys());

        let mut overrides: Vec<(String, Vec<String>)> = Vec::new();
        for key in &keys {
            for identifier in override_identifiers_from_key(key) {
                let from_keys = self.defaults.get_keys_for_override_identifier(&identifier);
                let to_keys = defaults.get_keys_for_override_identifier(&identifier);
                let from_model = self.defaults.override_model(&identifier);
                let to_model = defaults.override_model(&identifier);

                let mut changed: Vec<String> = Vec::new();
                let added = to_keys.iter().filter(|key| !from_keys.contains(key));
                let removed = from_keys.iter().filter(|key| !to_keys.contains(key));
                let updated = from_keys.iter().filter(|key| {
                    from_model.get_value(Some(key.as_str())) != to_model.get_value(Some(key.as_str()))
                });
                for key in added.chain(removed).chain(updated) {
                    if !changed.contains(key) {
                        changed.push(key.clone());
                    }
                }
                overrides.push((identifier, changed));
            }
        }

        self.update_default_configuration(defaults);
        ConfigurationChange { keys, overrides }
    }

    /// Replace the policy layer if any key changed.
    pub fn compare_and_update_policy_configuration(
        &mut self,
        policy: ConfigurationModel,
    ) -> ConfigurationChange {
        let keys = compare(Some(&*self.policy), Some(&policy)).keys();
        if !keys.is_empty() {
            self.update_policy_configuration(policy);
        }
        ConfigurationChange {
            keys,
            overrides: Vec::new(),
        }
    }

    pub fn compare_and_update_application_configuration(
        &mut self,
        application: ConfigurationModel,
    ) -> ConfigurationChange {
        let change = compare(Some(&*self.application), Some(&application)).into_change();
        if !change.keys.is_empty() {
            self.update_application_configuration(application);
        }
        change
    }

    pub fn compare_and_update_local_user_configuration(
        &mut self,
        user: ConfigurationModel,
    ) -> ConfigurationChange {
        let change = compare(Some(&*self.local_user), Some(&user)).into_change();
        if !change.keys.is_empty() {
            self.update_local_user_configuration(user);
        }
        change
    }

    pub fn compare_and_update_remote_user_configuration(
        &mut self,
        user: ConfigurationModel,
    ) -> ConfigurationChange {
        let change = compare(Some(&*self.remote_user), Some(&user)).into_change();
        if !change.keys.is_empty() {
            self.update_remote_user_configuration(user);
        }
        change
    }

    pub fn compare_and_update_workspace_configuration(
        &mut self,
        workspace: ConfigurationModel,
    ) -> ConfigurationChange {
        let change = compare(Some(&*self.workspace), Some(&workspace)).into_change();
        if !change.keys.is_empty() {
            self.update_workspace_configuration(workspace);
        }
        change
    }

    /// Replace a folder layer if any key changed or the folder is new.
    pub fn compare_and_update_folder_configuration(
        &mut self,
        folder: Resource,
        model: ConfigurationModel,
    ) -> ConfigurationChange {
        let current = self.folders.get(&folder).map(Arc::as_ref);
        let is_new = current.is_none();
        let change = compare(current, Some(&model)).into_change();
        if !change.keys.is_empty() || is_new {
            self.update_folder_configuration(folder, model);
        }
        change
    }

    /// Remove a folder layer, reporting all of its keys as changed.
    pub fn compare_and_delete_folder_configuration(
        &mut self,
        folder: &Resource,
    ) -> Result<ConfigurationChange> {
        let Some(current) = self.folders.get(folder).cloned() else {
            return Err(Error::UnknownFolder {
                folder: folder.clone(),
            });
        };
        self.delete_folder_configuration(folder);
        Ok(compare(Some(&*current), None).into_change())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from_layers(ConfigurationLayers::default())
    }
}
