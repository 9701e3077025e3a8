//! Cached merges of the configuration layers
//!
//! The workspace-level consolidation is `defaults, application, user,
//! workspace, memory` merged in that order. A folder consolidation adds the
//! folder layer on top of it. Both are computed on first use and dropped
//! whenever one of their inputs is replaced.

use std::collections::HashMap;
use std::sync::{Arc, MutexGuard, PoisonError};

use strata_model::{ConfigurationModel, ModelView};

use crate::configuration::{Configuration, ConfigurationOverrides};
use crate::resource::Resource;
use crate::workspace::Workspace;

/// Consolidated models, each absent until first computed.
#[derive(Debug, Default)]
pub(crate) struct ConsolidationCache {
    user: Option<Arc<ConfigurationModel>>,
    workspace: Option<Arc<ConfigurationModel>>,
    folders: HashMap<Resource, Arc<ConfigurationModel>>,
}

impl ConsolidationCache {
    pub(crate) fn invalidate_user(&mut self) {
        self.user = None;
    }

    /// Drop the workspace model and every folder model built on it.
    pub(crate) fn invalidate_workspace(&mut self) {
        self.workspace = None;
        self.folders.clear();
    }

    pub(crate) fn invalidate_folder(&mut self, folder: &Resource) {
        self.folders.remove(folder);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.user.is_none() && self.workspace.is_none() && self.folders.is_empty()
    }
}

impl Configuration {
    pub(crate) fn lock_cache(&self) -> MutexGuard<'_, ConsolidationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn cache_mut(&mut self) -> &mut ConsolidationCache {
        self.cache.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Local user settings, with remote user settings merged on top.
    pub fn user_configuration(&self) -> Arc<ConfigurationModel> {
        let mut cache = self.lock_cache();
        self.user_consolidated(&mut cache)
    }

    fn user_consolidated(&self, cache: &mut ConsolidationCache) -> Arc<ConfigurationModel> {
        if let Some(user) = &cache.user {
            return Arc::clone(user);
        }
        let user = if self.remote_user.is_empty() {
            Arc::clone(&self.local_user)
        } else {
            Arc::new(self.local_user.merge(&[&*self.remote_user]).without_raw())
        };
        tracing::debug!(keys = user.keys().len(), "Consolidated user configuration");
        cache.user = Some(Arc::clone(&user));
        user
    }

    fn workspace_consolidated(&self, cache: &mut ConsolidationCache) -> Arc<ConfigurationModel> {
        if let Some(workspace) = &cache.workspace {
            return Arc::clone(workspace);
        }
        let user = self.user_consolidated(cache);
        let consolidated = Arc::new(self.defaults.merge(&[
            &*self.application,
            &*user,
            &*self.workspace,
            &*self.memory,
        ]));
        tracing::debug!(
            keys = consolidated.keys().len(),
            "Consolidated workspace configuration"
        );
        cache.workspace = Some(Arc::clone(&consolidated));
        consolidated
    }

    /// The workspace consolidation with `folder`'s layer on top, or the
    /// workspace consolidation alone when the folder has no layer.
    fn folder_consolidated(
        &self,
        cache: &mut ConsolidationCache,
        folder: &Resource,
    ) -> Arc<ConfigurationModel> {
        if let Some(consolidated) = cache.folders.get(folder) {
            return Arc::clone(consolidated);
        }
        let workspace = self.workspace_consolidated(cache);
        let Some(folder_model) = self.folders.get(folder) else {
            return workspace;
        };
        let consolidated = Arc::new(workspace.merge(&[&**folder_model]));
        tracing::debug!(%folder, "Consolidated folder configuration");
        cache
            .folders
            .insert(folder.clone(), Arc::clone(&consolidated));
        consolidated
    }

    /// The merged model that answers queries for `overrides.resource`.
    pub(crate) fn consolidated_for_resource(
        &self,
        overrides: &ConfigurationOverrides,
        workspace: Option<&Workspace>,
    ) -> Arc<ConfigurationModel> {
        let mut cache = self.lock_cache();
        let mut consolidated = self.workspace_consolidated(&mut cache);

        if let (Some(workspace), Some(resource)) = (workspace, &overrides.resource) {
            if let Some(folder) = workspace.get_folder(resource) {
                consolidated = self.folder_consolidated(&mut cache, &folder.uri);
            }
            if let Some(memory) = self.memory_by_resource.get(resource) {
                consolidated = Arc::new(consolidated.merge(&[&**memory]));
            }
        }
        consolidated
    }

    /// The model a query for `section` reads from, with the override
    /// identifier applied and policy values laid over it.
    pub(crate) fn consolidated_model(
        &self,
        section: Option<&str>,
        overrides: &ConfigurationOverrides,
        workspace: Option<&Workspace>,
    ) -> Arc<ConfigurationModel> {
        let base = self.consolidated_for_resource(overrides, workspace);
        let model = match overrides.override_identifier.as_deref() {
            Some(identifier) => match base.override_model(identifier) {
                ModelView::Shared(model) => model,
                ModelView::Borrowed(_) => Arc::clone(&base),
            },
            None => base,
        };

        if self.policy.is_empty() || self.policy.get_value(section).is_none() {
            return model;
        }
        let mut overlaid = model.merge(&[]);
        for key in self.policy.keys() {
            if let Some(value) = self.policy.get_value(Some(key)) {
                overlaid.set_value(key, value);
            }
        }
        Arc::new(overlaid)
    }

    /// The folder layer `resource` falls into, if any.
    pub(crate) fn folder_model_for_resource(
        &self,
        resource: Option<&Resource>,
        workspace: Option<&Workspace>,
    ) -> Option<Arc<ConfigurationModel>> {
        let folder = workspace?.get_folder(resource?)?;
        self.folders.get(&folder.uri).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ConfigurationLayers;
    use serde_json::json;

    fn model(key: &str, value: serde_json::Value) -> ConfigurationModel {
        let mut model = ConfigurationModel::empty();
        model.set_value(key, value);
        model
    }

    #[test]
    fn test_caches_fill_on_read_and_clear_on_update() {
        let mut configuration = Configuration::from_layers(ConfigurationLayers {
            defaults: model("a", json!(1)),
            ..Default::default()
        });
        assert!(configuration.lock_cache().is_empty());

        let first = configuration.consolidated_for_resource(&ConfigurationOverrides::default(), None);
        let second = configuration.consolidated_for_resource(&ConfigurationOverrides::default(), None);
        assert!(Arc::ptr_eq(&first, &second));

        configuration.update_workspace_configuration(model("a", json!(2)));
        assert!(configuration.lock_cache().workspace.is_none());

        configuration.update_local_user_configuration(model("b", json!(3)));
        assert!(configuration.lock_cache().is_empty());
    }

    #[test]
    fn test_remote_user_merges_without_raw() {
        let configuration = Configuration::from_layers(ConfigurationLayers {
            local_user: model("a", json!(1)),
            remote_user: model("b", json!(2)),
            ..Default::default()
        });

        let user = configuration.user_configuration();
        assert_eq!(user.get_value(Some("a")), Some(json!(1)));
        assert_eq!(user.get_value(Some("b")), Some(json!(2)));
        assert!(user.raw().is_none());
    }

    #[test]
    fn test_folder_cache_is_per_folder() {
        let mut configuration = Configuration::from_layers(ConfigurationLayers::default());
        configuration.update_folder_configuration(Resource::from("/a"), model("x", json!(1)));
        configuration.update_folder_configuration(Resource::from("/b"), model("x", json!(2)));
        let workspace = Workspace::from_folders(["/a", "/b"]);

        for folder in ["/a/file", "/b/file"] {
            let overrides = ConfigurationOverrides::for_resource(folder);
            configuration.consolidated_for_resource(&overrides, Some(&workspace));
        }
        assert_eq!(configuration.lock_cache().folders.len(), 2);

        configuration.update_folder_configuration(Resource::from("/a"), model("x", json!(3)));
        let cache = configuration.lock_cache();
        assert!(!cache.folders.contains_key(&Resource::from("/a")));
        assert!(cache.folders.contains_key(&Resource::from("/b")));
    }
}
