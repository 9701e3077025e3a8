//! Serializable snapshot of a configuration

use serde::{Deserialize, Serialize};

use strata_model::{ConfigurationModel, ConfigurationModelData};

use crate::configuration::{Configuration, ConfigurationLayers};
use crate::error::Result;
use crate::resource::Resource;

/// Every persistent layer of a [`Configuration`].
///
/// Memory layers are not part of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationData {
    pub defaults: ConfigurationModelData,
    #[serde(default)]
    pub policy: ConfigurationModelData,
    #[serde(default)]
    pub application: ConfigurationModelData,
    #[serde(default)]
    pub user_local: ConfigurationModelData,
    #[serde(default)]
    pub user_remote: ConfigurationModelData,
    #[serde(default)]
    pub workspace: ConfigurationModelData,
    #[serde(default)]
    pub folders: Vec<(Resource, ConfigurationModelData)>,
}

impl ConfigurationData {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Configuration {
    pub fn to_data(&self) -> ConfigurationData {
        ConfigurationData {
            defaults: self.defaults.to_data(),
            policy: self.policy.to_data(),
            application: self.application.to_data(),
            user_local: self.local_user.to_data(),
            user_remote: self.remote_user.to_data(),
            workspace: self.workspace.to_data(),
            folders: self
                .folders
                .iter()
                .map(|(folder, model)| (folder.clone(), model.to_data()))
                .collect(),
        }
    }

    /// Rebuild a configuration from a snapshot, with empty memory layers.
    pub fn parse(data: ConfigurationData) -> Configuration {
        Configuration::from_layers(ConfigurationLayers {
            defaults: ConfigurationModel::from_data(data.defaults),
            policy: ConfigurationModel::from_data(data.policy),
            application: ConfigurationModel::from_data(data.application),
            local_user: ConfigurationModel::from_data(data.user_local),
            remote_user: ConfigurationModel::from_data(data.user_remote),
            workspace: ConfigurationModel::from_data(data.workspace),
            folders: data
                .folders
                .into_iter()
                .map(|(folder, model)| (folder, ConfigurationModel::from_data(model)))
                .collect(),
            ..Default::default()
        })
    }
}
