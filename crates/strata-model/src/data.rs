//! Serializable form of a configuration model

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use strata_tree::ValueTree;

use crate::model::{ConfigurationModel, OverrideBucket, RawSource};

/// A structural copy of a [`ConfigurationModel`], safe to serialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationModelData {
    pub contents: ValueTree,
    #[serde(default)]
    pub overrides: Vec<OverrideBucket>,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Vec<RawSourceData>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RawSourceData {
    Object(ValueTree),
    Model(Box<ConfigurationModelData>),
}

impl From<&ConfigurationModel> for ConfigurationModelData {
    fn from(model: &ConfigurationModel) -> Self {
        Self {
            contents: model.contents().clone(),
            overrides: model.overrides().to_vec(),
            keys: model.keys().to_vec(),
            raw: model.raw().map(|sources| {
                sources
                    .iter()
                    .map(|source| match source {
                        RawSource::Object(object) => RawSourceData::Object(object.clone()),
                        RawSource::Model(model) => {
                            RawSourceData::Model(Box::new(ConfigurationModelData::from(model.as_ref())))
                        }
                    })
                    .collect()
            }),
        }
    }
}

impl From<ConfigurationModelData> for ConfigurationModel {
    fn from(data: ConfigurationModelData) -> Self {
        let raw = data.raw.map(|sources| {
            sources
                .into_iter()
                .map(|source| match source {
                    RawSourceData::Object(object) => RawSource::Object(object),
                    RawSourceData::Model(model) => RawSource::Model(Arc::new((*model).into())),
                })
                .collect()
        });
        ConfigurationModel::new(data.contents, data.keys, data.overrides, raw)
    }
}

impl ConfigurationModel {
    pub fn to_data(&self) -> ConfigurationModelData {
        ConfigurationModelData::from(self)
    }

    pub fn from_data(data: ConfigurationModelData) -> Self {
        data.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let mut model = ConfigurationModel::empty();
        model.set_value("[go]", json!({"a": 1}));

        let value = serde_json::to_value(model.to_data()).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": {"[go]": {"a": 1}},
                "overrides": [{"identifiers": ["go"], "keys": ["a"], "contents": {"a": 1}}],
                "keys": ["[go]"]
            })
        );
    }

    #[test]
    fn test_raw_sources_survive() {
        let model = ConfigurationModel::new(
            ValueTree::new(),
            Vec::new(),
            Vec::new(),
            Some(vec![RawSource::Object(
                json!({"hidden": true}).as_object().unwrap().clone(),
            )]),
        );
        let restored = ConfigurationModel::from_data(model.to_data());
        assert_eq!(
            restored.raw_configuration().get_value(Some("hidden")),
            Some(json!(true))
        );
    }
}
