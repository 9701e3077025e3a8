//! Per-layer breakdown of a resolved key

use serde_json::Value;
use std::cell::OnceCell;
use std::sync::Arc;

use strata_model::{ConfigurationModel, InspectValue};

use crate::configuration::Layer;

/// The layers an inspection reads from. `None` marks a layer that does not
/// apply to the query.
pub(crate) struct InspectedLayers {
    pub(crate) default: Arc<ConfigurationModel>,
    pub(crate) policy: Option<Arc<ConfigurationModel>>,
    pub(crate) application: Option<Arc<ConfigurationModel>>,
    pub(crate) user: Arc<ConfigurationModel>,
    pub(crate) user_local: Arc<ConfigurationModel>,
    pub(crate) user_remote: Arc<ConfigurationModel>,
    pub(crate) workspace: Option<Arc<ConfigurationModel>>,
    pub(crate) workspace_folder: Option<Arc<ConfigurationModel>>,
    pub(crate) memory: Arc<ConfigurationModel>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Default,
    Policy,
    Application,
    User,
    UserLocal,
    UserRemote,
    Workspace,
    WorkspaceFolder,
    Memory,
}

const SLOTS: usize = 9;

impl From<Layer> for Slot {
    fn from(layer: Layer) -> Self {
        match layer {
            Layer::Default => Slot::Default,
            Layer::Policy => Slot::Policy,
            Layer::Application => Slot::Application,
            Layer::UserLocal => Slot::UserLocal,
            Layer::UserRemote => Slot::UserRemote,
            Layer::Workspace => Slot::Workspace,
            Layer::WorkspaceFolder => Slot::WorkspaceFolder,
            Layer::Memory => Slot::Memory,
        }
    }
}

/// How a key resolves, layer by layer.
///
/// Each layer is inspected on first access only. Policy and application
/// layers are inspected without the override identifier.
pub struct ConfigurationInspectValue {
    key: String,
    override_identifier: Option<String>,
    value: Option<Value>,
    override_identifiers: Option<Vec<String>>,
    layers: InspectedLayers,
    inspected: [OnceCell<Option<InspectValue>>; SLOTS],
}

impl ConfigurationInspectValue {
    pub(crate) fn new(
        key: &str,
        override_identifier: Option<String>,
        value: Option<Value>,
        override_identifiers: Option<Vec<String>>,
        layers: InspectedLayers,
    ) -> Self {
        Self {
            key: key.to_string(),
            override_identifier,
            value,
            override_identifiers,
            layers,
            inspected: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn override_identifier(&self) -> Option<&str> {
        self.override_identifier.as_deref()
    }

    /// The value a query with the same arguments resolves to.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Identifiers that have an override for this key.
    pub fn override_identifiers(&self) -> Option<&[String]> {
        self.override_identifiers.as_deref()
    }

    fn model(&self, slot: Slot) -> Option<&Arc<ConfigurationModel>> {
        let layers = &self.layers;
        match slot {
            Slot::Default => Some(&layers.default),
            Slot::Policy => layers.policy.as_ref(),
            Slot::Application => layers.application.as_ref(),
            Slot::User => Some(&layers.user),
            Slot::UserLocal => Some(&layers.user_local),
            Slot::UserRemote => Some(&layers.user_remote),
            Slot::Workspace => layers.workspace.as_ref(),
            Slot::WorkspaceFolder => layers.workspace_folder.as_ref(),
            Slot::Memory => Some(&layers.memory),
        }
    }

    fn inspected(&self, slot: Slot) -> Option<&InspectValue> {
        self.inspected[slot as usize]
            .get_or_init(|| {
                let model = self.model(slot)?;
                let identifier = match slot {
                    Slot::Policy | Slot::Application => None,
                    _ => self.override_identifier.as_deref(),
                };
                Some(model.inspect(&self.key, identifier).to_inspect_value())
            })
            .as_ref()
    }

    fn defined(&self, slot: Slot) -> Option<&InspectValue> {
        self.inspected(slot).filter(|inspected| inspected.is_defined())
    }

    fn merged(&self, slot: Slot) -> Option<&Value> {
        self.inspected(slot)?.merged.as_ref()
    }

    /// The inspection of one layer, if the key is defined there.
    pub fn layer(&self, layer: Layer) -> Option<&InspectValue> {
        self.defined(layer.into())
    }

    /// The effective value of one layer for this query.
    pub fn layer_value(&self, layer: Layer) -> Option<&Value> {
        self.merged(layer.into())
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.merged(Slot::Default)
    }

    pub fn default(&self) -> Option<&InspectValue> {
        self.defined(Slot::Default)
    }

    pub fn policy_value(&self) -> Option<&Value> {
        self.merged(Slot::Policy)
    }

    /// Policies carry plain values only.
    pub fn policy(&self) -> Option<InspectValue> {
        let value = self.inspected(Slot::Policy)?.value.clone()?;
        Some(InspectValue {
            value: Some(value),
            ..Default::default()
        })
    }

    pub fn application_value(&self) -> Option<&Value> {
        self.merged(Slot::Application)
    }

    pub fn application(&self) -> Option<&InspectValue> {
        self.defined(Slot::Application)
    }

    /// Local and remote user settings combined.
    pub fn user_value(&self) -> Option<&Value> {
        self.merged(Slot::User)
    }

    pub fn user(&self) -> Option<&InspectValue> {
        self.defined(Slot::User)
    }

    pub fn user_local_value(&self) -> Option<&Value> {
        self.merged(Slot::UserLocal)
    }

    pub fn user_local(&self) -> Option<&InspectValue> {
        self.defined(Slot::UserLocal)
    }

    pub fn user_remote_value(&self) -> Option<&Value> {
        self.merged(Slot::UserRemote)
    }

    pub fn user_remote(&self) -> Option<&InspectValue> {
        self.defined(Slot::UserRemote)
    }

    pub fn workspace_value(&self) -> Option<&Value> {
        self.merged(Slot::Workspace)
    }

    pub fn workspace(&self) -> Option<&InspectValue> {
        self.defined(Slot::Workspace)
    }

    pub fn workspace_folder_value(&self) -> Option<&Value> {
        self.merged(Slot::WorkspaceFolder)
    }

    pub fn workspace_folder(&self) -> Option<&InspectValue> {
        self.defined(Slot::WorkspaceFolder)
    }

    pub fn memory_value(&self) -> Option<&Value> {
        self.merged(Slot::Memory)
    }

    pub fn memory(&self) -> Option<&InspectValue> {
        self.defined(Slot::Memory)
    }
}

impl std::fmt::Debug for ConfigurationInspectValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationInspectValue")
            .field("key", &self.key)
            .field("override_identifier", &self.override_identifier)
            .field("value", &self.value)
            .field("override_identifiers", &self.override_identifiers)
            .finish_non_exhaustive()
    }
}
