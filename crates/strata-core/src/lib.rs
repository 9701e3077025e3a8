//! Layered configuration resolution for Strata
//!
//! This crate combines the models of `strata-model` into one queryable
//! [`Configuration`]:
//!
//! - **Layering**: default, policy, application, user (local and remote),
//!   workspace, folder and in-memory layers
//! - **Resolution**: values for a section, scoped by resource and override
//!   identifier, with policy values always winning
//! - **Change tracking**: compare-and-update per layer and
//!   [`ConfigurationChangeEvent`] for deciding who needs to react
//! - **Loading**: settings files and cached folder settings
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use strata_core::{Configuration, ConfigurationOverrides};
//! use strata_model::ConfigurationModel;
//!
//! let mut defaults = ConfigurationModel::empty();
//! defaults.set_value("editor.tabSize", json!(4));
//! let mut configuration = Configuration::new(defaults);
//!
//! let global = ConfigurationOverrides::default();
//! configuration.update_value("editor.tabSize", Some(json!(2)), &global);
//! assert_eq!(configuration.get_value(Some("editor.tabSize"), &global, None), Some(json!(2)));
//! ```

pub mod cache;
pub mod configuration;
mod consolidation;
pub mod error;
pub mod event;
pub mod inspect;
pub mod logging;
pub mod resource;
pub mod section;
pub mod settings;
pub mod snapshot;
pub mod workspace;

pub use cache::{
    CacheKey, CacheKind, CachedFolderSettings, ConfigurationCache, InMemoryConfigurationCache,
};
pub use configuration::{
    Configuration, ConfigurationKeys, ConfigurationLayers, ConfigurationOverrides, Layer,
};
pub use error::{Error, Result};
pub use event::{ConfigurationChangeEvent, PreviousConfiguration};
pub use inspect::ConfigurationInspectValue;
pub use resource::Resource;
pub use section::SectionView;
pub use settings::{
    APPLY_TO_ALL_PROFILES_SETTING, ApplicationSettings, SettingsFile, default_user_settings_path,
};
pub use snapshot::ConfigurationData;
pub use workspace::{Workspace, WorkspaceFolder};
