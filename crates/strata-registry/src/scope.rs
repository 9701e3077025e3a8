//! Configuration scopes
//!
//! A scope restricts which layers may define a value for a property.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a configuration property may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigurationScope {
    /// Only in the default profile's user settings
    Application,
    /// Only in local and remote user settings
    Machine,
    /// Only in default profile user settings and remote user settings
    ApplicationMachine,
    /// In user or workspace settings
    #[default]
    Window,
    /// In user, workspace or folder settings
    Resource,
    /// Like `Resource`, and also inside override buckets
    LanguageOverridable,
    /// Like `Machine`, but also in workspace or folder settings
    MachineOverridable,
}

/// Scopes accepted by the application settings layer.
pub const APPLICATION_SCOPES: &[ConfigurationScope] = &[
    ConfigurationScope::Application,
    ConfigurationScope::ApplicationMachine,
];

/// Scopes accepted by the workspace settings layer.
pub const WORKSPACE_SCOPES: &[ConfigurationScope] = &[
    ConfigurationScope::Window,
    ConfigurationScope::Resource,
    ConfigurationScope::LanguageOverridable,
    ConfigurationScope::MachineOverridable,
];

/// Scopes accepted by folder settings.
pub const FOLDER_SCOPES: &[ConfigurationScope] = &[
    ConfigurationScope::Resource,
    ConfigurationScope::LanguageOverridable,
    ConfigurationScope::MachineOverridable,
];

impl ConfigurationScope {
    /// The kebab-case name used in schemas.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Machine => "machine",
            Self::ApplicationMachine => "application-machine",
            Self::Window => "window",
            Self::Resource => "resource",
            Self::LanguageOverridable => "language-overridable",
            Self::MachineOverridable => "machine-overridable",
        }
    }
}

impl fmt::Display for ConfigurationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a scope name, falling back to [`ConfigurationScope::Window`].
pub fn parse_scope(scope: &str) -> ConfigurationScope {
    match scope {
        "application" => ConfigurationScope::Application,
        "machine" => ConfigurationScope::Machine,
        "application-machine" => ConfigurationScope::ApplicationMachine,
        "resource" => ConfigurationScope::Resource,
        "machine-overridable" => ConfigurationScope::MachineOverridable,
        "language-overridable" => ConfigurationScope::LanguageOverridable,
        _ => ConfigurationScope::Window,
    }
}
