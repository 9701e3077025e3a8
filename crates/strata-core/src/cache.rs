//! Configuration cache contract
//!
//! Hosts cache the settings of remote folders so a workspace can open
//! before those folders are reachable. The cache stores opaque strings;
//! [`CachedFolderSettings`] decides what goes in them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use strata_model::{ConfigurationModel, ConfigurationModelParser, ParseOptions};
use strata_registry::{ConfigurationRegistry, FOLDER_SCOPES};

use crate::error::{Error, Result};
use crate::resource::Resource;

/// Name under which folder settings are stored in a cache entry.
const FOLDER_SETTINGS_NAME: &str = "settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheKind {
    Defaults,
    Workspaces,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub key: String,
}

impl CacheKey {
    /// The key of a folder's cached settings.
    pub fn for_folder(folder: &Resource) -> Self {
        let digest = Sha256::digest(folder.as_str().as_bytes());
        Self {
            kind: CacheKind::Folder,
            key: format!("{:x}", digest),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.kind, self.key)
    }
}

/// Storage for cached configuration contents.
pub trait ConfigurationCache {
    /// Read an entry; `Ok(None)` when nothing is cached.
    fn read(&self, key: &CacheKey) -> Result<Option<String>>;

    fn write(&self, key: &CacheKey, content: &str) -> Result<()>;

    fn remove(&self, key: &CacheKey) -> Result<()>;
}

/// A cache that lives as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryConfigurationCache {
    entries: Mutex<HashMap<CacheKey, String>>,
}

impl InMemoryConfigurationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigurationCache for InMemoryConfigurationCache {
    fn read(&self, key: &CacheKey) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &CacheKey, content: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.clone(), content.to_string());
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Folder settings served from a [`ConfigurationCache`].
///
/// Entries have the shape `{"content": {"settings": "<settings text>"}}`.
#[derive(Debug)]
pub struct CachedFolderSettings {
    key: CacheKey,
    options: ParseOptions,
    parser: ConfigurationModelParser,
}

impl CachedFolderSettings {
    pub fn new(folder: &Resource) -> Self {
        Self::with_options(folder, ParseOptions::new().with_scopes(FOLDER_SCOPES))
    }

    pub fn with_options(folder: &Resource, options: ParseOptions) -> Self {
        Self {
            key: CacheKey::for_folder(folder),
            options,
            parser: ConfigurationModelParser::new(folder.as_str()),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Parse the cached settings. An empty or unreadable entry yields an
    /// empty model.
    pub fn load(
        &mut self,
        cache: &dyn ConfigurationCache,
        registry: &ConfigurationRegistry,
    ) -> ConfigurationModel {
        match self.read_settings(cache) {
            Ok(Some(settings)) => {
                self.parser.parse(&settings, &self.options, registry);
                tracing::debug!(key = %self.key, "Loaded cached folder settings");
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(key = %self.key, error = %err, "Ignoring cached folder settings"),
        }
        self.parser.configuration_model().clone()
    }

    fn read_settings(&self, cache: &dyn ConfigurationCache) -> Result<Option<String>> {
        let Some(entry) = cache.read(&self.key)? else {
            return Ok(None);
        };
        let entry: Value = serde_json::from_str(&entry)?;
        match entry.get("content") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(content)) => Ok(content
                .get(FOLDER_SETTINGS_NAME)
                .and_then(Value::as_str)
                .map(str::to_string)),
            Some(other) => Err(Error::Cache {
                key: self.key.to_string(),
                message: format!("expected an object as content, found {}", other),
            }),
        }
    }

    /// Store the latest settings text, or drop the entry when there is none.
    pub fn update(&self, settings: Option<&str>, cache: &dyn ConfigurationCache) -> Result<()> {
        let mut content = Map::new();
        if let Some(settings) = settings.filter(|s| !s.is_empty()) {
            content.insert(FOLDER_SETTINGS_NAME.to_string(), Value::from(settings));
        }
        if content.is_empty() {
            return cache.remove(&self.key);
        }
        cache.write(&self.key, &serde_json::to_string(&json!({ "content": content }))?)
    }

    pub fn reparse(
        &mut self,
        options: Option<ParseOptions>,
        registry: &ConfigurationRegistry,
    ) -> ConfigurationModel {
        if let Some(options) = options {
            self.options = options;
        }
        self.parser.reparse(&self.options, registry);
        self.parser.configuration_model().clone()
    }
}
