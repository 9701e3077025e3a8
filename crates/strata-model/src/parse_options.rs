//! Filtering options applied while parsing a configuration source

use serde::{Deserialize, Serialize};
use strata_registry::ConfigurationScope;

/// Which properties a parsed layer keeps.
///
/// Loads from camelCase JSON so hosts can keep the options next to their
/// own settings:
///
/// ```
/// use strata_model::ParseOptions;
/// use strata_registry::ConfigurationScope;
///
/// let options: ParseOptions = serde_json::from_str(
///     r#"{"scopes": ["resource"], "skipRestricted": true}"#,
/// ).unwrap();
///
/// assert_eq!(options.scopes, Some(vec![ConfigurationScope::Resource]));
/// assert!(options.skip_restricted);
/// assert!(options.requires_filtering());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Keep only properties registered with one of these scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<ConfigurationScope>>,

    /// Drop properties marked restricted
    pub skip_restricted: bool,

    /// Drop properties the registry does not know
    pub skip_unregistered: bool,

    /// Always keep these keys
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Always drop these keys
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scopes(mut self, scopes: &[ConfigurationScope]) -> Self {
        self.scopes = Some(scopes.to_vec());
        self
    }

    pub fn skip_restricted(mut self, skip: bool) -> Self {
        self.skip_restricted = skip;
        self
    }

    pub fn skip_unregistered(mut self, skip: bool) -> Self {
        self.skip_unregistered = skip;
        self
    }

    pub fn with_include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Whether any option asks for properties to be dropped.
    ///
    /// `include` alone never drops anything.
    pub fn requires_filtering(&self) -> bool {
        self.scopes.is_some() || self.skip_restricted || self.skip_unregistered || !self.exclude.is_empty()
    }
}
