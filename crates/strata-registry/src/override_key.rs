//! Override-key syntax
//!
//! A top-level configuration key made only of bracketed identifiers, such
//! as `[markdown]` or `[javascript][typescript]`, scopes its contents to
//! those identifiers.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a key made of one or more `[identifier]` segments and nothing else.
pub static OVERRIDE_PROPERTY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\[([^\]]+)\])+$").unwrap());

/// Matches a single `[identifier]` segment.
static OVERRIDE_IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// Check whether `key` is an override key.
///
/// # Examples
///
/// ```
/// use strata_registry::override_key::is_override_key;
///
/// assert!(is_override_key("[markdown]"));
/// assert!(is_override_key("[javascript][typescript]"));
/// assert!(!is_override_key("editor.wordWrap"));
/// assert!(!is_override_key("[markdown].editor"));
/// ```
pub fn is_override_key(key: &str) -> bool {
    OVERRIDE_PROPERTY_REGEX.is_match(key)
}

/// Extract the identifiers from an override key.
///
/// Identifiers are trimmed, empty ones are dropped and duplicates keep
/// their first position. Keys that are not override keys yield nothing.
///
/// # Examples
///
/// ```
/// use strata_registry::override_key::override_identifiers_from_key;
///
/// assert_eq!(
///     override_identifiers_from_key("[ javascript ][typescript][javascript]"),
///     vec!["javascript", "typescript"]
/// );
/// assert!(override_identifiers_from_key("editor").is_empty());
/// ```
pub fn override_identifiers_from_key(key: &str) -> Vec<String> {
    let mut identifiers: Vec<String> = Vec::new();
    if !is_override_key(key) {
        return identifiers;
    }

    for captures in OVERRIDE_IDENTIFIER_REGEX.captures_iter(key) {
        let identifier = captures[1].trim();
        if !identifier.is_empty() && !identifiers.iter().any(|i| i == identifier) {
            identifiers.push(identifier.to_string());
        }
    }
    identifiers
}

/// Build the override key for a list of identifiers.
pub fn key_from_override_identifiers<S: AsRef<str>>(identifiers: &[S]) -> String {
    identifiers
        .iter()
        .map(|identifier| format!("[{}]", identifier.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_identifier() {
        assert_eq!(override_identifiers_from_key("[markdown]"), vec!["markdown"]);
    }

    #[test]
    fn test_rejects_partial_matches() {
        assert!(!is_override_key("x[markdown]"));
        assert!(!is_override_key("[markdown]x"));
        assert!(!is_override_key("[]"));
        assert!(!is_override_key("[a[b]]"));
    }

    #[test]
    fn test_key_round_trip() {
        let identifiers = vec!["go".to_string(), "rust".to_string()];
        let key = key_from_override_identifiers(&identifiers);
        assert_eq!(key, "[go][rust]");
        assert_eq!(override_identifiers_from_key(&key), identifiers);
    }

    #[test]
    fn test_whitespace_only_identifier_is_dropped() {
        assert_eq!(override_identifiers_from_key("[ ][rust]"), vec!["rust"]);
    }
}
