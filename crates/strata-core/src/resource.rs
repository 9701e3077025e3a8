//! Resource identifiers with normalized separators

use serde::{Deserialize, Serialize};

/// A resource location normalized to forward slashes.
///
/// Resources identify workspace folders and the files inside them.
/// Trailing separators are dropped so `/work/` and `/work` are the same
/// resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Resource {
    /// Always uses forward slashes, never ends with one unless it is the root
    inner: String,
}

impl Resource {
    fn normalize(path: &str) -> Self {
        let normalized = path.replace('\\', "/");
        let trimmed = normalized.trim_end_matches('/');
        let inner = if trimmed.is_empty() && normalized.starts_with('/') {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        Self { inner }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// The last segment, used as a folder's display name.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Whether `other` is this resource or lies beneath it.
    ///
    /// Matching is by whole segments: `/work` contains `/work/a` but not
    /// `/workspace`.
    pub fn is_equal_or_parent(&self, other: &Resource) -> bool {
        if self.inner == other.inner {
            return true;
        }
        if self.inner == "/" {
            return other.inner.starts_with('/');
        }
        other
            .inner
            .strip_prefix(&self.inner)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for Resource {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl From<String> for Resource {
    fn from(s: String) -> Self {
        Self::normalize(&s)
    }
}

impl From<Resource> for String {
    fn from(resource: Resource) -> Self {
        resource.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/work/app/", "/work/app")]
    #[case("C:\\work\\app", "C:/work/app")]
    #[case("/", "/")]
    #[case("relative/dir", "relative/dir")]
    fn test_normalization(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(Resource::from(input).as_str(), expected);
    }

    #[rstest]
    #[case("/work", "/work", true)]
    #[case("/work", "/work/src/main.rs", true)]
    #[case("/work", "/workspace/file", false)]
    #[case("/work/src", "/work", false)]
    #[case("/", "/anything", true)]
    fn test_is_equal_or_parent(#[case] folder: &str, #[case] resource: &str, #[case] expected: bool) {
        assert_eq!(
            Resource::from(folder).is_equal_or_parent(&Resource::from(resource)),
            expected
        );
    }

    #[rstest]
    #[case("/work/src/lib.rs", Some("lib.rs"))]
    #[case("C:\\work\\app\\", Some("app"))]
    #[case("/", None)]
    fn test_file_name(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(Resource::from(input).file_name(), expected);
    }

    #[test]
    fn test_serializes_as_string() {
        let resource = Resource::from("/work/app");
        let json = serde_json::to_string(&resource).unwrap();
        assert_eq!(json, "\"/work/app\"");
        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resource);
    }
}
