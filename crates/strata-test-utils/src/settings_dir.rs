//! [`SettingsDir`] for tests that read settings files from disk.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding settings files.
///
/// # Example
///
/// ```rust,no_run
/// use strata_test_utils::settings_dir::SettingsDir;
///
/// let dir = SettingsDir::new();
/// let user = dir.write("user.json", r#"{"editor.tabSize": 2}"#);
/// dir.assert_file_contains("user.json", "tabSize");
/// ```
pub struct SettingsDir {
    temp_dir: TempDir,
}

impl Default for SettingsDir {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Full path of `name` inside the directory, whether or not it exists.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Write `content` to `name`, creating parent directories.
    ///
    /// # Panics
    /// Panics if the filesystem operations fail.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("SettingsDir::write: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("SettingsDir::write: failed to write {}: {e}", path.display()));
        path
    }

    /// Write a JSON value pretty-printed.
    pub fn write_json(&self, name: &str, value: &serde_json::Value) -> PathBuf {
        let content = serde_json::to_string_pretty(value).unwrap();
        self.write(name, &content)
    }

    /// Assert that the file at `name` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, name: &str, content: &str) {
        let full_path = self.path(name);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
