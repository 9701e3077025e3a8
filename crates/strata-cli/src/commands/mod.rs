//! Command implementations for strata-cli

pub mod diff;
pub mod get;
pub mod inspect;
pub mod keys;

pub use diff::run_diff;
pub use get::run_get;
pub use inspect::run_inspect;
pub use keys::run_keys;

use serde_json::Value;

/// Render a value for terminal output.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        _ => value.to_string(),
    }
}
