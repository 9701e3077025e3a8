//! Inspect command implementation
//!
//! Shows each layer's contribution to a key, lowest precedence first.

use colored::Colorize;
use serde_json::{Map, Value, json};

use strata_core::Layer;

use crate::cli::ScopeArgs;
use crate::context::CliContext;
use crate::error::Result;

use super::render_value;

/// Run the inspect command
pub fn run_inspect(context: &CliContext, key: &str, scope: &ScopeArgs, json: bool) -> Result<()> {
    let overrides = CliContext::overrides(scope);
    let inspected = context
        .configuration
        .inspect(key, &overrides, context.workspace.as_ref());

    if json {
        let mut layers = Map::new();
        for layer in Layer::ALL {
            if let Some(value) = inspected.layer(layer) {
                layers.insert(layer.to_string(), serde_json::to_value(value)?);
            }
        }
        let output = json!({
            "key": inspected.key(),
            "value": inspected.value(),
            "overrideIdentifier": inspected.override_identifier(),
            "overrideIdentifiers": inspected.override_identifiers(),
            "layers": layers,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", inspected.key().cyan().bold());
    match inspected.value() {
        Some(value) => println!("  {} {}", "value:".bold(), render_value(value)),
        None => println!("  {} {}", "value:".bold(), "not set".yellow()),
    }
    if let Some(identifier) = inspected.override_identifier() {
        println!("  {} {}", "language:".bold(), identifier);
    }

    for layer in Layer::ALL {
        let Some(value) = inspected.layer(layer) else {
            continue;
        };
        let marker = if inspected.layer_value(layer) == inspected.value() {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!("{} {:<16} {}", marker, layer.as_str(), describe(value.value.as_ref()));
        if let Some(override_value) = &value.override_value {
            println!("  {:<16} {}", "", format!("override: {}", render_value(override_value)).as_str().dimmed());
        }
    }

    if let Some(identifiers) = inspected.override_identifiers() {
        println!("  {} {}", "overridden for:".bold(), identifiers.join(", "));
    }
    Ok(())
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(value) => render_value(value),
        None => "-".dimmed().to_string(),
    }
}
