//! Get command implementation
//!
//! Prints the value a section resolves to.

use colored::Colorize;
use serde_json::json;

use crate::cli::ScopeArgs;
use crate::context::CliContext;
use crate::error::Result;

use super::render_value;

/// Run the get command
pub fn run_get(context: &CliContext, section: Option<&str>, scope: &ScopeArgs, json: bool) -> Result<()> {
    let overrides = CliContext::overrides(scope);
    let value = context
        .configuration
        .get_value(section, &overrides, context.workspace.as_ref());

    if json {
        let output = json!({
            "section": section,
            "value": value,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let label = section.unwrap_or("<all>");
    match value {
        Some(value) => println!("{} = {}", label.cyan().bold(), render_value(&value)),
        None => println!("{} is {}", label.cyan().bold(), "not set".yellow()),
    }
    Ok(())
}
