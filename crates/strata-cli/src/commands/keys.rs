//! Keys command implementation
//!
//! Lists the keys defined by each layer.

use colored::Colorize;

use strata_core::Resource;

use crate::context::CliContext;
use crate::error::Result;

/// Run the keys command
pub fn run_keys(context: &CliContext, resource: Option<&str>, json: bool) -> Result<()> {
    let resource = resource.map(Resource::from);
    let keys = context
        .configuration
        .keys(resource.as_ref(), context.workspace.as_ref());

    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    let sections = [
        ("default", &keys.default),
        ("policy", &keys.policy),
        ("user", &keys.user),
        ("workspace", &keys.workspace),
        ("workspaceFolder", &keys.workspace_folder),
    ];
    for (layer, keys) in sections {
        println!("{} ({})", layer.bold(), keys.len());
        for key in keys {
            println!("  {}", key);
        }
    }
    Ok(())
}
