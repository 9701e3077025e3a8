//! Diff command implementation
//!
//! Compares two settings files key by key.

use colored::Colorize;

use strata_model::{ParseOptions, compare};

use crate::context::{CliContext, load_file};
use crate::error::Result;
use std::path::Path;

/// Run the diff command
pub fn run_diff(context: &CliContext, old: &Path, new: &Path, json: bool) -> Result<()> {
    let from = load_file(old, ParseOptions::default(), &context.registry);
    let to = load_file(new, ParseOptions::default(), &context.registry);
    let result = compare(Some(&from), Some(&to));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.is_empty() {
        println!("{} No differences", "OK".green().bold());
        return Ok(());
    }

    for key in &result.added {
        println!("{} {}", "+".green().bold(), key);
    }
    for key in &result.updated {
        println!("{} {}", "~".yellow().bold(), key);
    }
    for key in &result.removed {
        println!("{} {}", "-".red().bold(), key);
    }
    for (identifier, keys) in &result.overrides {
        println!("{} [{}]: {}", "~".yellow().bold(), identifier, keys.join(", "));
    }
    println!(
        "\n{} added, {} updated, {} removed",
        result.added.len(),
        result.updated.len(),
        result.removed.len()
    );
    Ok(())
}
