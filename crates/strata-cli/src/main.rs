//! Strata CLI
//!
//! Resolves settings files layered the way an editor layers them.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::CliContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = strata_core::logging::init(cli.verbose) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    match cli.command {
        Some(cmd) => {
            let context = CliContext::load(&cli.layers)?;
            execute_command(&context, cmd)
        }
        None => {
            println!("{} Layered settings resolver", "strata".green().bold());
            println!();
            println!("Run {} for available commands.", "strata --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(context: &CliContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Get {
            section,
            scope,
            json,
        } => commands::run_get(context, section.as_deref(), &scope, json),
        Commands::Inspect { key, scope, json } => commands::run_inspect(context, &key, &scope, json),
        Commands::Keys { resource, json } => commands::run_keys(context, resource.as_deref(), json),
        Commands::Diff { old, new, json } => commands::run_diff(context, &old, &new, json),
    }
}
