//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Strata - Resolve layered settings files
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub layers: LayerArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings files making up the configuration, lowest precedence first.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerArgs {
    /// Property schemas: a JSON object of key to schema
    #[arg(long, global = true, env = "STRATA_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Default values, on top of schema defaults
    #[arg(long, global = true)]
    pub defaults: Option<PathBuf>,

    /// Policy values keyed by policy name (requires --schema)
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    /// Application settings
    #[arg(long, global = true)]
    pub application: Option<PathBuf>,

    /// User settings [default: <config dir>/strata/settings.json]
    #[arg(long, global = true, env = "STRATA_USER_SETTINGS")]
    pub user: Option<PathBuf>,

    /// Remote user settings
    #[arg(long, global = true)]
    pub remote_user: Option<PathBuf>,

    /// Workspace settings
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// A workspace folder and its settings file, as FOLDER=FILE
    #[arg(long = "folder", global = true, value_parser = parse_folder)]
    pub folders: Vec<(String, PathBuf)>,
}

/// Parse a `FOLDER=FILE` pair.
pub fn parse_folder(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((folder, file)) if !folder.is_empty() && !file.is_empty() => {
            Ok((folder.to_string(), PathBuf::from(file)))
        }
        _ => Err(format!("expected FOLDER=FILE, got '{value}'")),
    }
}

/// Query scope shared by value commands.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeArgs {
    /// Resolve for a resource inside a workspace folder
    #[arg(short, long)]
    pub resource: Option<String>,

    /// Resolve with a language's overrides applied
    #[arg(short, long)]
    pub language: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the resolved value of a section
    ///
    /// Examples:
    ///   strata get                          # Everything
    ///   strata get editor                   # One section
    ///   strata get editor.tabSize -l rust   # With Rust overrides
    Get {
        /// Dotted section; omit for the whole configuration
        section: Option<String>,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show how a key resolves across every layer
    Inspect {
        /// Dotted key to inspect
        key: String,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List the keys each layer defines
    Keys {
        /// List folder keys for this resource
        #[arg(short, long)]
        resource: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Compare two settings files
    Diff {
        /// The old settings file
        old: PathBuf,

        /// The new settings file
        new: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from(["strata"]);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
        assert_eq!(cli.layers.user, None);
    }

    #[test]
    fn parse_verbose_flag() {
        let cli = Cli::parse_from(["strata", "-v", "keys"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_get_command() {
        let cli = Cli::parse_from(["strata", "get", "editor", "-l", "rust", "--json"]);
        match cli.command {
            Some(Commands::Get {
                section,
                scope,
                json,
            }) => {
                assert_eq!(section.as_deref(), Some("editor"));
                assert_eq!(scope.language.as_deref(), Some("rust"));
                assert!(json);
            }
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn parse_layer_files_after_command() {
        let cli = Cli::parse_from([
            "strata",
            "inspect",
            "editor.tabSize",
            "--user",
            "user.json",
            "--folder",
            "/work=folder.json",
        ]);
        assert_eq!(cli.layers.user, Some(PathBuf::from("user.json")));
        assert_eq!(
            cli.layers.folders,
            vec![("/work".to_string(), PathBuf::from("folder.json"))]
        );
    }

    #[test]
    fn parse_diff_command() {
        let cli = Cli::parse_from(["strata", "diff", "old.json", "new.json"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Diff { old, new, json: false })
                if old == PathBuf::from("old.json") && new == PathBuf::from("new.json")
        ));
    }

    #[test]
    fn folder_requires_separator() {
        assert!(parse_folder("/work").is_err());
        assert!(parse_folder("=file.json").is_err());
        assert_eq!(
            parse_folder("/work=a=b.json"),
            Ok(("/work".to_string(), PathBuf::from("a=b.json")))
        );
    }
}
