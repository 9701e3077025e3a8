//! Log output for strata hosts

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Error, Result};

/// Install the global subscriber.
///
/// Logs go to stderr so they never mix with resolved values on stdout.
/// `RUST_LOG` wins when set; otherwise strata crates log at `debug` when
/// `verbose` and at `warn` when not.
pub fn init(verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(verbose)).map_err(logging_error)?,
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(logging_error)?;

    tracing::debug!("Verbose logging enabled");
    Ok(())
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,strata_core=debug,strata_model=debug,strata_registry=debug,strata=debug"
    } else {
        "warn"
    }
}

fn logging_error(err: impl std::fmt::Display) -> Error {
    Error::Logging {
        message: err.to_string(),
    }
}
