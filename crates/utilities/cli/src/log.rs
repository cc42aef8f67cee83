//! Logging arguments and tracing subscriber setup.

use crate::{CliError, CliResult};
use clap::Args;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logging arguments shared by every command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity level (0-5).
    ///
    /// Each `-v` raises the level by one, starting from ERROR. A `RUST_LOG` filter, when set,
    /// takes precedence.
    #[arg(short = 'v', long = "verbosity", global = true, action = clap::ArgAction::Count)]
    pub v: u8,
}

impl LogArgs {
    /// Installs the global tracing subscriber.
    pub fn init_tracing(&self) -> CliResult<()> {
        init_tracing_subscriber(self.v, None)
    }
}

/// Maps a `-v` count to a maximum level. Zero is errors only, four and above is TRACE.
pub const fn verbosity_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs a fmt subscriber filtered by `RUST_LOG`, by `filter`, or by `verbosity`, in that
/// order of precedence.
pub fn init_tracing_subscriber(verbosity: u8, filter: Option<EnvFilter>) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or(filter)
        .unwrap_or_else(|| EnvFilter::new(verbosity_level(verbosity).as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .map_err(|err| CliError::TracingInitialization(err.to_string()))
}
