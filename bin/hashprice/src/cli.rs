//! Contains the hashprice CLI.

use crate::{
    commands::{BlocksCommand, OnceCommand, ProfilesCommand, RevenueCommand, RunCommand},
    flags::GlobalArgs,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use hashprice_cli::cli_styles;
use std::future::Future;

/// Subcommands for the CLI.
#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Commands {
    /// Runs the pipeline on a fixed interval until interrupted.
    Run(RunCommand),
    /// Runs the pipeline once and exits.
    Once(OnceCommand),
    /// Lists or imports hardware profiles.
    #[command(subcommand)]
    Profiles(ProfilesCommand),
    /// Prints the revenue allocations of one profile as JSON lines.
    Revenue(RevenueCommand),
    /// Prints the committed blocks and their prices as JSON lines.
    Blocks(BlocksCommand),
}

/// The hashprice CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub(crate) struct Cli {
    /// Global arguments for the CLI.
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    /// The subcommand to run.
    #[command(subcommand)]
    pub(crate) subcommand: Commands,
}

impl Cli {
    /// Runs the CLI.
    pub(crate) fn run(self) -> Result<()> {
        self.global.log_args.init_tracing()?;
        if self.global.metrics.init_metrics()? {
            hashprice_pipeline::Metrics::init();
        }

        let global = self.global;
        match self.subcommand {
            Commands::Run(cmd) => Self::block_on(cmd.run(&global)),
            Commands::Once(cmd) => Self::block_on(cmd.run(&global)),
            Commands::Profiles(cmd) => cmd.run(&global),
            Commands::Revenue(cmd) => cmd.run(&global),
            Commands::Blocks(cmd) => cmd.run(&global),
        }
    }

    /// Runs `fut` on a fresh runtime.
    fn block_on<F>(fut: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        Self::tokio_runtime()?.block_on(fut)
    }

    /// Creates a new default tokio multi-thread runtime with all features enabled.
    fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
        tokio::runtime::Builder::new_multi_thread().enable_all().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_subcommand(&["hashprice"])]
    #[case::revenue_without_profile(&["hashprice", "revenue"])]
    #[case::negative_start_height(&["hashprice", "once", "--start-height", "-1"])]
    #[case::unknown_profiles_action(&["hashprice", "profiles", "delete"])]
    fn test_rejects_invalid_invocations(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "hashprice",
            "-vv",
            "--db.path",
            "/tmp/hashprice",
            "run",
            "--chain.rpc-url",
            "http://node:8332",
            "--start-height",
            "840000",
            "--interval",
            "60",
        ])
        .unwrap();
        assert_eq!(cli.global.log_args.v, 2);
        let Commands::Run(cmd) = cli.subcommand else { panic!("expected run") };
        assert_eq!(cmd.interval, 60);
        assert_eq!(cmd.pipeline.start_height, Some(840_000));
        assert_eq!(cmd.pipeline.chain.rpc_url.as_str(), "http://node:8332/");
    }

    #[test]
    fn test_parse_profiles_import() {
        let cli = Cli::try_parse_from(["hashprice", "profiles", "import", "rigs.toml"]).unwrap();
        assert!(matches!(cli.subcommand, Commands::Profiles(ProfilesCommand::Import { .. })));
    }

    #[test]
    fn test_parse_revenue() {
        let cli = Cli::try_parse_from([
            "hashprice", "revenue", "--profile", "s21_pro", "--from", "10", "--to", "20",
        ])
        .unwrap();
        let Commands::Revenue(cmd) = cli.subcommand else { panic!("expected revenue") };
        assert_eq!(cmd.profile, "s21_pro");
        assert_eq!((cmd.range.from, cmd.range.to), (10, 20));
    }
}
