//! Command-line parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use localgate_types::DestroyPolicy;

#[derive(Debug, Parser)]
#[command(name = "localgate", version)]
#[command(about = "Run test suites with local-machine instances serialized through one gate")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run every instance in a suite file
    Run {
        /// Suite file listing `[[instance]]` tables
        suite: PathBuf,
        /// Config file to use instead of ~/.localgate/config.toml
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// When to destroy an instance: always, passing or never
        #[arg(long, short, default_value = "passing")]
        destroy: DestroyPolicy,
    },
}
