//! localgate CLI - runs a suite file's instances concurrently.
//!
//! ```text
//! main() -> load config + suite -> LocalAwareRunner<CommandRunner> -> run_suite()
//!                                        |
//!                                        v
//!                          one task per instance; localhost instances
//!                          take turns on the process-wide lock
//! ```

mod args;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use localgate_config::{LocalgateConfig, Suite};
use localgate_core::{CommandRunner, LocalAwareRunner, SuiteOutcome, run_suite};

use localgate_types::DestroyPolicy;

use args::{Cli, Command};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries the per-instance report; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Run {
            suite,
            config,
            destroy,
        } => run_command(suite, config, destroy).await,
    }
}

async fn run_command(
    suite: PathBuf,
    config: Option<PathBuf>,
    destroy: DestroyPolicy,
) -> Result<ExitCode> {
    let config = match &config {
        Some(path) => LocalgateConfig::load_from(path)?,
        None => LocalgateConfig::load()?.unwrap_or_default(),
    };

    let entries = Suite::load_from(&suite)?
        .into_entries()
        .with_context(|| format!("invalid suite {}", suite.display()))?;
    tracing::info!(
        suite = %suite.display(),
        instances = entries.len(),
        %destroy,
        "starting suite"
    );

    let mut base = CommandRunner::new(config.shell.clone())
        .with_transport_config(config.transport.clone().unwrap_or_default());
    let mut instances = Vec::with_capacity(entries.len());
    for entry in entries {
        base = base.with_commands(entry.instance.name.clone(), entry.commands);
        instances.push(entry.instance);
    }

    let mut runner = LocalAwareRunner::new(base);
    if let Some(after) = config.wait_warning() {
        runner = runner.with_wait_warning(after);
    }

    let outcomes = run_suite(Arc::new(runner), instances, destroy).await;
    let failed = print_report(&outcomes);
    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(failed, total = outcomes.len(), "suite finished with failures");
        Ok(ExitCode::FAILURE)
    }
}

/// Print one line per instance; returns how many failed.
fn print_report(outcomes: &[SuiteOutcome]) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                let fate = if report.destroyed { "destroyed" } else { "kept" };
                println!(
                    "-----> {} passed ({} command(s) via {}, {fate})",
                    outcome.instance,
                    report.outputs.len(),
                    report.transport
                );
            }
            Err(err) => {
                failed += 1;
                println!("-----> {} failed: {err}", outcome.instance);
            }
        }
    }
    failed
}
