//! TsuzuFmt CLI
//!
//! Line-range aware source formatter.

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;
use tsuzufmt_core::ExitStatus;

use cli::{Cli, Commands};
use commands::config::run_config;
use commands::format::run_format;
use commands::init::run_init;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else if cli.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(ExitStatus::Success) => ExitCode::SUCCESS,
        Ok(ExitStatus::DiffFound) => ExitCode::from(1),
        Ok(ExitStatus::Failure) => ExitCode::from(2),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitStatus> {
    match &cli.command {
        Commands::Format(args) => run_format(cli, args),
        Commands::Config { default } => {
            run_config(cli, *default)?;
            Ok(ExitStatus::Success)
        }
        Commands::Init { force } => {
            let cwd = std::env::current_dir().into_diagnostic()?;
            run_init(&cwd, *force)?;
            Ok(ExitStatus::Success)
        }
    }
}
