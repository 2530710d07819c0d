//! streamgate binary entry point
//!
//! Dispatches CLI commands to the backend services. Logging goes to stderr
//! so JSON output on stdout stays machine-parseable.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use streamgate::cli::{Cli, Command, ExitCode, Output};
use streamgate::commands;
use streamgate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streamgate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        Command::Serve(cmd) => commands::serve_cmd(cmd, &config, &output).await,

        Command::Resolve(cmd) => commands::resolve_cmd(cmd, &config, &output).await,

        Command::Catalog(cmd) => commands::catalog_cmd(cmd, &config, &output).await,

        Command::Probe(cmd) => commands::probe_cmd(cmd, &config, &output).await,

        Command::Stats(cmd) => commands::stats_cmd(cmd, &config, &output).await,
    }
}
