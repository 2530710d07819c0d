//! CLI - Command Line Interface for streamgate
//!
//! Designed for automation: every operation is scriptable and all output is
//! JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Run the egress relay
//! streamgate serve --bind 0.0.0.0:3030
//!
//! # Resolve an embed page to a playable URL
//! streamgate resolve https://upstream.example/embed/tt1877830
//!
//! # Inspect the failover catalog for a title
//! streamgate catalog tt1877830
//! streamgate probe tt1877830
//!
//! # Viewing-history dashboard
//! streamgate stats --json
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// No playable URL / no catalog entries
    NoSources = 4,
    /// Content not available at all
    Unavailable = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// streamgate - streaming-source resolver, failover engine and egress relay
#[derive(Parser, Debug)]
#[command(
    name = "streamgate",
    version,
    about = "Resilient streaming-source resolver and egress relay",
    after_help = "EXAMPLES:\n\
                  streamgate serve                       Run the egress relay\n\
                  streamgate resolve <embed-url>         Extract a playable URL\n\
                  streamgate probe tt1877830             Dry-run the failover catalog\n\
                  streamgate stats --json                Watch-history dashboard"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the egress relay server
    Serve(ServeCmd),

    /// Resolve an embed page URL to a playable media URL
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),

    /// Build and print the failover catalog for a title
    #[command(visible_alias = "cat")]
    Catalog(CatalogCmd),

    /// Dry-run resolution for every catalog entry of a title
    Probe(ProbeCmd),

    /// Aggregate the viewing-history log into dashboard stats
    Stats(StatsCmd),
}

/// Run the egress relay server
#[derive(Args, Debug)]
pub struct ServeCmd {
    /// Bind address (host:port); overrides config
    #[arg(long, short = 'b')]
    pub bind: Option<String>,
}

/// Resolve one embed page to a playable media URL
#[derive(Args, Debug)]
pub struct ResolveCmd {
    /// Embed page URL
    #[arg(required = true)]
    pub url: String,

    /// Relay base URL to fetch through; an in-process relay is spun up
    /// on an ephemeral port when omitted
    #[arg(long)]
    pub relay: Option<String>,
}

/// Build the failover catalog for a title id
#[derive(Args, Debug)]
pub struct CatalogCmd {
    /// Title id substituted into the configured slot templates
    #[arg(required = true)]
    pub title_id: String,
}

/// Attempt resolution for every catalog entry
#[derive(Args, Debug)]
pub struct ProbeCmd {
    /// Title id substituted into the configured slot templates
    #[arg(required = true)]
    pub title_id: String,
}

/// Aggregate the viewing-history log
#[derive(Args, Debug)]
pub struct StatsCmd {
    /// History log path; overrides config and the platform default
    #[arg(long)]
    pub history: Option<PathBuf>,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
