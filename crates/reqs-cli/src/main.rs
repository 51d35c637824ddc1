//! # reqs-cli
//!
//! Command-line toolkit for pip requirement manifests.
//!
//! This is the main entry point for the reqs tool. It handles command parsing,
//! sets up logging and error handling, and dispatches to the appropriate command handlers.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Check, format and audit pip requirement manifests
#[derive(Parser)]
#[command(name = "reqs", version, about = "Check, format and audit pip requirement manifests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show declarations grouped by section
    Parse {
        /// Manifest to read, `-` for stdin
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Run the lint rules over a manifest and its includes
    Check {
        file: Option<PathBuf>,
        /// Treat findings of RULE as errors
        #[arg(long, value_name = "RULE")]
        deny: Vec<String>,
        /// Report findings of RULE as warnings
        #[arg(long, value_name = "RULE")]
        warn: Vec<String>,
        /// Ignore findings of RULE
        #[arg(long, value_name = "RULE")]
        allow: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Rewrite a manifest in canonical form
    Fmt {
        file: Option<PathBuf>,
        /// Fail instead of writing when the file is not canonical
        #[arg(long)]
        check: bool,
    },
    /// Print the comment-free canonical dependency set
    Export {
        file: Option<PathBuf>,
        /// Print the set's fingerprint instead of its text
        #[arg(long)]
        fingerprint: bool,
        /// Fail unless the set's fingerprint equals HASH
        #[arg(long, value_name = "HASH")]
        verify: Option<String>,
    },
    /// Compare the dependency sets of two manifests
    Diff {
        old: PathBuf,
        new: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Find imports in Python sources that the manifest does not declare
    Audit {
        file: Option<PathBuf>,
        /// Source root to scan, repeatable
        #[arg(long = "path", value_name = "DIR")]
        paths: Vec<PathBuf>,
        /// Also list declared packages nothing imports
        #[arg(long)]
        unused: bool,
        #[arg(long)]
        json: bool,
    },
    /// Write a default reqs.toml
    Init,
    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_format);
    setup_panic_handler();

    info!("Starting reqs v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::Error::new(e).context("Failed to create async runtime"))?;

    rt.block_on(async {
        let ctx = CommandContext::new().await?;
        commands::dispatch_command(cli.command, &ctx).await?;
        Ok(())
    })
}

fn setup_logging(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "reqs={level},reqs_core={level},reqs_manifest={level},reqs_config={level},reqs_check={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("reqs encountered an unexpected error: {}", panic_info);
        eprintln!("reqs crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/reqs-tool/reqs/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
