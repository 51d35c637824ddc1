//! Command implementations and dispatch logic.
//!
//! This module contains all command handlers and the central dispatch system.
//! Each command is implemented as an async function that takes a CommandContext.

use camino::{Utf8Path, Utf8PathBuf};
use reqs_config::{ConfigLoader, ResolvedConfig};
use reqs_core::utils::display_relative;
use reqs_core::{ReqsError, ReqsResult, RuleId};
use reqs_manifest::{load_manifest, parse_manifest, Manifest};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

pub mod audit;
pub mod check;
pub mod diff;
pub mod export;
pub mod fmt;
pub mod init;
pub mod parse;


use crate::{output::OutputHandler, Commands};

/// Manifest argument meaning standard input
const STDIN_ARG: &str = "-";

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a new command context
    pub async fn new() -> ReqsResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| ReqsError::io("Failed to get current directory".to_string(), e))?;
        let cwd = utf8_path(cwd)?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
        })
    }

    /// Load configuration for this directory with command-line overrides
    pub async fn load_config(&self, overrides: HashMap<String, String>) -> ReqsResult<ResolvedConfig> {
        let config = ConfigLoader::new(self.cwd.clone()).load(overrides).await?;
        debug!("Configuration layers: {:?}", config.sources);
        Ok(config)
    }

    /// Manifest named on the command line, else the configured one
    pub fn manifest_path(&self, file: Option<PathBuf>, config: &ResolvedConfig) -> ReqsResult<Utf8PathBuf> {
        match file {
            Some(file) => Ok(self.resolve(&utf8_path(file)?)),
            None => Ok(config.manifest_path()),
        }
    }

    /// Resolve a path argument against the working directory
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() || path.as_str() == STDIN_ARG {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Path as shown to the user
    pub fn display(&self, path: &str) -> String {
        display_relative(std::path::Path::new(path), self.cwd.as_std_path())
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> ReqsResult<()> {
    match command {
        Commands::Parse { file, json } => {
            info!("Parsing manifest (json: {})", json);
            parse::execute(file, json, ctx).await
        },
        Commands::Check {
            file,
            deny,
            warn,
            allow,
            json,
        } => {
            info!("Checking manifest (json: {})", json);
            check::execute(file, check::LevelFlags { deny, warn, allow }, json, ctx).await
        },
        Commands::Fmt { file, check } => {
            info!("Formatting manifest (check: {})", check);
            fmt::execute(file, check, ctx).await
        },
        Commands::Export {
            file,
            fingerprint,
            verify,
        } => {
            info!("Exporting dependency set (fingerprint: {})", fingerprint);
            export::execute(file, fingerprint, verify, ctx).await
        },
        Commands::Diff { old, new, json } => {
            info!("Comparing {} with {}", old.display(), new.display());
            diff::execute(old, new, json, ctx).await
        },
        Commands::Audit {
            file,
            paths,
            unused,
            json,
        } => {
            info!("Auditing imports (unused: {})", unused);
            audit::execute(file, paths, unused, json, ctx).await
        },
        Commands::Init => {
            info!("Initializing reqs.toml in current directory");
            init::execute(ctx).await
        },
        Commands::Version => show_version(ctx).await,
    }
}

/// Read a single manifest from a file or stdin, without following includes
pub async fn read_manifest(path: &Utf8Path) -> ReqsResult<Manifest> {
    if path.as_str() == STDIN_ARG {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .map_err(|e| ReqsError::io("Failed to read standard input".to_string(), e))?;
        return parse_manifest(&content);
    }
    load_manifest(path).await
}

/// Write a serializable result to stdout as pretty JSON
pub fn print_json<T: Serialize>(value: &T, ctx: &CommandContext) -> ReqsResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ReqsError::io("Failed to serialize output".to_string(), e.into()))?;
    ctx.output.print(&text);
    Ok(())
}

pub fn is_stdin(path: &Utf8Path) -> bool {
    path.as_str() == STDIN_ARG
}

async fn show_version(ctx: &CommandContext) -> ReqsResult<()> {
    ctx.output.print(&format!("reqs {}", env!("CARGO_PKG_VERSION")));
    ctx.output.print(&format!("Built: {}", env!("BUILD_DATE")));
    ctx.output.print(&format!("Target: {}", env!("REQS_BUILD_TARGET")));
    ctx.output.print(&format!("Rust: {}", env!("RUSTC_VERSION")));
    Ok(())
}

pub fn utf8_path(path: PathBuf) -> ReqsResult<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| ReqsError::ConfigValidation {
        field: "path".to_string(),
        reason: format!("{} is not valid UTF-8", path.display()),
    })
}

/// Suggest a rule id close to a misspelled one
pub fn suggest_similar_rule(input: &str) -> Option<&'static str> {
    let wanted = input.to_ascii_lowercase().replace('_', "-");
    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for rule in RuleId::ALL {
        let distance = edit_distance(&wanted, rule.as_str());
        if distance < best_distance && distance <= 3 {
            best_distance = distance;
            best_match = Some(rule.as_str());
        }
    }

    best_match
}

/// Calculate edit distance between two strings
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b_len {
        matrix[0][j] = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            matrix[i][j] = std::cmp::min(
                std::cmp::min(
                    matrix[i - 1][j] + 1, // deletion
                    matrix[i][j - 1] + 1, // insertion
                ),
                matrix[i - 1][j - 1] + cost, // substitution
            );
        }
    }

    matrix[a_len][b_len]
}
