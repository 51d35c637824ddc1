//! `reqs fmt` command implementation.
//!
//! Rewrites a manifest in canonical form, keeping comments and sections.

use super::{is_stdin, read_manifest, CommandContext};
use reqs_core::{ReqsError, ReqsResult};
use reqs_manifest::Manifest;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Execute the `reqs fmt` command
pub async fn execute(file: Option<PathBuf>, check: bool, ctx: &CommandContext) -> ReqsResult<()> {
    let config = ctx.load_config(HashMap::new()).await?;
    let path = ctx.manifest_path(file, &config)?;

    if is_stdin(&path) {
        let manifest = read_manifest(&path).await?;
        // render ends with a newline already
        print!("{}", manifest.render());
        return Ok(());
    }

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ReqsError::io(format!("Failed to read {}", path), e))?;
    let manifest = Manifest::parse(&content, path.as_str())?;
    let display = ctx.display(path.as_str());

    if manifest.is_canonical(&content) {
        ctx.output.success(&format!("{} is already formatted", display));
        return Ok(());
    }
    if check {
        return Err(ReqsError::FormatMismatch { file: display });
    }

    let rendered = manifest.render();
    debug!("Rewriting {} ({} -> {} bytes)", path, content.len(), rendered.len());
    tokio::fs::write(&path, rendered)
        .await
        .map_err(|e| ReqsError::io(format!("Failed to write {}", path), e))?;
    ctx.output.success(&format!("Formatted {}", display));
    Ok(())
}
