//! `reqs init` command implementation.
//!
//! Writes a commented reqs.toml with every rule at its default level.

use super::CommandContext;
use reqs_config::toml::default_config_document;
use reqs_config::{CONFIG_FILE_NAME, DEFAULT_MANIFEST};
use reqs_core::{ReqsError, ReqsResult};

/// Execute the `reqs init` command
pub async fn execute(ctx: &CommandContext) -> ReqsResult<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        ctx.output
            .info(&format!("{} already exists, skipping initialization", CONFIG_FILE_NAME));
        return Ok(());
    }

    tokio::fs::write(&config_path, default_config_document())
        .await
        .map_err(|e| ReqsError::io(format!("Failed to write {}", config_path), e))?;
    ctx.output.success(&format!("Created {}", CONFIG_FILE_NAME));

    if !ctx.cwd.join(DEFAULT_MANIFEST).exists() {
        ctx.output.warn(&format!(
            "No {} in this directory; set `manifest` in {}",
            DEFAULT_MANIFEST, CONFIG_FILE_NAME
        ));
    }

    ctx.output.info("");
    ctx.output.info("Next steps:");
    ctx.output.info("  reqs check");
    ctx.output.info("  reqs audit");
    Ok(())
}
