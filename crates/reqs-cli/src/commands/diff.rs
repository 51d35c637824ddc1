//! `reqs diff` command implementation.

use super::export::load_set;
use super::{print_json, utf8_path, CommandContext};
use reqs_check::diff_sets;
use reqs_core::ReqsResult;
use std::path::PathBuf;

/// Execute the `reqs diff` command
pub async fn execute(old: PathBuf, new: PathBuf, json: bool, ctx: &CommandContext) -> ReqsResult<()> {
    let old = ctx.resolve(&utf8_path(old)?);
    let new = ctx.resolve(&utf8_path(new)?);
    let before = load_set(&old, ctx).await?;
    let after = load_set(&new, ctx).await?;

    let diff = diff_sets(&before, &after);
    if json {
        return print_json(&diff, ctx);
    }

    if diff.is_empty() {
        ctx.output.success("Dependency sets are identical");
    } else {
        print!("{}", diff);
        ctx.output.info(&format!(
            "{} added, {} removed, {} changed",
            diff.added.len(),
            diff.removed.len(),
            diff.changed.len()
        ));
    }
    Ok(())
}

