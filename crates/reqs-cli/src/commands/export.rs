//! `reqs export` command implementation.
//!
//! Prints the merged dependency set of a manifest and its `-r` includes as
//! comment-free canonical text, or its fingerprint.

use super::{is_stdin, read_manifest, CommandContext};
use reqs_core::utils::matches_fingerprint;
use reqs_core::{DependencySet, ReqsError, ReqsResult};
use reqs_manifest::ManifestTree;
use std::collections::HashMap;
use std::path::PathBuf;

/// Execute the `reqs export` command
pub async fn execute(
    file: Option<PathBuf>,
    fingerprint: bool,
    verify: Option<String>,
    ctx: &CommandContext,
) -> ReqsResult<()> {
    let config = ctx.load_config(HashMap::new()).await?;
    let path = ctx.manifest_path(file, &config)?;
    let set = load_set(&path, ctx).await?;

    if let Some(expected) = verify {
        let text = set.to_requirements();
        if !matches_fingerprint(text.as_bytes(), &expected) {
            return Err(ReqsError::FingerprintMismatch {
                expected,
                actual: set.fingerprint(),
            });
        }
        ctx.output.success("Dependency set matches the expected fingerprint");
        return Ok(());
    }

    if fingerprint {
        ctx.output.print(&set.fingerprint());
    } else {
        print!("{}", set.to_requirements());
    }
    Ok(())
}

/// Dependency set of a manifest, following includes unless read from stdin
pub async fn load_set(path: &camino::Utf8Path, ctx: &CommandContext) -> ReqsResult<DependencySet> {
    if is_stdin(path) {
        return read_manifest(path).await?.dependency_set();
    }
    let tree = ManifestTree::load(path).await?;
    if tree.file_count() > 1 {
        ctx.output.info(&format!(
            "Merged {} requirement file(s)",
            tree.requirement_files().count()
        ));
    }
    tree.dependency_set()
}
