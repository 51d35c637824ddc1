//! `reqs audit` command implementation.
//!
//! Scans Python sources for third-party imports and reports those the
//! manifest does not declare. Exits non-zero when any are found.

use super::export::load_set;
use super::{print_json, utf8_path, CommandContext};
use reqs_check::{AuditReport, ImportAudit};
use reqs_core::ReqsResult;
use std::collections::HashMap;
use std::path::PathBuf;

/// Execute the `reqs audit` command
pub async fn execute(
    file: Option<PathBuf>,
    paths: Vec<PathBuf>,
    unused: bool,
    json: bool,
    ctx: &CommandContext,
) -> ReqsResult<()> {
    let config = ctx.load_config(HashMap::new()).await?;
    let manifest = ctx.manifest_path(file, &config)?;
    let declared = load_set(&manifest, ctx).await?;

    // roots on the command line are relative to the working directory
    let roots = if paths.is_empty() {
        config.audit_paths()
    } else {
        paths
            .into_iter()
            .map(|path| utf8_path(path).map(|path| ctx.resolve(&path)))
            .collect::<ReqsResult<Vec<_>>>()?
    };

    let audit_config = &config.config.audit;
    let audit = ImportAudit::new(roots.into_iter().map(Into::into).collect())
        .with_excludes(&audit_config.exclude)?
        .with_aliases(audit_config.aliases.clone())
        .with_first_party(audit_config.first_party.iter().cloned())
        .with_ignored(audit_config.ignore.iter().cloned());

    let mut report = audit.run(&declared)?;
    if !unused {
        report.unimported.clear();
    }
    for undeclared in &mut report.undeclared {
        for site in &mut undeclared.sites {
            site.file = ctx.display(&site.file);
        }
    }

    if json {
        print_json(&report, ctx)?;
    } else {
        print_report(&report, ctx);
    }

    report
        .into_result(&ctx.display(manifest.as_str()))
        .map(|_| ())
}

fn print_report(report: &AuditReport, ctx: &CommandContext) {
    for undeclared in &report.undeclared {
        ctx.output.print(&format!(
            "{} (expected distribution '{}')",
            undeclared.module, undeclared.distribution
        ));
        for site in &undeclared.sites {
            ctx.output.print(&format!("  {}:{}", site.file, site.line));
        }
    }
    for name in &report.unimported {
        ctx.output
            .warn(&format!("'{}' is declared but never imported", name));
    }

    if report.is_clean() {
        ctx.output.success(&format!(
            "All imports in {} file(s) are declared",
            report.files_scanned
        ));
    } else {
        ctx.output.error(&format!(
            "{} undeclared import(s) in {} file(s)",
            report.undeclared.len(),
            report.files_scanned
        ));
    }
}
