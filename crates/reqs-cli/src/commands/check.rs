//! `reqs check` command implementation.
//!
//! Loads the manifest with its `-r`/`-c` includes and runs every lint rule
//! at the configured level. Exits non-zero on deny-level findings.

use super::{is_stdin, print_json, read_manifest, suggest_similar_rule, CommandContext};
use reqs_check::{Checker, Report};
use reqs_core::{Level, ReqsError, ReqsResult, RuleId};
use reqs_manifest::ManifestTree;
use std::collections::HashMap;
use std::path::PathBuf;

/// Rule level flags given on the command line
#[derive(Debug, Default)]
pub struct LevelFlags {
    pub deny: Vec<String>,
    pub warn: Vec<String>,
    pub allow: Vec<String>,
}

impl LevelFlags {
    /// Config overrides (`lint.<rule>` = level); a rule named under several
    /// flags takes the strictest: deny, then warn, then allow
    pub fn overrides(&self) -> ReqsResult<HashMap<String, String>> {
        let mut overrides = HashMap::new();
        let flags = [
            (Level::Allow, &self.allow),
            (Level::Warn, &self.warn),
            (Level::Deny, &self.deny),
        ];
        for (level, rules) in flags {
            for rule in rules {
                let rule = parse_rule(rule)?;
                overrides.insert(format!("lint.{}", rule), level.to_string());
            }
        }
        Ok(overrides)
    }
}

fn parse_rule(name: &str) -> ReqsResult<RuleId> {
    name.parse::<RuleId>().map_err(|e| {
        let reason = match suggest_similar_rule(name) {
            Some(suggestion) => format!("{}; did you mean '{}'?", e, suggestion),
            None => e.to_string(),
        };
        ReqsError::ConfigValidation {
            field: "lint".to_string(),
            reason,
        }
    })
}

/// Execute the `reqs check` command
pub async fn execute(
    file: Option<PathBuf>,
    flags: LevelFlags,
    json: bool,
    ctx: &CommandContext,
) -> ReqsResult<()> {
    let config = ctx.load_config(flags.overrides()?).await?;
    let path = ctx.manifest_path(file, &config)?;
    let checker = Checker::new(config.config.levels());

    let mut report = if is_stdin(&path) {
        checker.check_manifest(&read_manifest(&path).await?)
    } else {
        let tree = ManifestTree::load(&path).await?;
        ctx.output
            .info(&format!("Checking {} file(s)", tree.file_count()));
        checker.check_tree(&tree)
    };
    for finding in &mut report.findings {
        finding.file = ctx.display(&finding.file);
    }

    if json {
        print_json(&report, ctx)?;
    } else {
        print_report(&report, ctx);
    }

    report.into_result().map(|_| ())
}

fn print_report(report: &Report, ctx: &CommandContext) {
    for finding in &report.findings {
        ctx.output.finding(finding);
    }

    if report.is_empty() {
        ctx.output.success("No problems found");
    } else if report.is_success() {
        ctx.output
            .warn(&format!("{} warning(s)", report.warnings));
    } else {
        ctx.output.error(&format!(
            "{} error(s), {} warning(s)",
            report.errors, report.warnings
        ));
    }
}
