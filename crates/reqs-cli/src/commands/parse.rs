//! `reqs parse` command implementation.
//!
//! Shows the declarations of one manifest grouped under the comment headers
//! that introduce them. Includes are listed, not followed.

use super::{print_json, read_manifest, CommandContext};
use reqs_core::{ReqsResult, Requirement};
use reqs_manifest::{IncludeKind, Manifest, Section};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Serialize)]
struct ParseOutput<'a> {
    file: String,
    sections: Vec<Section<'a>>,
    includes: Vec<String>,
    declarations: usize,
}

/// Execute the `reqs parse` command
pub async fn execute(file: Option<PathBuf>, json: bool, ctx: &CommandContext) -> ReqsResult<()> {
    let config = ctx.load_config(HashMap::new()).await?;
    let path = ctx.manifest_path(file, &config)?;
    let manifest = read_manifest(&path).await?;

    // surfaces conflicting sources with their line
    let set = manifest.dependency_set()?;

    if json {
        let output = ParseOutput {
            file: ctx.display(&manifest.file),
            sections: manifest.sections(),
            includes: includes(&manifest),
            declarations: set.len(),
        };
        return print_json(&output, ctx);
    }

    let sections = manifest.sections();
    for (index, section) in sections.iter().enumerate() {
        if index > 0 {
            ctx.output.print("");
        }
        let header = section.header.as_deref().unwrap_or("(no section)");
        ctx.output.heading(&format!("# {}", header));
        for requirement in &section.requirements {
            ctx.output.print(&format!("  {}", describe(requirement)));
        }
    }
    for include in includes(&manifest) {
        ctx.output.print(&format!("  includes {}", include));
    }

    ctx.output.info(&format!(
        "{} declaration(s) in {} section(s)",
        set.len(),
        sections.len()
    ));
    Ok(())
}

fn includes(manifest: &Manifest) -> Vec<String> {
    manifest
        .includes()
        .map(|(_, kind, target)| match kind {
            IncludeKind::Requirements => format!("-r {}", target),
            IncludeKind::Constraints => format!("-c {}", target),
        })
        .collect()
}

/// `name  constraint` or `name  source@revision`
fn describe(requirement: &Requirement) -> String {
    let mut text = requirement.name.to_string();
    if let Some(constraint) = requirement.constraint() {
        text.push_str("  ");
        text.push_str(&constraint);
    }
    if let Some(source) = &requirement.source {
        text.push_str("  ");
        text.push_str(&source.to_string());
    }
    if let Some(marker) = &requirement.marker {
        text.push_str("  ; ");
        text.push_str(marker);
    }
    text
}
