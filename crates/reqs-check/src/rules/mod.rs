//! Structural lint rules over one manifest or a whole include tree
//!
//! Every requirement line becomes an entry grouped by declaration key.
//! Group-level rules (duplicates, conflicts) look across files; the other
//! rules inspect entries one at a time. Findings carry the file and line
//! they were raised on and the level configured for their rule.

use crate::satisfy::ConstraintSolver;
use crate::CheckResult;
use indexmap::IndexMap;
use reqs_core::types::DeclarationKey;
use reqs_core::{Level, ReqsError, Requirement, RuleId};
use reqs_manifest::{Directive, FileRole, Manifest, ManifestTree};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Rule checker with per-rule levels
#[derive(Debug, Clone)]
pub struct Checker {
    levels: BTreeMap<RuleId, Level>,
}

/// One rule violation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Finding {
    pub file: String,
    pub line: usize,
    pub rule: RuleId,
    pub level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub message: String,
}

/// Findings of one check run, in file and line order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub findings: Vec<Finding>,
    pub errors: usize,
    pub warnings: usize,
}

/// A requirement line and where it came from
#[derive(Debug, Clone, Copy)]
struct Entry<'a> {
    file: &'a str,
    line: usize,
    requirement: &'a Requirement,
    constraint_only: bool,
}

/// A file taking part in a check
struct Scope<'a> {
    manifest: &'a Manifest,
    constraint_only: bool,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl Checker {
    /// Create a checker; rules missing from `levels` use their default level
    pub fn new(levels: BTreeMap<RuleId, Level>) -> Self {
        let levels = RuleId::ALL
            .into_iter()
            .map(|rule| (rule, levels.get(&rule).copied().unwrap_or(rule.default_level())))
            .collect();
        Self { levels }
    }

    pub fn level(&self, rule: RuleId) -> Level {
        self.levels.get(&rule).copied().unwrap_or(rule.default_level())
    }

    /// Change the level of one rule
    pub fn set_level(&mut self, rule: RuleId, level: Level) {
        self.levels.insert(rule, level);
    }

    /// Check a single manifest, ignoring its includes
    pub fn check_manifest(&self, manifest: &Manifest) -> Report {
        self.check_scopes(&[Scope {
            manifest,
            constraint_only: false,
        }])
    }

    /// Check every file of an include tree together
    ///
    /// Constraint files take part in conflict detection but are never
    /// reported as duplicates or unpinned.
    pub fn check_tree(&self, tree: &ManifestTree) -> Report {
        let scopes: Vec<Scope<'_>> = tree
            .files()
            .map(|file| Scope {
                manifest: &file.manifest,
                constraint_only: file.role == FileRole::Constraints,
            })
            .collect();
        self.check_scopes(&scopes)
    }

    fn check_scopes(&self, scopes: &[Scope<'_>]) -> Report {
        let mut groups: IndexMap<DeclarationKey, Vec<Entry<'_>>> = IndexMap::new();
        for scope in scopes {
            for (line, requirement) in scope.manifest.requirement_lines() {
                let entry = Entry {
                    file: &scope.manifest.file,
                    line,
                    requirement,
                    constraint_only: scope.constraint_only,
                };
                groups
                    .entry(DeclarationKey {
                        name: requirement.name.clone(),
                        marker: requirement.marker.clone(),
                    })
                    .or_default()
                    .push(entry);
            }
        }

        let mut raised = Vec::new();
        for entries in groups.values() {
            self.check_group(entries, &mut raised);
            for entry in entries {
                self.check_entry(entry, &mut raised);
            }
        }
        let entries: Vec<Entry<'_>> = groups.values().flatten().copied().collect();
        self.check_hashes(&entries, &mut raised);
        for scope in scopes {
            self.check_directives(scope.manifest, &mut raised);
        }

        let report = Report::new(raised);
        info!(
            "Checked {} declaration(s) in {} file(s): {} error(s), {} warning(s)",
            groups.len(),
            scopes.len(),
            report.errors,
            report.warnings
        );
        report
    }

    /// Duplicates and conflicts between entries sharing a key
    fn check_group(&self, entries: &[Entry<'_>], raised: &mut Vec<Finding>) {
        if entries.len() < 2 {
            return;
        }

        // differing sources cannot be merged
        let mut first_source: Option<&Entry<'_>> = None;
        for entry in entries {
            let Some(source) = &entry.requirement.source else {
                continue;
            };
            match first_source {
                None => first_source = Some(entry),
                Some(first) if first.requirement.source.as_ref() != Some(source) => {
                    raised.push(self.finding(
                        RuleId::ConflictingConstraints,
                        entry,
                        format!(
                            "'{}' is fetched from {} here but from {} at {}:{}",
                            entry.requirement.name,
                            source,
                            display_source(first.requirement),
                            first.file,
                            first.line
                        ),
                    ));
                    return;
                },
                Some(_) => {},
            }
        }

        // first entry at which the combined specifiers stop being satisfiable
        let mut solver = ConstraintSolver::new();
        for (index, entry) in entries.iter().enumerate() {
            solver.add_set(&entry.requirement.specifiers);
            if !solver.is_satisfiable() {
                let combined: Vec<String> = entries[..=index]
                    .iter()
                    .filter_map(|e| e.requirement.constraint())
                    .collect();
                raised.push(self.finding(
                    RuleId::ConflictingConstraints,
                    entry,
                    format!(
                        "No version of '{}' satisfies {}",
                        entry.requirement.name,
                        combined.join(" and ")
                    ),
                ));
                return;
            }
        }

        // a source line and a constraint line for the same package are one declaration
        let declared: Vec<&Entry<'_>> = entries.iter().filter(|e| !e.constraint_only).collect();
        for (index, entry) in declared.iter().enumerate() {
            let earlier = declared[..index]
                .iter()
                .find(|e| e.requirement.source.is_some() == entry.requirement.source.is_some());
            if let Some(earlier) = earlier {
                raised.push(self.finding(
                    RuleId::DuplicateDeclaration,
                    entry,
                    format!(
                        "'{}' is already declared at {}:{}",
                        entry.requirement.name, earlier.file, earlier.line
                    ),
                ));
            }
        }
    }

    fn check_entry(&self, entry: &Entry<'_>, raised: &mut Vec<Finding>) {
        let requirement = entry.requirement;

        if let Some(vcs) = requirement.vcs() {
            if !vcs.is_pinned_to_full_revision() {
                let message = match &vcs.revision {
                    Some(revision) => format!(
                        "'{}' references revision '{}', which is not a full commit id",
                        requirement.name, revision
                    ),
                    None => format!("'{}' does not pin a revision", requirement.name),
                };
                raised.push(self.finding(RuleId::FloatingRevision, entry, message));
            }
        }

        if requirement.is_unpinned() && !entry.constraint_only {
            raised.push(self.finding(
                RuleId::Unpinned,
                entry,
                format!("'{}' accepts any version", requirement.name),
            ));
        }

        if let Some(source) = &requirement.source {
            if source.is_insecure() {
                raised.push(self.finding(
                    RuleId::InsecureTransport,
                    entry,
                    format!("'{}' is fetched over an unencrypted transport", requirement.name),
                ));
            }
        }
    }

    /// Hash-checking mode needs a hash on every installed requirement
    fn check_hashes(&self, entries: &[Entry<'_>], raised: &mut Vec<Finding>) {
        let installed: Vec<&Entry<'_>> = entries
            .iter()
            .filter(|e| !e.constraint_only && !e.requirement.editable)
            .collect();
        let hashed = installed.iter().filter(|e| !e.requirement.hashes.is_empty()).count();
        if hashed == 0 || hashed == installed.len() {
            return;
        }

        debug!("{} of {} requirement(s) carry hashes", hashed, installed.len());
        for entry in installed.iter().filter(|e| e.requirement.hashes.is_empty()) {
            raised.push(self.finding(
                RuleId::PartialHashes,
                entry,
                format!(
                    "'{}' has no --hash while {} other requirement(s) do",
                    entry.requirement.name, hashed
                ),
            ));
        }
    }

    fn check_directives(&self, manifest: &Manifest, raised: &mut Vec<Finding>) {
        for (line, directive) in manifest.directives() {
            let url = match directive {
                Directive::IndexUrl(url) | Directive::ExtraIndexUrl(url) | Directive::FindLinks(url) => url,
                _ => continue,
            };
            if url.to_ascii_lowercase().starts_with("http://") {
                raised.push(Finding {
                    file: manifest.file.clone(),
                    line,
                    rule: RuleId::InsecureTransport,
                    level: self.level(RuleId::InsecureTransport),
                    package: None,
                    message: format!("Package location {} is not served over https", url),
                });
            }
        }
    }

    fn finding(&self, rule: RuleId, entry: &Entry<'_>, message: String) -> Finding {
        Finding {
            file: entry.file.to_string(),
            line: entry.line,
            rule,
            level: self.level(rule),
            package: Some(entry.requirement.name.to_string()),
            message,
        }
    }
}

fn display_source(requirement: &Requirement) -> String {
    requirement
        .source
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl Report {
    /// Build a report, dropping findings of allowed rules
    pub fn new(findings: Vec<Finding>) -> Self {
        let mut findings: Vec<Finding> = findings
            .into_iter()
            .filter(|finding| finding.level != Level::Allow)
            .collect();
        findings.sort();

        let errors = findings.iter().filter(|f| f.level == Level::Deny).count();
        let warnings = findings.iter().filter(|f| f.level == Level::Warn).count();
        Self {
            findings,
            errors,
            warnings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// No deny-level findings
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    /// Findings raised under one rule
    pub fn by_rule(&self, rule: RuleId) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |finding| finding.rule == rule)
    }

    /// Fail when any deny-level finding is present
    pub fn into_result(self) -> CheckResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ReqsError::CheckFailed {
                errors: self.errors,
                warnings: self.warnings,
            })
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}[{}] {}",
            self.file, self.line, self.level, self.rule, self.message
        )
    }
}
