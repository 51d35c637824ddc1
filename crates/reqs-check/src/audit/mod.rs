//! Import audit: do the Python sources import only what the manifest declares?
//!
//! Source roots are walked for `*.py` files, which are scanned in parallel.
//! Import names are mapped to distribution names and compared against the
//! dependency set.

pub mod scan;
pub mod stdlib;

use crate::CheckResult;
use dashmap::DashMap;
use rayon::prelude::*;
use reqs_core::types::PackageName;
use reqs_core::{DependencySet, ReqsError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

pub use scan::{scan_imports, ImportStatement};
pub use stdlib::{is_stdlib, DEFAULT_ALIASES};

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &["__pycache__", "node_modules", "site-packages", "venv", "env"];

/// Source tree audit against a dependency set
#[derive(Debug, Clone, Default)]
pub struct ImportAudit {
    roots: Vec<PathBuf>,
    exclude: Vec<glob::Pattern>,
    aliases: HashMap<String, String>,
    first_party: BTreeSet<String>,
    ignore: BTreeSet<String>,
}

/// Where a module is imported
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ImportSite {
    pub file: String,
    pub line: usize,
}

/// Third-party module imported but not declared
#[derive(Debug, Clone, Serialize)]
pub struct UndeclaredImport {
    pub module: String,
    /// Distribution expected to provide the module
    pub distribution: String,
    pub sites: Vec<ImportSite>,
}

/// Result of an audit run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub undeclared: Vec<UndeclaredImport>,
    /// Declared distributions no scanned file imports
    pub unimported: Vec<String>,
    pub files_scanned: usize,
}

impl ImportAudit {
    /// Audit the given source roots (directories or single files)
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    /// Skip paths matching any of the glob patterns
    pub fn with_excludes(mut self, patterns: &[String]) -> CheckResult<Self> {
        for pattern in patterns {
            let compiled = glob::Pattern::new(pattern).map_err(|e| ReqsError::ConfigValidation {
                field: "audit.exclude".to_string(),
                reason: format!("invalid glob pattern '{}': {}", pattern, e),
            })?;
            self.exclude.push(compiled);
        }
        Ok(self)
    }

    /// Map import names to distributions, on top of the built-in aliases
    pub fn with_aliases<I>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.aliases.extend(aliases);
        self
    }

    /// Modules belonging to the project itself
    pub fn with_first_party<I>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.first_party.extend(modules);
        self
    }

    /// Import or distribution names never reported
    pub fn with_ignored<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.ignore
            .extend(names.into_iter().map(|name| PackageName::normalize(&name)));
        self
    }

    /// Distribution expected to provide a top-level import name
    pub fn distribution_for(&self, module: &str) -> String {
        let name = self
            .aliases
            .get(module)
            .map(String::as_str)
            .or_else(|| DEFAULT_ALIASES.get(module).copied())
            .unwrap_or(module);
        PackageName::normalize(name)
    }

    /// Python files under the roots, sorted
    pub fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in &self.roots {
            let walker = WalkDir::new(root)
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
            for entry in walker.filter_map(Result::ok) {
                let path = entry.path();
                let is_python = path.extension().map_or(false, |ext| ext == "py");
                if entry.file_type().is_file() && is_python && !self.is_excluded(root, path) {
                    files.push(path.to_path_buf());
                }
            }
        }
        files.sort();
        files.dedup();
        files
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.exclude
            .iter()
            .any(|pattern| pattern.matches_path(path) || pattern.matches_path(relative))
    }

    /// Scan the sources and compare their imports with `declared`
    pub fn run(&self, declared: &DependencySet) -> CheckResult<AuditReport> {
        let files = self.collect_files();
        debug!("Scanning {} Python file(s)", files.len());

        let found: DashMap<String, Vec<ImportSite>> = DashMap::new();
        files.par_iter().try_for_each(|path| -> CheckResult<()> {
            let bytes = fs::read(path)
                .map_err(|e| ReqsError::io(format!("Failed to read {}", path.display()), e))?;
            let source = String::from_utf8_lossy(&bytes);

            for import in scan_imports(&source) {
                let module = import.top_level();
                if is_stdlib(module) || self.is_first_party(module, path) {
                    continue;
                }
                found.entry(module.to_string()).or_default().push(ImportSite {
                    file: path.display().to_string(),
                    line: import.line,
                });
            }
            Ok(())
        })?;

        let modules: BTreeMap<String, Vec<ImportSite>> = found.into_iter().collect();
        let mut used = BTreeSet::new();
        let mut undeclared = Vec::new();

        for (module, mut sites) in modules {
            let distribution = self.distribution_for(&module);
            if self.ignore.contains(&PackageName::normalize(&module))
                || self.ignore.contains(&distribution)
            {
                continue;
            }
            if declared.contains_name(&distribution) {
                used.insert(distribution);
                continue;
            }
            sites.sort();
            undeclared.push(UndeclaredImport {
                module,
                distribution,
                sites,
            });
        }

        let unimported = declared
            .names()
            .into_iter()
            .filter(|name| !used.contains(name) && !self.ignore.contains(name))
            .collect();

        let report = AuditReport {
            undeclared,
            unimported,
            files_scanned: files.len(),
        };
        info!(
            "Audited {} file(s): {} undeclared import(s)",
            report.files_scanned,
            report.undeclared.len()
        );
        Ok(report)
    }

    /// Configured first-party name, or a module or package next to the
    /// importing file or at the top of a source root
    fn is_first_party(&self, module: &str, importer: &Path) -> bool {
        if self.first_party.contains(module) {
            return true;
        }
        let local = |dir: &Path| dir.join(format!("{}.py", module)).is_file() || dir.join(module).is_dir();
        importer.parent().map_or(false, local)
            || self
                .roots
                .iter()
                .any(|root| root.is_dir() && local(root))
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.')
        || SKIPPED_DIRS.contains(&name.as_ref())
        || entry.path().join("pyvenv.cfg").is_file()
}

impl AuditReport {
    /// No undeclared imports
    pub fn is_clean(&self) -> bool {
        self.undeclared.is_empty()
    }

    /// Fail when any import is undeclared
    pub fn into_result(self, manifest: &str) -> CheckResult<Self> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(ReqsError::UndeclaredImports {
                count: self.undeclared.len(),
                manifest: manifest.to_string(),
            })
        }
    }
}
