//! Structural verification for requirement manifests
//!
//! This crate checks manifests against lint rules (conflicting constraints,
//! duplicate declarations, floating revisions and more), compares dependency
//! sets, and audits Python sources for imports the manifest does not declare.

pub mod audit;
pub mod diff;
pub mod rules;
pub mod satisfy;

// Re-export main types
pub use audit::{AuditReport, ImportAudit, ImportSite, UndeclaredImport};
pub use diff::{diff_sets, Change, SetDiff};
pub use rules::{Checker, Finding, Report};
pub use satisfy::{is_satisfiable, ConstraintSolver};

use reqs_core::ReqsError;

/// Result type for check operations
pub type CheckResult<T> = Result<T, ReqsError>;
