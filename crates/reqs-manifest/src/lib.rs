//! requirements.txt parsing for reqs
//!
//! This crate turns manifest text into a document model that keeps comments,
//! sections and line numbers, renders it back canonically, and follows
//! `-r`/`-c` includes across files.

pub mod include;
pub mod manifest;

// Re-export main types
pub use include::{FileRole, IncludeKind, IncludedFile, ManifestTree};
pub use manifest::{load_manifest, parse_manifest, Directive, Line, LineKind, Manifest, Section};

/// Label used for manifests that did not come from a file
pub const STDIN_LABEL: &str = "<input>";
