//! Configuration parsing for reqs
//!
//! This crate handles parsing and validation of reqs.toml and the
//! `[tool.reqs]` table of pyproject.toml, and layers global, project,
//! environment and command-line settings into one configuration.

pub mod merge;
pub mod pyproject;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource, ResolvedConfig};
pub use pyproject::PyprojectToml;
pub use self::toml::{AuditSection, ReqsToml, CONFIG_FILE_NAME, DEFAULT_MANIFEST};

use reqs_core::ReqsError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ReqsError>;
