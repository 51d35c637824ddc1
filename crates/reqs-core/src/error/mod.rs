//! Error types and result aliases for reqs operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the toolkit with actionable error messages.

use thiserror::Error;

/// Unified error type for all reqs operations
#[derive(Error, Debug)]
pub enum ReqsError {
    // Manifest errors
    #[error("{file}:{line}: {message}")]
    ManifestParse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Include cycle detected: {cycle}")]
    IncludeCycle { cycle: String },

    #[error("Conflicting sources for '{package}': {first} and {second}")]
    SourceConflict {
        package: String,
        first: String,
        second: String,
    },

    // Config errors
    #[error("Failed to parse {file}: {message}")]
    ConfigParse { file: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Check errors
    #[error("Check failed: {errors} error(s), {warnings} warning(s)")]
    CheckFailed { errors: usize, warnings: usize },

    #[error("{file} is not canonically formatted")]
    FormatMismatch { file: String },

    #[error("{count} imported module(s) are not declared in {manifest}")]
    UndeclaredImports { count: usize, manifest: String },

    #[error("Dependency set fingerprint {actual} does not match {expected}")]
    FingerprintMismatch { expected: String, actual: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for reqs operations
pub type ReqsResult<T> = Result<T, ReqsError>;

impl ReqsError {
    /// Create a parse error located in a manifest file
    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::ManifestParse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error was caused by the environment rather than the input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReqsError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ReqsError::ManifestParse { .. } => {
                Some("Each line must be a package name with an optional specifier, a VCS/URL reference, or a supported option")
            },
            ReqsError::IncludeCycle { .. } => {
                Some("Remove one of the -r/-c lines so the requirement files no longer include each other")
            },
            ReqsError::SourceConflict { .. } => {
                Some("Keep a single source reference per package")
            },
            ReqsError::CheckFailed { .. } => {
                Some("Fix the reported findings or lower their level in reqs.toml")
            },
            ReqsError::FormatMismatch { .. } => Some("Run 'reqs fmt' to rewrite the file"),
            ReqsError::UndeclaredImports { .. } => {
                Some("Declare the missing packages or map the import name with [audit.aliases]")
            },
            ReqsError::FingerprintMismatch { .. } => {
                Some("The declared dependencies changed; run 'reqs export' to see the current set")
            },
            _ => None,
        }
    }
}
