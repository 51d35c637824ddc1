//! Terminal output formatting and utilities.
//!
//! Status messages go to stderr so that command results written to stdout
//! (exported manifests, JSON) can be piped.

pub mod colors;
pub mod errors;

use reqs_check::Finding;
use reqs_core::Level;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Handler that never emits color codes
    #[cfg(test)]
    pub fn plain() -> Self {
        Self {
            colors: colors::ColorSupport::disabled(),
        }
    }

    /// Print command output to stdout
    pub fn print(&self, text: &str) {
        println!("{}", text);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        eprintln!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.colors.red("✗"), message);
    }

    /// Print a lint finding, colored by level
    pub fn finding(&self, finding: &Finding) {
        let label = match finding.level {
            Level::Deny => self.colors.red("error"),
            Level::Warn => self.colors.yellow("warning"),
            Level::Allow => self.colors.dim("note"),
        };
        println!(
            "{}:{}: {}[{}]: {}",
            finding.file, finding.line, label, finding.rule, finding.message
        );
    }

    /// Print a section heading
    pub fn heading(&self, text: &str) {
        println!("{}", self.colors.bold(text));
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
