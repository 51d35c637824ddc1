//! Error message formatting with actionable suggestions.
//!
//! Renders the outermost error, the help text of the first `ReqsError` in the
//! chain, and the remaining causes.

use super::colors::ColorSupport;
use reqs_core::ReqsError;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a new error formatter
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Self {
            colors: ColorSupport::disabled(),
        }
    }

    /// Format an error with context and suggestions
    pub fn format_error(&self, error: &anyhow::Error) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.to_string());
        output.push('\n');

        let suggestion = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<ReqsError>())
            .and_then(ReqsError::suggestion);
        if let Some(suggestion) = suggestion {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        for cause in error.chain().skip(1) {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&cause.to_string());
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqs_error_gets_help() {
        let error = anyhow::Error::new(ReqsError::FormatMismatch {
            file: "requirements.txt".to_string(),
        });
        let text = ErrorFormatter::plain().format_error(&error);
        assert!(text.starts_with("error: requirements.txt is not canonically formatted\n"));
        assert!(text.contains("help: Run 'reqs fmt' to rewrite the file"));
    }

    #[test]
    fn test_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = anyhow::Error::new(ReqsError::io("Failed to read dev.txt".to_string(), io));
        let text = ErrorFormatter::plain().format_error(&error);
        assert!(text.contains("caused by: missing"));
    }
}
