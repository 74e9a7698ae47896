//! Unified error type for call-site analysis.

use thiserror::Error;

/// All errors that can occur while loading a project or resolving a query.
///
/// Only the resolver and the host layer produce errors. Reference finding,
/// verification and tear-off reasoning degrade to empty output instead.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Missing or empty class/method identifier in the query
    #[error("Configuration error: {0}")]
    Config(String),

    /// No concrete method declaration matches the (class, method) query
    #[error("No concrete method '{method}' declared directly in type '{class}'")]
    NotFound { class: String, method: String },

    /// I/O error (file read, directory access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON presentation failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid `--include` regex pattern
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Source root does not exist
    #[error("Directory does not exist: {0}")]
    DirNotFound(String),

    /// Argument validation error
    #[error("{0}")]
    InvalidArgs(String),

    /// tree-sitter rejected the grammar (ABI mismatch)
    #[error("Grammar error: {0}")]
    Grammar(String),
}

impl AnalysisError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::NotFound { class: class.into(), method: method.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = AnalysisError::config("class name must not be empty");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("class name"));
    }

    #[test]
    fn test_not_found_display() {
        let err = AnalysisError::not_found("VendorService", "getVendorData");
        let msg = err.to_string();
        assert!(msg.contains("VendorService"));
        assert!(msg.contains("getVendorData"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_regex_display() {
        let regex_err = regex::Regex::new("[invalid").unwrap_err();
        let err = AnalysisError::InvalidRegex {
            pattern: "[invalid".to_string(),
            source: regex_err,
        };
        assert!(err.to_string().contains("[invalid"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: AnalysisError = io_err.into();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
