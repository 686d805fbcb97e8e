// src/error.rs

//! Error types for larder
//!
//! Every failure in a packaging run is fatal: the variants below are
//! propagated up to the CLI, which aborts the run. `BuildFailed` carries the
//! external tool's exit code so it can be surfaced unmodified.

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("No source declared for {package} version {version}")]
    UnknownVersion { package: String, version: String },

    #[error("Invalid value '{value}' for option '{option}' (allowed: {allowed})")]
    InvalidOption {
        option: String,
        value: String,
        allowed: String,
    },

    #[error("Patch failed on {file}: {reason}")]
    PatchFailed { file: String, reason: String },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("{phase} phase failed{}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_else(|| " (terminated by signal)".to_string()))]
    BuildFailed { phase: String, code: Option<i32> },

    #[error("Publish error: {0}")]
    PublishError(String),
}

impl Error {
    /// Exit code the CLI should terminate with for this error
    ///
    /// Build tool failures propagate the tool's own exit status; everything
    /// else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::BuildFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failed_propagates_exit_code() {
        let err = Error::BuildFailed {
            phase: "configure".to_string(),
            code: Some(42),
        };
        assert_eq!(err.exit_code(), 42);
        assert_eq!(err.to_string(), "configure phase failed with exit code 42");
    }

    #[test]
    fn test_signal_termination_exits_with_one() {
        let err = Error::BuildFailed {
            phase: "build".to_string(),
            code: None,
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        assert_eq!(Error::NotFound("x".to_string()).exit_code(), 1);
    }
}
