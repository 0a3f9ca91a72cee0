//! Error types for filtertest
//!
//! Only [`Error::MalformedPlan`] aborts a run. Compile, capture and timeout
//! errors are caught per case and turned into FAIL verdicts.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for filtertest
#[derive(Error, Debug)]
pub enum Error {
    // === Plan Errors ===
    #[error("malformed plan at line {line}: {reason}")]
    MalformedPlan { line: usize, reason: String },

    // === Per-case Errors ===
    #[error("compile error: {0}")]
    Compile(String),

    #[error("capture read error: {path}: {reason}")]
    CaptureRead { path: String, reason: String },

    #[error("timeout after {0}s")]
    Timeout(u64),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a malformed plan error for the given 1-based line
    pub fn malformed<S: Into<String>>(line: usize, reason: S) -> Self {
        Self::MalformedPlan {
            line,
            reason: reason.into(),
        }
    }

    /// Create a capture read error for a path
    pub fn capture_read<R: ToString>(path: &std::path::Path, reason: R) -> Self {
        Self::CaptureRead {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error belongs to a single case rather than the whole run
    pub fn is_per_case(&self) -> bool {
        matches!(
            self,
            Error::Compile(_) | Error::CaptureRead { .. } | Error::Timeout(_)
        )
    }

    /// Short machine-readable kind, used in JSON reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedPlan { .. } => "MALFORMED_PLAN",
            Error::Compile(_) => "COMPILE_ERROR",
            Error::CaptureRead { .. } => "CAPTURE_READ_ERROR",
            Error::Timeout(_) => "TIMEOUT",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG_ERROR",
            Error::FileRead { .. } => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
