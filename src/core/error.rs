use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during invoice construction or configuration.
///
/// Data problems in an invoice are never reported through this type; they
/// are returned as a list of [`ValidationError`]s instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvoiceError {
    /// Builder encountered invalid or missing input.
    #[error("builder error: {0}")]
    Builder(String),

    /// Configuration value is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invoice number generation error.
    #[error("numbering error: {0}")]
    Numbering(String),
}

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A single ETA rule violation with a stable code and field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Stable rule code (e.g. "ETA-001").
    pub code: String,
    /// Dot-separated path to the invalid field (e.g. "lines[2].gs1_code").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.field, self.message)
    }
}

impl ValidationError {
    /// Create an error-severity finding.
    pub fn new(
        code: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
