use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::EtaError;
use crate::core::Invoice;

/// The Authority's verdict on a submitted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Accepted.
    Valid,
    /// Rejected with validation errors.
    Invalid,
    /// Anything else; the Authority is still working on it.
    InProgress(String),
}

impl DocumentStatus {
    /// Map the Authority's textual status, case-insensitively.
    ///
    /// "Accepted" is how the submission endpoint spells "Valid".
    /// Unrecognised strings are kept verbatim as [`DocumentStatus::InProgress`].
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "valid" | "accepted" => Self::Valid,
            "invalid" => Self::Invalid,
            _ => Self::InProgress(status.to_string()),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => f.write_str("Valid"),
            Self::Invalid => f.write_str("Invalid"),
            Self::InProgress(s) => f.write_str(s),
        }
    }
}

/// A validation error reported by the Authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityValidationError {
    #[serde(default = "unknown_code")]
    pub code: String,
    #[serde(default = "unknown_message")]
    pub message: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub property_path: String,
}

fn unknown_code() -> String {
    "UNKNOWN".to_string()
}

fn unknown_message() -> String {
    "Unknown error".to_string()
}

impl AuthorityValidationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target: String::new(),
            property_path: String::new(),
        }
    }
}

impl std::fmt::Display for AuthorityValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Result of a transport-level successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    /// Submission UUID, when the Authority returned one.
    pub submission_id: Option<String>,
    pub status: DocumentStatus,
    pub long_id: String,
    pub internal_id: String,
    /// Errors attached to the acceptance decision, if any.
    pub errors: Vec<AuthorityValidationError>,
    /// Raw response body as received.
    pub raw_response: String,
}

/// Result of polling a submission.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub status: DocumentStatus,
    pub long_id: Option<String>,
    pub internal_id: Option<String>,
    pub errors: Vec<AuthorityValidationError>,
}

/// Operations the lifecycle needs from the Tax Authority.
///
/// Implemented by [`EtaClient`](super::EtaClient) against the real API and by
/// [`DemoAuthority`](super::DemoAuthority) for simulated submissions.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Convert and submit an invoice.
    async fn submit(&self, invoice: &Invoice) -> Result<SubmissionReceipt, EtaError>;

    /// Poll the status of an earlier submission.
    async fn status(&self, submission_id: &str) -> Result<StatusReport, EtaError>;

    /// Cancel an accepted document.
    async fn cancel(&self, long_id: &str, reason: &str) -> Result<(), EtaError>;

    /// Whether outcomes are simulated rather than real.
    fn is_simulated(&self) -> bool {
        false
    }
}
