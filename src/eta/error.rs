use std::time::Duration;

use thiserror::Error;

/// Failure talking to the Tax Authority.
///
/// Every variant is a submission failure: the lifecycle records it as a
/// rejection reason and never lets it escape as a fault.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EtaError {
    /// Token request was refused or returned no token.
    #[error("failed to authenticate with ETA: {0}")]
    Authentication(String),

    /// The Authority answered with a non-2xx status.
    #[error("ETA API error: {status} - {body}")]
    Http { status: u16, body: String },

    /// Connection-level failure.
    #[error("ETA network error: {0}")]
    Network(String),

    /// The call did not complete within the configured timeout.
    #[error("ETA request timed out after {0:?}")]
    Timeout(Duration),

    /// Response body could not be decoded.
    #[error("ETA response parse error: {0}")]
    Parse(String),

    /// Client could not be constructed from the configuration.
    #[error("ETA client configuration error: {0}")]
    Config(String),
}

impl EtaError {
    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
