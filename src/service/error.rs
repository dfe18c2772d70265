use thiserror::Error;
use tracing::error;

use super::store::StoreError;
use crate::intake::IntakeError;
use crate::lifecycle::LifecycleError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("invoice {0} not found")]
    NotFound(String),

    #[error("invoice {0} was modified concurrently")]
    Conflict(String),

    /// The creation request was unusable.
    #[error(transparent)]
    Request(#[from] IntakeError),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("service configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(number) => Self::NotFound(number),
            StoreError::Conflict { number, .. } => Self::Conflict(number),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl ServiceError {
    /// Unexpected defects rather than caller mistakes.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Lifecycle(_) | Self::Config(_))
    }

    /// Text safe to show to an end user. Faults get a generic message and
    /// their detail is logged instead.
    pub fn public_message(&self) -> String {
        if self.is_fault() {
            error!(error = %self, "invoice service fault");
            return "An internal error occurred while processing the invoice".to_string();
        }
        match self {
            Self::NotFound(_) => "Invoice not found".to_string(),
            Self::Conflict(_) => "Invoice was modified by another request; reload and retry".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_do_not_leak_detail() {
        let err = ServiceError::Storage("connection string postgres://secret@db".into());
        assert!(err.is_fault());
        assert!(!err.public_message().contains("secret"));
    }

    #[test]
    fn caller_errors_keep_their_message() {
        let err = ServiceError::Request(IntakeError::Rejected(vec!["Customer name is required".into()]));
        assert!(!err.is_fault());
        assert!(err.public_message().contains("Customer name is required"));
        assert_eq!(ServiceError::NotFound("X".into()).public_message(), "Invoice not found");
    }

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err: ServiceError = StoreError::Conflict {
            number: "INV-1".into(),
            expected: 1,
            found: Some(2),
        }
        .into();
        assert!(matches!(err, ServiceError::Conflict(n) if n == "INV-1"));
    }
}
