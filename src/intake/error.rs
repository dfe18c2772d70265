use thiserror::Error;

use crate::core::InvoiceError;

/// Why an invoice request could not be turned into an invoice.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IntakeError {
    /// Body is not a JSON object of either accepted shape.
    #[error("Invalid request body: {0}")]
    Malformed(String),

    /// Request-level checks failed; one message per problem.
    #[error("Validation failed: {}", .0.join("; "))]
    Rejected(Vec<String>),

    #[error(transparent)]
    Build(#[from] InvoiceError),
}
