//! Adapters turning invoice-creation requests into draft invoices.
//!
//! Two request shapes are accepted: the multi-line [`CreateInvoiceRequest`]
//! and the older single-line [`LegacyInvoiceRequest`]. Both only check what
//! the request itself must carry; ETA rules are applied afterwards by
//! [`validate_invoice`](crate::core::validate_invoice).

mod create;
mod error;
mod legacy;

pub use create::{CreateInvoiceRequest, CustomerInput, LineInput, parse_issue_date};
pub use error::IntakeError;
pub use legacy::LegacyInvoiceRequest;

use chrono::{DateTime, Utc};

use crate::core::{Invoice, Supplier};

/// An invoice-creation request in either accepted shape.
#[derive(Debug, Clone)]
pub enum IntakeRequest {
    Create(CreateInvoiceRequest),
    Legacy(LegacyInvoiceRequest),
}

impl IntakeRequest {
    /// Parse a JSON body, trying the multi-line shape first.
    pub fn from_json(body: &str) -> Result<Self, IntakeError> {
        if let Ok(request) = serde_json::from_str::<CreateInvoiceRequest>(body) {
            return Ok(Self::Create(request));
        }
        serde_json::from_str::<LegacyInvoiceRequest>(body)
            .map(Self::Legacy)
            .map_err(|e| IntakeError::Malformed(e.to_string()))
    }

    /// Request-level problems, empty when the request is acceptable.
    pub fn check(&self) -> Vec<String> {
        match self {
            Self::Create(request) => request.check(),
            Self::Legacy(request) => request.check(),
        }
    }

    /// Build a draft invoice. `now` is the issue time for legacy requests,
    /// which carry no date of their own.
    pub fn into_invoice(
        self,
        supplier: Supplier,
        number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Invoice, IntakeError> {
        match self {
            Self::Create(request) => request.into_invoice(supplier, number),
            Self::Legacy(request) => request.into_invoice(supplier, number, now),
        }
    }
}
