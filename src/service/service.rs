use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use tracing::{error, info, warn};

use super::error::ServiceError;
use super::store::{InvoiceStore, StoreError};
use crate::core::*;
use crate::intake::IntakeRequest;
use crate::lifecycle::{ActionOutcome, InvoiceLifecycle};

/// Fresh numbers tried before a creation gives up on collisions.
const NUMBER_ATTEMPTS: usize = 3;

/// Caller-side glue: intake, lifecycle and persistence.
///
/// Every action loads the current invoice, runs the lifecycle and writes the
/// result back with a version check, so two concurrent actions on the same
/// invoice cannot both win.
pub struct InvoiceService<S> {
    store: S,
    lifecycle: InvoiceLifecycle,
    supplier: Supplier,
    numbers: Mutex<InvoiceNumberGenerator>,
}

impl<S: InvoiceStore> InvoiceService<S> {
    pub fn new(
        store: S,
        lifecycle: InvoiceLifecycle,
        supplier: Supplier,
        numbers: InvoiceNumberGenerator,
    ) -> Self {
        Self {
            store,
            lifecycle,
            supplier,
            numbers: Mutex::new(numbers),
        }
    }

    /// Wire up a service from deployment configuration.
    pub fn from_config(store: S, config: &Config) -> Result<Self, ServiceError> {
        let lifecycle =
            InvoiceLifecycle::from_config(&config.eta).map_err(|e| ServiceError::Config(e.to_string()))?;
        let numbers = InvoiceNumberGenerator::new(config.invoice_prefix.as_str())
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        Ok(Self::new(store, lifecycle, config.supplier.clone(), numbers))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn next_number(&self) -> String {
        self.numbers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_number(Utc::now())
    }

    /// Create an invoice from a JSON request body in either accepted shape.
    pub async fn create(&self, body: &str) -> Result<ActionOutcome, ServiceError> {
        let request = IntakeRequest::from_json(body)?;
        self.create_from(request).await
    }

    /// Create, validate and store an invoice.
    ///
    /// The invoice is stored as `Validated` when it passes the ETA rules and
    /// as `Draft` with its validation errors otherwise.
    pub async fn create_from(&self, request: IntakeRequest) -> Result<ActionOutcome, ServiceError> {
        let problems = request.check();
        if !problems.is_empty() {
            return Err(crate::intake::IntakeError::Rejected(problems).into());
        }

        let mut last_conflict = None;
        for _ in 0..NUMBER_ATTEMPTS {
            let mut invoice =
                request
                    .clone()
                    .into_invoice(self.supplier.clone(), self.next_number(), Utc::now())?;
            invoice.validation_errors = validate_invoice(&invoice);
            invoice.status = if invoice.validation_errors.is_empty() {
                InvoiceStatus::Validated
            } else {
                InvoiceStatus::Draft
            };

            match self.store.put(invoice).await {
                Ok(stored) => {
                    info!(invoice = %stored.number, status = %stored.status, "invoice created");
                    let message = if stored.validation_errors.is_empty() {
                        "Invoice created and validated successfully".to_string()
                    } else {
                        format!(
                            "Invoice created with {} validation errors",
                            stored.validation_errors.len()
                        )
                    };
                    return Ok(ActionOutcome::succeeded(stored, message));
                }
                Err(StoreError::Conflict { number, .. }) => {
                    warn!(invoice = %number, "invoice number collision; drawing a new number");
                    last_conflict = Some(number);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Conflict(last_conflict.unwrap_or_default()))
    }

    pub async fn get(&self, number: &str) -> Result<Invoice, ServiceError> {
        Ok(self.store.get(number).await?)
    }

    /// Apply a lifecycle action to a stored invoice.
    ///
    /// The result is persisted whenever the action changed the invoice,
    /// failed submissions included, so the attempt counter survives.
    pub async fn apply(&self, number: &str, action: &str) -> Result<ActionOutcome, ServiceError> {
        let invoice = self.store.get(number).await?;
        let mut outcome = self.lifecycle.apply(invoice, action).await.inspect_err(|e| {
            error!(invoice = number, action, error = %e, "lifecycle fault");
        })?;

        if outcome.mutated {
            outcome.invoice.updated_at = Some(Utc::now());
            outcome.invoice = self.store.put(outcome.invoice).await?;
        }
        Ok(outcome)
    }
}
