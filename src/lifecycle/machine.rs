use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::action::{Action, ActionOutcome};
use super::error::LifecycleError;
use crate::core::{EtaConfig, Invoice, InvoiceStatus, severity_counts, validate_invoice};
use crate::eta::{Authority, CANCEL_REASON, DocumentStatus, EtaError, connect};

/// Submission attempts allowed before an invoice is rejected for good.
pub const DEFAULT_MAX_SUBMISSION_ATTEMPTS: u32 = 3;

/// Drives invoices through validation, submission and cancellation.
///
/// The lifecycle operates on invoice values: it takes one, applies a single
/// action and hands back the result. It never touches storage and holds no
/// per-invoice state, so callers must serialize updates to the same invoice.
///
/// | Action | Allowed from | Result |
/// |--------|--------------|--------|
/// | validate | Draft, Invalid | Draft or Validated |
/// | submit | Validated, Invalid | Valid, Invalid, Submitted or Rejected |
/// | resubmit | Invalid | Draft, or as submit |
/// | check_status | Submitted (with a submission ID) | Valid, Invalid or unchanged |
/// | cancel | Draft, Validated, Invalid, Valid | Cancelled (Valid needs the Authority) |
pub struct InvoiceLifecycle {
    authority: Arc<dyn Authority>,
    max_attempts: u32,
}

impl InvoiceLifecycle {
    pub fn new(authority: Arc<dyn Authority>) -> Self {
        Self {
            authority,
            max_attempts: DEFAULT_MAX_SUBMISSION_ATTEMPTS,
        }
    }

    /// Connect to the configured Authority, real or simulated.
    pub fn from_config(config: &EtaConfig) -> Result<Self, EtaError> {
        Ok(Self::new(connect(config)?).with_max_attempts(config.max_submission_attempts))
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Apply an action given by name. Unknown names are refused with
    /// "Invalid action".
    pub async fn apply(&self, invoice: Invoice, action: &str) -> Result<ActionOutcome, LifecycleError> {
        match action.parse::<Action>() {
            Ok(action) => self.perform(invoice, action).await,
            Err(_) => Ok(ActionOutcome::refused(invoice, "Invalid action")),
        }
    }

    pub async fn perform(&self, invoice: Invoice, action: Action) -> Result<ActionOutcome, LifecycleError> {
        let before = invoice.status;
        let outcome = match action {
            Action::Validate => self.validate(invoice),
            Action::Submit => self.submit(invoice).await,
            Action::Resubmit => self.resubmit(invoice).await,
            Action::CheckStatus => self.check_status(invoice).await,
            Action::Cancel => self.cancel(invoice).await?,
        };

        let after = outcome.invoice.status;
        if after != before {
            info!(invoice = %outcome.invoice.number, %action, from = %before, status = %after, "invoice status changed");
        } else {
            info!(
                invoice = %outcome.invoice.number,
                %action,
                status = %after,
                success = outcome.success,
                "invoice action applied"
            );
        }
        Ok(outcome)
    }

    fn demo_prefix(&self) -> &'static str {
        if self.authority.is_simulated() {
            "[DEMO MODE] "
        } else {
            ""
        }
    }

    fn validate(&self, mut invoice: Invoice) -> ActionOutcome {
        if !Action::Validate.is_allowed_from(invoice.status) {
            let message = format!("Cannot validate invoice in {} status", invoice.status);
            return ActionOutcome::refused(invoice, message);
        }

        invoice.validation_errors = validate_invoice(&invoice);
        if !invoice.validation_errors.is_empty() {
            invoice.status = InvoiceStatus::Draft;
            let (critical, errors, _) = severity_counts(&invoice.validation_errors);
            return ActionOutcome::failed(
                invoice,
                format!("Validation failed: {critical} critical, {errors} errors"),
            );
        }

        invoice.status = InvoiceStatus::Validated;
        ActionOutcome::succeeded(invoice, "Invoice validated successfully - ready for ETA submission")
    }

    async fn submit(&self, mut invoice: Invoice) -> ActionOutcome {
        match invoice.status {
            InvoiceStatus::Valid => {
                return ActionOutcome::refused(invoice, "Invoice already accepted by ETA");
            }
            InvoiceStatus::Validated | InvoiceStatus::Invalid => {}
            other => {
                let message = format!("Invoice must be validated first (current: {other})");
                return ActionOutcome::refused(invoice, message);
            }
        }

        invoice.submission_attempts += 1;
        invoice.last_submission_attempt = Some(Utc::now());

        if invoice.submission_attempts > self.max_attempts {
            invoice.status = InvoiceStatus::Rejected;
            warn!(
                invoice = %invoice.number,
                attempts = invoice.submission_attempts,
                "submission attempts exhausted; invoice rejected"
            );
            return ActionOutcome::failed(invoice, "Maximum submission attempts exceeded");
        }

        invoice.status = InvoiceStatus::Submitting;
        info!(invoice = %invoice.number, attempt = invoice.submission_attempts, "submitting invoice to ETA");

        let prefix = self.demo_prefix();
        let receipt = match self.authority.submit(&invoice).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(invoice = %invoice.number, error = %e, retryable = e.is_retryable(), "ETA submission failed");
                invoice.status = InvoiceStatus::Invalid;
                invoice.authority.rejection_reasons.push(e.to_string());
                return ActionOutcome::failed(invoice, format!("ETA submission failed: {e}"));
            }
        };

        let now = Utc::now();
        let record = &mut invoice.authority;
        record.submission_id = receipt.submission_id;
        record.submitted_at = Some(now);
        record.response = Some(receipt.raw_response);
        record.long_id = Some(receipt.long_id.clone());
        record.internal_id = Some(receipt.internal_id);

        match receipt.status {
            DocumentStatus::Valid => {
                record.accepted_at = Some(now);
                record.rejection_reasons.clear();
                invoice.status = InvoiceStatus::Valid;
                ActionOutcome::succeeded(
                    invoice,
                    format!("{prefix}Invoice accepted by ETA. Long ID: {}", receipt.long_id),
                )
            }
            DocumentStatus::Invalid => {
                record.rejection_reasons = receipt.errors.iter().map(ToString::to_string).collect();
                let count = record.rejection_reasons.len();
                invoice.status = InvoiceStatus::Invalid;
                ActionOutcome::failed(invoice, format!("{prefix}Invoice rejected by ETA with {count} errors"))
            }
            DocumentStatus::InProgress(_) => {
                invoice.status = InvoiceStatus::Submitted;
                ActionOutcome::succeeded(invoice, format!("{prefix}Invoice submitted to ETA - awaiting validation"))
            }
        }
    }

    async fn resubmit(&self, mut invoice: Invoice) -> ActionOutcome {
        if !Action::Resubmit.is_allowed_from(invoice.status) {
            let message = format!("Only invalid invoices can be resubmitted (current: {})", invoice.status);
            return ActionOutcome::refused(invoice, message);
        }

        invoice.authority.rejection_reasons.clear();
        invoice.validation_errors = validate_invoice(&invoice);
        if !invoice.validation_errors.is_empty() {
            invoice.status = InvoiceStatus::Draft;
            return ActionOutcome::failed(invoice, "Revalidation failed - fix errors before resubmitting");
        }

        invoice.status = InvoiceStatus::Validated;
        self.submit(invoice).await
    }

    async fn check_status(&self, mut invoice: Invoice) -> ActionOutcome {
        let submission_id = invoice
            .authority
            .submission_id
            .clone()
            .filter(|id| invoice.status == InvoiceStatus::Submitted && !id.is_empty());
        let Some(submission_id) = submission_id else {
            return ActionOutcome::refused(invoice, "Can only check status for submitted invoices");
        };

        let prefix = self.demo_prefix();
        let now = Utc::now();
        invoice.last_submission_attempt = Some(now);

        let report = match self.authority.status(&submission_id).await {
            Ok(report) => report,
            Err(e) => {
                warn!(invoice = %invoice.number, error = %e, "ETA status check failed");
                return ActionOutcome::failed(invoice, format!("{prefix}Error checking status: {e}"));
            }
        };

        let record = &mut invoice.authority;
        match report.status {
            DocumentStatus::Valid => {
                record.accepted_at = Some(now);
                if report.long_id.is_some() {
                    record.long_id = report.long_id;
                }
                if report.internal_id.is_some() {
                    record.internal_id = report.internal_id;
                }
                let long_id = record.long_id.clone().unwrap_or_default();
                invoice.status = InvoiceStatus::Valid;
                ActionOutcome::succeeded(invoice, format!("{prefix}Invoice accepted by ETA. Long ID: {long_id}"))
            }
            DocumentStatus::Invalid => {
                record.rejection_reasons = report.errors.iter().map(ToString::to_string).collect();
                let count = record.rejection_reasons.len();
                invoice.status = InvoiceStatus::Invalid;
                ActionOutcome::succeeded(invoice, format!("{prefix}Invoice rejected by ETA with {count} errors"))
            }
            DocumentStatus::InProgress(status) => ActionOutcome::succeeded(
                invoice,
                format!("{prefix}Invoice still being processed by ETA (status: {status})"),
            ),
        }
    }

    async fn cancel(&self, mut invoice: Invoice) -> Result<ActionOutcome, LifecycleError> {
        match invoice.status {
            InvoiceStatus::Draft | InvoiceStatus::Validated | InvoiceStatus::Invalid => {
                invoice.status = InvoiceStatus::Cancelled;
                Ok(ActionOutcome::succeeded(invoice, "Invoice cancelled successfully"))
            }
            InvoiceStatus::Valid => {
                let long_id = invoice
                    .authority
                    .long_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| LifecycleError::MissingLongId {
                        invoice: invoice.number.clone(),
                    })?;

                let prefix = self.demo_prefix();
                invoice.last_submission_attempt = Some(Utc::now());
                match self.authority.cancel(&long_id, CANCEL_REASON).await {
                    Ok(()) => {
                        invoice.status = InvoiceStatus::Cancelled;
                        Ok(ActionOutcome::succeeded(
                            invoice,
                            format!("{prefix}Invoice cancelled with ETA successfully"),
                        ))
                    }
                    Err(e) => {
                        warn!(invoice = %invoice.number, error = %e, "ETA cancellation failed");
                        Ok(ActionOutcome::failed(invoice, format!("Failed to cancel with ETA: {e}")))
                    }
                }
            }
            other => {
                let message = format!("Cannot cancel invoice in {other} status");
                Ok(ActionOutcome::refused(invoice, message))
            }
        }
    }
}
