use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::IntakeError;
use crate::core::*;

/// Multi-line request shape sent by the web frontend.
///
/// The customer is always a business identified by its tax number. Tax
/// rates are fractions (`0.14`), not percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub customer: CustomerInput,
    #[serde(default)]
    pub issue_date: String,
    pub lines: Vec<LineInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerInput {
    pub name: String,
    pub tax_number: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInput {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,
}

fn default_tax_rate() -> Decimal {
    dec!(0.14)
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` and plain dates
/// (taken as midnight UTC).
pub fn parse_issue_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl CreateInvoiceRequest {
    /// Request-level problems, empty when the request is acceptable.
    pub fn check(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let customer = &self.customer;

        if customer.name.trim().is_empty() {
            errors.push("Customer name is required".to_string());
        }
        if customer.address.trim().is_empty() {
            errors.push("Customer address is required".to_string());
        }
        if customer.tax_number.trim().is_empty() {
            errors.push("Customer tax number is required".to_string());
        } else if !is_valid_tax_number(customer.tax_number.trim()) {
            errors.push("Customer tax number must be 9 digits".to_string());
        }

        if self.issue_date.trim().is_empty() {
            errors.push("Issue date is required".to_string());
        } else if parse_issue_date(&self.issue_date).is_none() {
            errors.push("Issue date must be valid date".to_string());
        }

        if self.lines.is_empty() {
            errors.push("At least one line item is required".to_string());
        }
        for (i, line) in self.lines.iter().enumerate() {
            let n = i + 1;
            if line.description.trim().is_empty() {
                errors.push(format!("Line {n}: Description is required"));
            }
            if line.quantity <= Decimal::ZERO {
                errors.push(format!("Line {n}: Quantity must be positive"));
            }
            if line.unit_price <= Decimal::ZERO {
                errors.push(format!("Line {n}: Unit price must be positive"));
            }
            if line.tax_rate < Decimal::ZERO || line.tax_rate > Decimal::ONE {
                errors.push(format!(
                    "Line {n}: Tax rate must be between 0 and 1 (e.g., 0.14 for 14%)"
                ));
            }
        }

        errors
    }

    /// Build a draft invoice. The issue date comes from the request.
    pub fn into_invoice(self, supplier: Supplier, number: impl Into<String>) -> Result<Invoice, IntakeError> {
        let errors = self.check();
        if !errors.is_empty() {
            return Err(IntakeError::Rejected(errors));
        }
        let issued_at = parse_issue_date(&self.issue_date)
            .ok_or_else(|| IntakeError::Rejected(vec!["Issue date must be valid date".into()]))?;

        let customer = Customer::business(self.customer.name.trim(), self.customer.tax_number.trim())
            .address(self.customer.address.trim());

        let lines = self.lines.iter().enumerate().map(|(i, line)| {
            LineBuilder::new(
                &line.description,
                map_to_gs1_code(&line.description),
                line.quantity,
                line.unit_price,
            )
            .item_code(format!("ITEM{:03}", i + 1))
            .vat_rate(line.tax_rate * dec!(100))
            .build()
        });

        Ok(InvoiceBuilder::new(number, issued_at)
            .supplier(supplier)
            .customer(customer)
            .lines(lines)
            .build()?)
    }
}
