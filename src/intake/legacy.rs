use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::IntakeError;
use crate::core::*;

/// Single-line request shape used by the first API clients.
///
/// The customer type is inferred from whichever credential is valid; the
/// line is always charged standard VAT.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyInvoiceRequest {
    pub customer_name: String,
    pub customer_tax_number: Option<String>,
    pub customer_national_id: Option<String>,
    pub customer_passport_number: Option<String>,
    pub customer_address: Option<String>,
    pub item_description: String,
    pub item_code: Option<String>,
    pub gs1_code: Option<String>,
    pub unit_type: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Percentage, e.g. 10 for 10%.
    pub discount_rate: Decimal,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl LegacyInvoiceRequest {
    /// Request-level problems, empty when the request is acceptable.
    pub fn check(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.customer_name.trim().is_empty() {
            errors.push("Customer name is required".to_string());
        }
        if self.quantity <= Decimal::ZERO {
            errors.push("Quantity must be positive".to_string());
        }
        if self.unit_price <= Decimal::ZERO {
            errors.push("Unit price must be positive".to_string());
        }
        if self.item_description.trim().is_empty() {
            errors.push("Item description is required".to_string());
        }

        let has_valid_id = present(&self.customer_tax_number).is_some_and(is_valid_tax_number)
            || present(&self.customer_national_id).is_some_and(is_valid_national_id)
            || present(&self.customer_passport_number).is_some_and(is_valid_passport_number);
        if !has_valid_id {
            errors.push(
                "Customer must have valid Tax Number (9 digits), National ID (14 digits), or Passport"
                    .to_string(),
            );
        }

        errors
    }

    /// Build a draft invoice issued at `issued_at`.
    pub fn into_invoice(
        self,
        supplier: Supplier,
        number: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Result<Invoice, IntakeError> {
        let errors = self.check();
        if !errors.is_empty() {
            return Err(IntakeError::Rejected(errors));
        }

        let tax_number = present(&self.customer_tax_number).map(str::to_string);
        let national_id = present(&self.customer_national_id).map(str::to_string);
        let passport_number = present(&self.customer_passport_number).map(str::to_string);
        let customer = Customer {
            name: self.customer_name.trim().to_string(),
            address: present(&self.customer_address).map(str::to_string),
            customer_type: determine_customer_type(
                tax_number.as_deref(),
                national_id.as_deref(),
                passport_number.as_deref(),
            ),
            tax_number,
            national_id,
            passport_number,
        };

        let gs1_code = present(&self.gs1_code)
            .unwrap_or_else(|| map_to_gs1_code(&self.item_description))
            .to_string();
        let mut line = LineBuilder::new(&self.item_description, gs1_code, self.quantity, self.unit_price)
            .discount_rate(self.discount_rate);
        if let Some(code) = present(&self.item_code) {
            line = line.item_code(code);
        }
        if let Some(unit) = present(&self.unit_type) {
            line = line.unit_type(unit);
        }

        Ok(InvoiceBuilder::new(number, issued_at)
            .supplier(supplier)
            .customer(customer)
            .add_line(line.build())
            .build()?)
    }
}
