use rust_decimal::Decimal;

use super::error::{Severity, ValidationError};
use super::identifiers::*;
use super::types::*;

/// Validate an invoice against the ETA submission rules.
/// Returns all validation errors found (not just the first).
///
/// | Code | Rule |
/// |------|------|
/// | ETA-001 | supplier tax number is valid |
/// | ETA-002 | B2B customer has a valid tax number |
/// | ETA-003 | B2C customer has a valid national ID or passport; Foreign customer has a valid passport |
/// | ETA-004 | at least one line |
/// | ETA-005 | line GS1/EGS code is valid |
/// | ETA-006 | line quantity is positive |
/// | ETA-007 | line unit price is not negative |
/// | ETA-008 | line VAT rate is 0 or 14 |
/// | ETA-009 | invoice total is positive and fits the amount range |
/// | ETA-010 | supplier activity code is valid |
pub fn validate_invoice(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !is_valid_tax_number(&invoice.supplier.tax_number) {
        errors.push(ValidationError::new(
            "ETA-001",
            "supplier.tax_number",
            "supplier must have a valid 9-digit Egyptian tax number",
        ));
    }

    validate_customer(&invoice.customer, &mut errors);

    if invoice.lines.is_empty() {
        errors.push(ValidationError::new(
            "ETA-004",
            "lines",
            "invoice must contain at least one line item",
        ));
    }

    for (i, line) in invoice.lines.iter().enumerate() {
        validate_line(line, i, &mut errors);
    }

    match invoice.checked_total_amount() {
        Some(total) if total <= Decimal::ZERO => errors.push(ValidationError::new(
            "ETA-009",
            "total_amount",
            format!("invoice total must be positive, got: {total}"),
        )),
        Some(_) if invoice.checked_total_discount_amount().is_some() => {}
        _ => errors.push(ValidationError::new(
            "ETA-009",
            "total_amount",
            "invoice amounts exceed the supported range",
        )),
    }

    if !is_valid_activity_code(&invoice.supplier.activity_code) {
        errors.push(ValidationError::new(
            "ETA-010",
            "supplier.activity_code",
            format!(
                "invalid ETA activity code '{}' (expected 4-5 digits)",
                invoice.supplier.activity_code
            ),
        ));
    }

    errors
}

/// Count findings per severity as `(critical, error, warning)`.
pub fn severity_counts(errors: &[ValidationError]) -> (usize, usize, usize) {
    errors
        .iter()
        .fold((0, 0, 0), |(c, e, w), err| match err.severity {
            Severity::Critical => (c + 1, e, w),
            Severity::Error => (c, e + 1, w),
            Severity::Warning => (c, e, w + 1),
        })
}

fn validate_customer(customer: &Customer, errors: &mut Vec<ValidationError>) {
    let has = |value: &Option<String>, rule: fn(&str) -> bool| value.as_deref().is_some_and(rule);

    match customer.customer_type {
        CustomerType::B2B => {
            if !has(&customer.tax_number, is_valid_tax_number) {
                errors.push(ValidationError::new(
                    "ETA-002",
                    "customer.tax_number",
                    "B2B customer must have a valid 9-digit tax number",
                ));
            }
        }
        CustomerType::B2C => {
            if !has(&customer.national_id, is_valid_national_id)
                && !has(&customer.passport_number, is_valid_passport_number)
            {
                errors.push(ValidationError::new(
                    "ETA-003",
                    "customer.national_id",
                    "B2C customer must have a valid 14-digit national ID or passport number",
                ));
            }
        }
        CustomerType::Foreign => {
            if !has(&customer.passport_number, is_valid_passport_number) {
                errors.push(ValidationError::new(
                    "ETA-003",
                    "customer.passport_number",
                    "foreign customer must have a valid passport number (6-20 letters or digits)",
                ));
            }
        }
    }
}

fn validate_line(line: &InvoiceLine, index: usize, errors: &mut Vec<ValidationError>) {
    let prefix = format!("lines[{index}]");
    let n = index + 1;

    if !is_valid_gs1_code(&line.gs1_code) {
        errors.push(ValidationError::new(
            "ETA-005",
            format!("{prefix}.gs1_code"),
            format!("line {n}: invalid GS1/EGS code '{}' (expected 8-16 digits)", line.gs1_code),
        ));
    }

    if line.quantity <= Decimal::ZERO {
        errors.push(ValidationError::new(
            "ETA-006",
            format!("{prefix}.quantity"),
            format!("line {n}: quantity must be positive"),
        ));
    }

    if line.unit_price < Decimal::ZERO {
        errors.push(ValidationError::new(
            "ETA-007",
            format!("{prefix}.unit_price"),
            format!("line {n}: unit price cannot be negative"),
        ));
    }

    if line.vat_rate != STANDARD_VAT_RATE && !line.vat_rate.is_zero() {
        errors.push(ValidationError::new(
            "ETA-008",
            format!("{prefix}.vat_rate"),
            format!("line {n}: VAT rate must be 14% or 0% (exempt), got: {}", line.vat_rate),
        ));
    }
}
