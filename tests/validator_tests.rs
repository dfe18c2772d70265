use chrono::Utc;
use egyvat::core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn valid_invoice() -> Invoice {
    InvoiceBuilder::new("INV-20240615-103000-1234", Utc::now())
        .supplier(Supplier::new("Test Company Ltd", "123456789", "Cairo", "4620"))
        .customer(Customer::business("Nile Trading", "100000002").address("Giza"))
        .add_line(LineBuilder::new("Software license", "6220100000", dec!(2), dec!(500)).build())
        .build()
        .unwrap()
}

fn codes(inv: &Invoice) -> Vec<String> {
    validate_invoice(inv).into_iter().map(|e| e.code).collect()
}

#[test]
fn valid_invoice_passes() {
    assert!(validate_invoice(&valid_invoice()).is_empty());
}

#[test]
fn every_rule_reported_at_once() {
    let mut inv = valid_invoice();
    inv.supplier.tax_number = "12345".into();
    inv.supplier.activity_code = "46".into();
    inv.customer.tax_number = None;
    inv.lines[0].gs1_code = "ABC".into();
    inv.lines[0].quantity = Decimal::ZERO;
    inv.lines[0].unit_price = dec!(-1);
    inv.lines[0].vat_rate = dec!(5);

    assert_eq!(
        codes(&inv),
        ["ETA-001", "ETA-002", "ETA-005", "ETA-006", "ETA-007", "ETA-008", "ETA-009", "ETA-010"]
    );
}

#[test]
fn customer_credential_must_match_type() {
    // A valid national ID does not satisfy a B2B customer.
    let mut inv = valid_invoice();
    inv.customer.tax_number = None;
    inv.customer.national_id = Some("29001010100012".into());
    assert_eq!(codes(&inv), ["ETA-002"]);

    let mut inv = valid_invoice();
    inv.customer = Customer::consumer("Ahmed Hassan", "29013010100012");
    assert_eq!(codes(&inv), ["ETA-003"]);

    inv.customer.national_id = Some("29001010100012".into());
    assert!(codes(&inv).is_empty());
}

#[test]
fn exempt_rate_is_allowed() {
    let mut inv = valid_invoice();
    inv.lines[0].vat_rate = Decimal::ZERO;
    assert!(validate_invoice(&inv).is_empty());
}

#[test]
fn full_discount_fails_total() {
    let mut inv = valid_invoice();
    inv.lines[0].discount_amount = dec!(1000);
    assert_eq!(codes(&inv), ["ETA-009"]);
}

#[test]
fn amounts_beyond_decimal_range_fail_total() {
    let mut inv = valid_invoice();
    inv.lines[0].quantity = Decimal::MAX;
    inv.lines[0].unit_price = dec!(2);
    assert_eq!(codes(&inv), ["ETA-009"]);
    assert_eq!(inv.checked_total_amount(), None);

    // Net fits, VAT does not.
    inv.lines[0].unit_price = Decimal::ONE;
    assert_eq!(codes(&inv), ["ETA-009"]);

    let inv = InvoiceBuilder::new("INV-BIG", Utc::now())
        .supplier(Supplier::new("Test Company Ltd", "123456789", "Cairo", "4620"))
        .customer(Customer::business("Nile Trading", "100000002"))
        .add_line(
            LineBuilder::new("Bulk", "10000000", Decimal::MAX, dec!(2))
                .discount_rate(dec!(5))
                .build(),
        )
        .build()
        .unwrap();
    assert_eq!(codes(&inv), ["ETA-009"]);
}

#[test]
fn errors_carry_field_paths_and_display() {
    let mut inv = valid_invoice();
    inv.lines.push(inv.lines[0].clone());
    inv.lines[1].quantity = Decimal::ZERO;

    let errors = validate_invoice(&inv);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "lines[1].quantity");
    assert_eq!(errors[0].severity, Severity::Error);
    assert!(errors[0].to_string().starts_with("[ETA-006] lines[1].quantity:"));
}

#[test]
fn validation_errors_serialize_with_invoice() {
    let mut inv = valid_invoice();
    inv.supplier.tax_number = "000000001".into();
    inv.validation_errors = validate_invoice(&inv);

    let json = serde_json::to_string(&inv).unwrap();
    let back: Invoice = serde_json::from_str(&json).unwrap();
    assert_eq!(back.validation_errors, inv.validation_errors);
    assert_eq!(back.total_amount(), inv.total_amount());
}
