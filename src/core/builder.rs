use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::error::InvoiceError;
use super::types::*;

/// Builder for constructing invoices in `Draft` status.
///
/// ```
/// use chrono::Utc;
/// use egyvat::core::*;
/// use rust_decimal_macros::dec;
///
/// let invoice = InvoiceBuilder::new("INV-20240615-103000-1234", Utc::now())
///     .supplier(Supplier::new("Test Company Ltd", "123456789", "Cairo", "4620"))
///     .customer(Customer::business("Nile Trading", "100000002").address("Giza"))
///     .add_line(LineBuilder::new("Software license", "6220100000", dec!(2), dec!(500)).build())
///     .build()
///     .unwrap();
///
/// assert_eq!(invoice.status, InvoiceStatus::Draft);
/// assert_eq!(invoice.total_amount(), dec!(1140));
/// ```
pub struct InvoiceBuilder {
    number: String,
    issued_at: DateTime<Utc>,
    document_type: DocumentType,
    document_type_version: String,
    currency_code: String,
    exchange_rate: Decimal,
    supplier: Option<Supplier>,
    customer: Option<Customer>,
    lines: Vec<InvoiceLine>,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            number: number.into(),
            issued_at,
            document_type: DocumentType::Invoice,
            document_type_version: "1.0".to_string(),
            currency_code: "EGP".to_string(),
            exchange_rate: Decimal::ONE,
            supplier: None,
            customer: None,
            lines: Vec::new(),
        }
    }

    pub fn document_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    pub fn document_type_version(mut self, version: impl Into<String>) -> Self {
        self.document_type_version = version.into();
        self
    }

    /// Set a foreign currency and its rate into EGP.
    pub fn currency(mut self, code: impl Into<String>, exchange_rate: Decimal) -> Self {
        self.currency_code = code.into();
        self.exchange_rate = exchange_rate;
        self
    }

    pub fn supplier(mut self, supplier: Supplier) -> Self {
        self.supplier = Some(supplier);
        self
    }

    pub fn customer(mut self, customer: Customer) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn add_line(mut self, line: InvoiceLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn lines(mut self, lines: impl IntoIterator<Item = InvoiceLine>) -> Self {
        self.lines.extend(lines);
        self
    }

    /// Build the invoice. ETA rules are not applied here; see
    /// [`validate_invoice`](super::validate_invoice).
    pub fn build(self) -> Result<Invoice, InvoiceError> {
        let supplier = self
            .supplier
            .ok_or_else(|| InvoiceError::Builder("supplier is required".into()))?;
        let customer = self
            .customer
            .ok_or_else(|| InvoiceError::Builder("customer is required".into()))?;

        if self.number.trim().is_empty() {
            return Err(InvoiceError::Builder("invoice number is required".into()));
        }
        if self.lines.is_empty() {
            return Err(InvoiceError::Builder(
                "at least one line item is required".into(),
            ));
        }

        // Input limits to prevent abuse
        if self.lines.len() > 10_000 {
            return Err(InvoiceError::Builder(
                "invoice cannot have more than 10,000 line items".into(),
            ));
        }
        if self.number.len() > 50 {
            return Err(InvoiceError::Builder(
                "invoice number cannot exceed 50 characters".into(),
            ));
        }
        if self.exchange_rate <= Decimal::ZERO {
            return Err(InvoiceError::Builder(
                "exchange rate must be positive".into(),
            ));
        }

        Ok(Invoice {
            number: self.number,
            uuid: Uuid::new_v4(),
            issued_at: self.issued_at,
            document_type: self.document_type,
            document_type_version: self.document_type_version,
            currency_code: self.currency_code,
            exchange_rate: self.exchange_rate,
            supplier,
            customer,
            lines: self.lines,
            status: InvoiceStatus::Draft,
            authority: AuthorityRecord::default(),
            validation_errors: Vec::new(),
            submission_attempts: 0,
            last_submission_attempt: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
        })
    }
}

/// Builder for invoice lines.
pub struct LineBuilder {
    description: String,
    item_code: String,
    gs1_code: String,
    unit_type: String,
    quantity: Decimal,
    unit_price: Decimal,
    discount: Discount,
    vat_rate: Decimal,
}

enum Discount {
    None,
    Rate(Decimal),
    Amount { rate: Decimal, amount: Decimal },
}

impl LineBuilder {
    /// Start a line with the standard 14% VAT rate, unit "EA" and
    /// item code "ITEM001".
    pub fn new(
        description: impl Into<String>,
        gs1_code: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            description: description.into(),
            item_code: "ITEM001".to_string(),
            gs1_code: gs1_code.into(),
            unit_type: DEFAULT_UNIT_TYPE.to_string(),
            quantity,
            unit_price,
            discount: Discount::None,
            vat_rate: STANDARD_VAT_RATE,
        }
    }

    pub fn item_code(mut self, code: impl Into<String>) -> Self {
        self.item_code = code.into();
        self
    }

    pub fn unit_type(mut self, unit: impl Into<String>) -> Self {
        self.unit_type = unit.into();
        self
    }

    /// VAT rate in percent (0 or 14 for a valid ETA line).
    pub fn vat_rate(mut self, rate: Decimal) -> Self {
        self.vat_rate = rate;
        self
    }

    /// Discount as a percentage of `quantity * unit_price`.
    pub fn discount_rate(mut self, rate: Decimal) -> Self {
        self.discount = Discount::Rate(rate);
        self
    }

    /// Discount given explicitly; `rate` is informational only.
    pub fn discount(mut self, rate: Decimal, amount: Decimal) -> Self {
        self.discount = Discount::Amount { rate, amount };
        self
    }

    pub fn build(self) -> InvoiceLine {
        let (discount_rate, discount_amount) = match self.discount {
            Discount::None => (Decimal::ZERO, Decimal::ZERO),
            Discount::Rate(rate) => (rate, rate_discount(self.quantity, self.unit_price, rate)),
            Discount::Amount { rate, amount } => (rate, amount),
        };

        InvoiceLine {
            description: self.description,
            item_code: self.item_code,
            gs1_code: self.gs1_code,
            unit_type: self.unit_type,
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount_rate,
            discount_amount,
            vat_rate: self.vat_rate,
        }
    }
}

/// `quantity * unit_price * rate / 100`, saturating at `Decimal::MAX`.
/// A saturated line fails validation with ETA-009.
fn rate_discount(quantity: Decimal, unit_price: Decimal, rate: Decimal) -> Decimal {
    if rate.is_zero() {
        return Decimal::ZERO;
    }
    quantity
        .checked_mul(unit_price)
        .and_then(|gross| gross.checked_mul(rate))
        .and_then(|amount| amount.checked_div(dec!(100)))
        .unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supplier() -> Supplier {
        Supplier::new("Test Company Ltd", "123456789", "Cairo", "4620")
    }

    #[test]
    fn builds_draft_with_defaults() {
        let inv = InvoiceBuilder::new("INV-1", Utc::now())
            .supplier(supplier())
            .customer(Customer::business("Nile Trading", "100000002"))
            .add_line(LineBuilder::new("Item", "10000000", dec!(1), dec!(10)).build())
            .build()
            .unwrap();

        assert_eq!(inv.status, InvoiceStatus::Draft);
        assert_eq!(inv.currency_code, "EGP");
        assert_eq!(inv.exchange_rate, Decimal::ONE);
        assert_eq!(inv.document_type, DocumentType::Invoice);
        assert_eq!(inv.supplier.branch_id, "0");
        assert_eq!(inv.submission_attempts, 0);
        assert!(inv.authority.submission_id.is_none());
    }

    #[test]
    fn requires_lines() {
        let err = InvoiceBuilder::new("INV-1", Utc::now())
            .supplier(supplier())
            .customer(Customer::business("Nile Trading", "100000002"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("at least one line"));
    }

    #[test]
    fn requires_parties() {
        let line = LineBuilder::new("Item", "10000000", dec!(1), dec!(10)).build();
        assert!(InvoiceBuilder::new("INV-1", Utc::now())
            .customer(Customer::business("Nile Trading", "100000002"))
            .add_line(line.clone())
            .build()
            .is_err());
        assert!(InvoiceBuilder::new("INV-1", Utc::now())
            .supplier(supplier())
            .add_line(line)
            .build()
            .is_err());
    }

    #[test]
    fn rejects_non_positive_exchange_rate() {
        let result = InvoiceBuilder::new("INV-1", Utc::now())
            .currency("USD", Decimal::ZERO)
            .supplier(supplier())
            .customer(Customer::business("Nile Trading", "100000002"))
            .add_line(LineBuilder::new("Item", "10000000", dec!(1), dec!(10)).build())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn discount_rate_computes_amount() {
        let line = LineBuilder::new("Item", "10000000", dec!(4), dec!(250))
            .discount_rate(dec!(10))
            .build();
        assert_eq!(line.discount_rate, dec!(10));
        assert_eq!(line.discount_amount, dec!(100));
        assert_eq!(line.net_amount(), dec!(900));
        assert_eq!(line.vat_amount(), dec!(126));
    }

    #[test]
    fn explicit_discount_kept_verbatim() {
        let line = LineBuilder::new("Item", "10000000", dec!(1), dec!(100))
            .discount(dec!(5), dec!(7.5))
            .vat_rate(Decimal::ZERO)
            .build();
        assert_eq!(line.discount_amount, dec!(7.5));
        assert_eq!(line.net_amount(), dec!(92.5));
        assert_eq!(line.vat_amount(), Decimal::ZERO);
    }

    #[test]
    fn overflowing_discount_saturates() {
        let line = LineBuilder::new("Item", "10000000", Decimal::MAX, dec!(2))
            .discount_rate(dec!(10))
            .build();
        assert_eq!(line.discount_amount, Decimal::MAX);
        assert_eq!(line.checked_net_amount(), None);

        let line = LineBuilder::new("Item", "10000000", Decimal::MAX, dec!(2))
            .discount_rate(Decimal::ZERO)
            .build();
        assert_eq!(line.discount_amount, Decimal::ZERO);
    }
}
