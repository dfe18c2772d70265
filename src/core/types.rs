use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// An ETA invoice document and its submission workflow state.
///
/// Totals are derived from the lines on demand and never stored, so
/// `sub_total == Σ line_total`, `total_vat_amount == Σ vat_amount` and
/// `total_amount == sub_total + total_vat_amount` hold by construction.
///
/// The plain accessors panic when an amount leaves the `Decimal` range.
/// Unvalidated data goes through the `checked_*` variants;
/// [`validate_invoice`](super::validate_invoice) rejects any invoice whose
/// totals do not fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice number, unique and immutable once assigned.
    pub number: String,
    /// Internal document UUID.
    pub uuid: Uuid,
    pub issued_at: DateTime<Utc>,
    pub document_type: DocumentType,
    pub document_type_version: String,
    /// ISO 4217 currency code (e.g. "EGP").
    pub currency_code: String,
    /// Rate converting one unit of `currency_code` into EGP.
    pub exchange_rate: Decimal,
    pub supplier: Supplier,
    pub customer: Customer,
    pub lines: Vec<InvoiceLine>,
    pub status: InvoiceStatus,
    /// Correlation data returned by the Authority.
    #[serde(default)]
    pub authority: AuthorityRecord,
    #[serde(default)]
    pub validation_errors: Vec<ValidationError>,
    #[serde(default)]
    pub submission_attempts: u32,
    pub last_submission_attempt: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, advanced by the store on every write.
    #[serde(default)]
    pub version: u64,
}

impl Invoice {
    /// Sum of line totals (net of line discounts, before VAT).
    pub fn sub_total(&self) -> Decimal {
        self.lines.iter().map(InvoiceLine::line_total).sum()
    }

    pub fn total_vat_amount(&self) -> Decimal {
        self.lines.iter().map(InvoiceLine::vat_amount).sum()
    }

    /// Gross total: `sub_total + total_vat_amount`.
    pub fn total_amount(&self) -> Decimal {
        self.sub_total() + self.total_vat_amount()
    }

    pub fn total_discount_amount(&self) -> Decimal {
        self.lines.iter().map(|l| l.discount_amount).sum()
    }

    /// [`total_amount`](Self::total_amount), or `None` on overflow.
    pub fn checked_total_amount(&self) -> Option<Decimal> {
        let sum = |amount: fn(&InvoiceLine) -> Option<Decimal>| {
            self.lines
                .iter()
                .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(amount(line)?))
        };
        sum(InvoiceLine::checked_net_amount)?.checked_add(sum(InvoiceLine::checked_vat_amount)?)
    }

    /// [`total_discount_amount`](Self::total_discount_amount), or `None` on overflow.
    pub fn checked_total_discount_amount(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.discount_amount))
    }
}

/// Workflow status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Created, or failed local validation.
    Draft,
    /// Passed the local ETA rules.
    Validated,
    /// A submission call is in flight.
    Submitting,
    /// Sent to the Authority, awaiting its verdict.
    Submitted,
    /// Accepted by the Authority.
    Valid,
    /// Rejected by the Authority or failed to submit.
    Invalid,
    Cancelled,
    /// Terminal: submission attempts exhausted.
    Rejected,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 8] = [
        Self::Draft,
        Self::Validated,
        Self::Submitting,
        Self::Submitted,
        Self::Valid,
        Self::Invalid,
        Self::Cancelled,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Validated => "Validated",
            Self::Submitting => "Submitting",
            Self::Submitted => "Submitted",
            Self::Valid => "Valid",
            Self::Invalid => "Invalid",
            Self::Cancelled => "Cancelled",
            Self::Rejected => "Rejected",
        }
    }

    /// No further action can move the invoice out of this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Rejected)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ETA document type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// `I`: invoice.
    Invoice,
    /// `C`: credit note.
    CreditNote,
    /// `D`: debit note.
    DebitNote,
}

impl DocumentType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invoice => "I",
            Self::CreditNote => "C",
            Self::DebitNote => "D",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "I" | "i" => Some(Self::Invoice),
            "C" | "c" => Some(Self::CreditNote),
            "D" | "d" => Some(Self::DebitNote),
            _ => None,
        }
    }
}

/// The issuing company. Fixed per deployment, see [`crate::core::Config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    /// 9-digit ETA tax registration number.
    pub tax_number: String,
    pub address: String,
    /// 4-5 digit ETA activity code.
    pub activity_code: String,
    /// Branch identifier, "0" for the main branch.
    pub branch_id: String,
}

impl Supplier {
    pub fn new(
        name: impl Into<String>,
        tax_number: impl Into<String>,
        address: impl Into<String>,
        activity_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            tax_number: tax_number.into(),
            address: address.into(),
            activity_code: activity_code.into(),
            branch_id: MAIN_BRANCH_ID.to_string(),
        }
    }

    pub fn branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = branch_id.into();
        self
    }
}

/// Branch identifier of a company's head office.
pub const MAIN_BRANCH_ID: &str = "0";

/// Customer classification driving which credential is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    /// Business, identified by a tax number.
    B2B,
    /// Consumer, identified by a national ID.
    B2C,
    /// Foreigner, identified by a passport number.
    Foreign,
}

/// The receiving party.
///
/// The credential fields are kept independent of `customer_type` so that an
/// inconsistent record can still be represented and reported by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub address: Option<String>,
    pub customer_type: CustomerType,
    /// 9-digit tax number (B2B).
    pub tax_number: Option<String>,
    /// 14-digit national ID (B2C).
    pub national_id: Option<String>,
    /// Passport number (Foreign).
    pub passport_number: Option<String>,
}

impl Customer {
    fn bare(name: impl Into<String>, customer_type: CustomerType) -> Self {
        Self {
            name: name.into(),
            address: None,
            customer_type,
            tax_number: None,
            national_id: None,
            passport_number: None,
        }
    }

    pub fn business(name: impl Into<String>, tax_number: impl Into<String>) -> Self {
        Self {
            tax_number: Some(tax_number.into()),
            ..Self::bare(name, CustomerType::B2B)
        }
    }

    pub fn consumer(name: impl Into<String>, national_id: impl Into<String>) -> Self {
        Self {
            national_id: Some(national_id.into()),
            ..Self::bare(name, CustomerType::B2C)
        }
    }

    pub fn foreign(name: impl Into<String>, passport_number: impl Into<String>) -> Self {
        Self {
            passport_number: Some(passport_number.into()),
            ..Self::bare(name, CustomerType::Foreign)
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// The credential matching `customer_type`, if present.
    pub fn credential(&self) -> Option<&str> {
        match self.customer_type {
            CustomerType::B2B => self.tax_number.as_deref(),
            CustomerType::B2C => self.national_id.as_deref(),
            CustomerType::Foreign => self.passport_number.as_deref(),
        }
    }
}

/// Standard Egyptian VAT rate in percent.
pub const STANDARD_VAT_RATE: Decimal = dec!(14);

/// Default GS1/EGS code for unclassified services.
pub const DEFAULT_GS1_CODE: &str = "10000000";

/// Default unit type ("each").
pub const DEFAULT_UNIT_TYPE: &str = "EA";

/// A single invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    /// Seller's internal item code.
    pub item_code: String,
    /// 8-16 digit GS1/EGS classification code.
    pub gs1_code: String,
    /// Unit of measure (e.g. "EA", "KG").
    pub unit_type: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Discount percentage (informational, sent to the Authority).
    pub discount_rate: Decimal,
    /// Absolute discount deducted from the line.
    pub discount_amount: Decimal,
    /// VAT rate in percent (0 or 14).
    pub vat_rate: Decimal,
}

impl InvoiceLine {
    /// `quantity * unit_price - discount_amount`.
    pub fn net_amount(&self) -> Decimal {
        self.quantity * self.unit_price - self.discount_amount
    }

    /// `net_amount * vat_rate / 100`, unrounded.
    pub fn vat_amount(&self) -> Decimal {
        self.net_amount() * self.vat_rate / dec!(100)
    }

    /// Line total before VAT (equals `net_amount`).
    pub fn line_total(&self) -> Decimal {
        self.net_amount()
    }

    pub fn checked_net_amount(&self) -> Option<Decimal> {
        self.quantity
            .checked_mul(self.unit_price)?
            .checked_sub(self.discount_amount)
    }

    pub fn checked_vat_amount(&self) -> Option<Decimal> {
        self.checked_net_amount()?
            .checked_mul(self.vat_rate)?
            .checked_div(dec!(100))
    }
}

/// Identifiers and verdicts returned by the Authority for one invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRecord {
    /// Submission UUID assigned by the Authority.
    pub submission_id: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    /// Raw response body of the last submission.
    pub response: Option<String>,
    pub long_id: Option<String>,
    pub internal_id: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reasons: Vec<String>,
}
