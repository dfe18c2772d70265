//! JSON shapes exchanged with the Authority API.
//!
//! Outgoing documents are strictly typed. Incoming bodies are parsed
//! leniently: every field is optional and a malformed field falls back to
//! its default instead of failing the whole response.

use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::authority::{AuthorityValidationError, DocumentStatus, StatusReport};
use super::error::EtaError;
use crate::core::{CustomerType, Invoice, InvoiceLine};

/// OAuth2 scope requested for document submission.
pub const TOKEN_SCOPE: &str = "InvoicingAPI";

/// Reason sent with every cancellation.
pub const CANCEL_REASON: &str = "Cancelled by issuer";

const GOVERNATE: &str = "CAI";
const REGION_CITY: &str = "Cairo";
const COUNTRY: &str = "EG";
const TAX_TYPE_VAT: &str = "T1";
const TAX_SUBTYPE_VAT: &str = "V009";

/// `POST /connect/token` body.
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub scope: &'a str,
}

/// `POST /connect/token` response. OAuth2 snake_case names, camelCase accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    #[serde(alias = "accessToken", deserialize_with = "lenient")]
    pub access_token: Option<String>,
    #[serde(alias = "tokenType", deserialize_with = "lenient")]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(alias = "expiresIn", deserialize_with = "lenient")]
    pub expires_in: u64,
}

/// `PUT /documents/{longId}/state` body.
#[derive(Debug, Serialize)]
pub struct CancelRequest<'a> {
    pub status: &'a str,
    pub reason: &'a str,
}

/// An invoice in the Authority's document schema.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaDocument {
    pub issuer: Issuer,
    pub receiver: Receiver,
    pub document_type: String,
    pub document_type_version: String,
    /// ISO-8601 UTC with a `Z` suffix.
    pub date_time_issued: String,
    pub taxpayer_activity_code: String,
    #[serde(rename = "internalID")]
    pub internal_id: String,
    pub invoice_lines: Vec<EtaLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_amount: Decimal,
    pub tax_totals: Vec<TaxTotal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub extra_discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_items_discount_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    pub name: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: IssuerAddress,
    pub activity_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerAddress {
    #[serde(rename = "branchID")]
    pub branch_id: String,
    pub governate: String,
    pub region_city: String,
    pub street: String,
    pub building_number: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receiver {
    pub name: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: ReceiverAddress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverAddress {
    pub country: String,
    pub governate: String,
    pub region_city: String,
    pub street: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaLine {
    pub description: String,
    pub item_type: String,
    /// GS1/EGS classification code.
    pub item_code: String,
    /// Seller's own item code.
    pub internal_code: String,
    pub unit_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sales_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub value_difference: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_taxable_fees: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub items_discount: Decimal,
    pub unit_value: UnitValue,
    pub discount: LineDiscount,
    pub taxable_items: Vec<TaxableItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitValue {
    pub currency_sold: String,
    #[serde(rename = "amountEGP", with = "rust_decimal::serde::float")]
    pub amount_egp: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineDiscount {
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxableItem {
    pub tax_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub sub_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTotal {
    pub tax_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl EtaDocument {
    /// Convert an invoice into the Authority's schema.
    pub fn from_invoice(invoice: &Invoice) -> Self {
        let supplier = &invoice.supplier;
        let customer = &invoice.customer;

        let (receiver_type, receiver_id) = match customer.customer_type {
            CustomerType::B2B => ("TRN", customer.tax_number.clone()),
            CustomerType::B2C => (
                "NAT",
                customer
                    .national_id
                    .clone()
                    .or_else(|| customer.passport_number.clone()),
            ),
            CustomerType::Foreign => ("F", customer.passport_number.clone()),
        };

        let discounts = invoice.total_discount_amount();
        let sub_total = invoice.sub_total();

        Self {
            issuer: Issuer {
                name: supplier.name.clone(),
                id: supplier.tax_number.clone(),
                kind: "TRN".to_string(),
                address: IssuerAddress {
                    branch_id: supplier.branch_id.clone(),
                    governate: GOVERNATE.to_string(),
                    region_city: REGION_CITY.to_string(),
                    street: supplier.address.clone(),
                    building_number: "1".to_string(),
                    country: COUNTRY.to_string(),
                },
                activity_code: supplier.activity_code.clone(),
            },
            receiver: Receiver {
                name: customer.name.clone(),
                id: receiver_id.unwrap_or_default(),
                kind: receiver_type.to_string(),
                address: ReceiverAddress {
                    country: COUNTRY.to_string(),
                    governate: GOVERNATE.to_string(),
                    region_city: REGION_CITY.to_string(),
                    street: customer
                        .address
                        .clone()
                        .unwrap_or_else(|| "Unknown".to_string()),
                },
            },
            document_type: invoice.document_type.code().to_string(),
            document_type_version: invoice.document_type_version.clone(),
            date_time_issued: invoice.issued_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            taxpayer_activity_code: supplier.activity_code.clone(),
            internal_id: invoice.number.clone(),
            invoice_lines: invoice
                .lines
                .iter()
                .map(|line| EtaLine::from_line(line, invoice))
                .collect(),
            total_discount_amount: discounts,
            total_sales_amount: sub_total,
            net_amount: sub_total,
            tax_totals: vec![TaxTotal {
                tax_type: TAX_TYPE_VAT.to_string(),
                amount: invoice.total_vat_amount(),
            }],
            total_amount: invoice.total_amount(),
            extra_discount_amount: Decimal::ZERO,
            total_items_discount_amount: discounts,
        }
    }
}

impl EtaLine {
    fn from_line(line: &InvoiceLine, invoice: &Invoice) -> Self {
        let net = line.net_amount();
        Self {
            description: line.description.clone(),
            item_type: "EGS".to_string(),
            item_code: line.gs1_code.clone(),
            internal_code: line.item_code.clone(),
            unit_type: line.unit_type.clone(),
            quantity: line.quantity,
            sales_total: net,
            total: line.line_total(),
            value_difference: Decimal::ZERO,
            total_taxable_fees: Decimal::ZERO,
            net_total: net,
            items_discount: line.discount_amount,
            unit_value: UnitValue {
                currency_sold: invoice.currency_code.clone(),
                amount_egp: line.unit_price * invoice.exchange_rate,
            },
            discount: LineDiscount {
                rate: line.discount_rate,
                amount: line.discount_amount,
            },
            taxable_items: vec![TaxableItem {
                tax_type: TAX_TYPE_VAT.to_string(),
                amount: line.vat_amount(),
                sub_type: TAX_SUBTYPE_VAT.to_string(),
                rate: line.vat_rate,
            }],
        }
    }
}

/// `POST /documentsubmissions` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionResponse {
    #[serde(deserialize_with = "lenient")]
    pub submission_uuid: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub acceptance_status: Option<String>,
    #[serde(deserialize_with = "lenient_errors")]
    pub valid_messages: Vec<AuthorityValidationError>,
    #[serde(deserialize_with = "lenient_errors")]
    pub error_messages: Vec<AuthorityValidationError>,
}

impl SubmissionResponse {
    /// Initial status: "Accepted" maps to valid, absent means "Submitted".
    pub fn status(&self) -> DocumentStatus {
        DocumentStatus::from_wire(self.acceptance_status.as_deref().unwrap_or("Submitted"))
    }
}

/// `GET /documentsubmissions/{uuid}` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusDocument {
    #[serde(deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub long_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub internal_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub validation_results: Option<ValidationResults>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidationResults {
    #[serde(deserialize_with = "lenient_errors")]
    pub errors: Vec<AuthorityValidationError>,
}

impl StatusDocument {
    pub fn into_report(self) -> StatusReport {
        StatusReport {
            status: DocumentStatus::from_wire(self.status.as_deref().unwrap_or("Unknown")),
            long_id: self.long_id,
            internal_id: self.internal_id,
            errors: self
                .validation_results
                .map(|results| results.errors)
                .unwrap_or_default(),
        }
    }
}

/// Parse a submission response body.
pub fn parse_submission_response(body: &[u8]) -> Result<SubmissionResponse, EtaError> {
    parse_object(body)
}

/// Parse a status document body into a report.
///
/// Only a body that is not a JSON object at all is an error; missing or
/// mistyped fields take their defaults.
pub fn parse_status_document(body: &[u8]) -> Result<StatusReport, EtaError> {
    parse_object::<StatusDocument>(body).map(StatusDocument::into_report)
}

fn parse_object<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, EtaError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| EtaError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(EtaError::Parse("expected a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| EtaError::Parse(e.to_string()))
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Error lists may hold objects, bare strings, or junk; junk is skipped.
fn lenient_errors<'de, D>(deserializer: D) -> Result<Vec<AuthorityValidationError>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(message) => Some(AuthorityValidationError::new("UNKNOWN", message)),
            Value::Object(_) => serde_json::from_value(item).ok(),
            _ => None,
        })
        .collect())
}
