#![cfg(feature = "eta")]

use std::time::Duration;

use chrono::{TimeZone, Utc};
use egyvat::core::*;
use egyvat::eta::*;
use mockito::{Matcher, Server};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal_macros::dec;
use serde_json::json;

const TOKEN_BODY: &str = r#"{"access_token": "tok-1", "token_type": "Bearer", "expires_in": 3600}"#;

fn invoice() -> Invoice {
    InvoiceBuilder::new("INV-20240615-103000-1234", Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap())
        .supplier(Supplier::new("Test Company Ltd", "123456789", "Cairo", "4620"))
        .customer(Customer::business("Nile Trading", "100000002").address("Giza"))
        .add_line(
            LineBuilder::new("Software license", "6220100000", dec!(3), dec!(1200))
                .item_code("SW-1")
                .discount_rate(dec!(10))
                .build(),
        )
        .build()
        .unwrap()
}

fn client_for(url: &str) -> EtaClient {
    let config = EtaConfig {
        base_url: url.to_string(),
        client_id: "client".into(),
        client_secret: "secret".into(),
        request_timeout: Duration::from_secs(5),
        ..EtaConfig::default()
    };
    EtaClient::with_rng(&config, ChaCha8Rng::seed_from_u64(1)).unwrap()
}

// --- Document schema ---

#[test]
fn document_uses_authority_field_names() {
    let doc = serde_json::to_value(EtaDocument::from_invoice(&invoice())).unwrap();

    assert_eq!(doc["issuer"]["type"], "TRN");
    assert_eq!(doc["issuer"]["id"], "123456789");
    assert_eq!(doc["issuer"]["address"]["branchID"], "0");
    assert_eq!(doc["receiver"]["type"], "TRN");
    assert_eq!(doc["receiver"]["id"], "100000002");
    assert_eq!(doc["receiver"]["address"]["street"], "Giza");
    assert_eq!(doc["documentType"], "I");
    assert_eq!(doc["dateTimeIssued"], "2024-06-15T10:30:00Z");
    assert_eq!(doc["internalID"], "INV-20240615-103000-1234");
    assert_eq!(doc["taxpayerActivityCode"], "4620");

    let line = &doc["invoiceLines"][0];
    assert_eq!(line["itemType"], "EGS");
    assert_eq!(line["itemCode"], "6220100000");
    assert_eq!(line["internalCode"], "SW-1");
    assert_eq!(line["salesTotal"].as_f64(), Some(3240.0));
    assert_eq!(line["unitValue"]["currencySold"], "EGP");
    assert_eq!(line["unitValue"]["amountEGP"].as_f64(), Some(1200.0));
    assert_eq!(line["taxableItems"][0]["taxType"], "T1");
    assert_eq!(line["taxableItems"][0]["subType"], "V009");
    assert_eq!(line["taxableItems"][0]["amount"].as_f64(), Some(453.6));

    assert_eq!(doc["totalDiscountAmount"].as_f64(), Some(360.0));
    assert_eq!(doc["taxTotals"][0]["amount"].as_f64(), Some(453.6));
    assert_eq!(doc["totalAmount"].as_f64(), Some(3693.6));
}

#[test]
fn receiver_identity_follows_customer_type() {
    let mut inv = invoice();
    inv.customer = Customer::consumer("Ahmed Hassan", "29001010100012");
    let doc = EtaDocument::from_invoice(&inv);
    assert_eq!((doc.receiver.kind.as_str(), doc.receiver.id.as_str()), ("NAT", "29001010100012"));
    assert_eq!(doc.receiver.address.street, "Unknown");

    inv.customer = Customer::foreign("John Smith", "X1234567");
    let doc = EtaDocument::from_invoice(&inv);
    assert_eq!((doc.receiver.kind.as_str(), doc.receiver.id.as_str()), ("F", "X1234567"));
}

#[test]
fn foreign_currency_unit_value_in_pounds() {
    let mut inv = invoice();
    inv.currency_code = "USD".into();
    inv.exchange_rate = dec!(48.5);
    let doc = EtaDocument::from_invoice(&inv);
    assert_eq!(doc.invoice_lines[0].unit_value.currency_sold, "USD");
    assert_eq!(doc.invoice_lines[0].unit_value.amount_egp, dec!(58200));
}

// --- HTTP client ---

#[tokio::test]
async fn submit_authenticates_and_posts_document() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/connect/token")
        .match_body(Matcher::PartialJson(json!({
            "grant_type": "client_credentials",
            "client_id": "client",
            "scope": "InvoicingAPI"
        })))
        .with_status(200)
        .with_body(TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;
    let submit = server
        .mock("POST", "/documentsubmissions")
        .match_header("authorization", "Bearer tok-1")
        .match_body(Matcher::PartialJson(json!({"internalID": "INV-20240615-103000-1234"})))
        .with_status(202)
        .with_body(r#"{"submissionUuid": "sub-42", "acceptanceStatus": "Submitted"}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let receipt = client.submit(&invoice()).await.unwrap();

    assert_eq!(receipt.submission_id.as_deref(), Some("sub-42"));
    assert_eq!(receipt.status, DocumentStatus::InProgress("Submitted".into()));
    assert!(receipt.long_id.starts_with("ETA"));
    assert!(receipt.internal_id.starts_with("INT"));
    assert!(receipt.raw_response.contains("sub-42"));
    assert!(!client.is_simulated());
    token.assert_async().await;
    submit.assert_async().await;
}

#[tokio::test]
async fn submission_errors_are_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;
    server
        .mock("POST", "/documentsubmissions")
        .with_status(200)
        .with_body(
            r#"{"submissionUuid": "sub-1", "acceptanceStatus": "Invalid",
                "errorMessages": [{"code": "E42", "message": "bad receiver"}, "plain text"]}"#,
        )
        .create_async()
        .await;

    let receipt = client_for(&server.url()).submit(&invoice()).await.unwrap();
    assert_eq!(receipt.status, DocumentStatus::Invalid);
    assert_eq!(receipt.errors.len(), 2);
    assert_eq!(receipt.errors[0].to_string(), "E42: bad receiver");
    assert_eq!(receipt.errors[1].code, "UNKNOWN");
}

#[tokio::test]
async fn token_is_cached_across_calls() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/connect/token")
        .with_body(TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;
    let status = server
        .mock("GET", "/documentsubmissions/sub-1")
        .with_body(r#"{"status": "InProgress"}"#)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server.url());
    for _ in 0..2 {
        let report = client.status("sub-1").await.unwrap();
        assert_eq!(report.status, DocumentStatus::InProgress("InProgress".into()));
    }
    token.assert_async().await;
    status.assert_async().await;
}

#[tokio::test]
async fn short_lived_token_is_refreshed() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/connect/token")
        .with_body(r#"{"access_token": "tok-1", "expires_in": 30}"#)
        .expect(2)
        .create_async()
        .await;
    server
        .mock("GET", "/documentsubmissions/sub-1")
        .with_body(r#"{"status": "Valid"}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    client.status("sub-1").await.unwrap();
    client.status("sub-1").await.unwrap();
    token.assert_async().await;
}

#[tokio::test]
async fn huge_token_lifetime_is_capped() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/connect/token")
        .with_body(r#"{"access_token": "tok-1", "expires_in": 18446744073709551615}"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/documentsubmissions/abc")
        .with_body(r#"{"status": "Valid"}"#)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server.url());
    for _ in 0..2 {
        let report = client.status("abc").await.unwrap();
        assert_eq!(report.status, DocumentStatus::Valid);
    }
    token.assert_async().await;
}

#[tokio::test]
async fn status_with_partial_errors() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/documentsubmissions/sub-9")
        .with_body(
            r#"{"status": "Invalid", "longId": 17,
                "validationResults": {"errors": [{"message": "missing code"}, null]}}"#,
        )
        .create_async()
        .await;

    let report = client_for(&server.url()).status("sub-9").await.unwrap();
    assert_eq!(report.status, DocumentStatus::Invalid);
    assert_eq!(report.long_id, None);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, "UNKNOWN");
    assert_eq!(report.errors[0].message, "missing code");
}

#[tokio::test]
async fn cancel_puts_document_state() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;
    let cancel = server
        .mock("PUT", "/documents/ETA20240615123456/state")
        .match_header("authorization", "Bearer tok-1")
        .match_body(Matcher::Json(json!({"status": "cancelled", "reason": CANCEL_REASON})))
        .with_status(200)
        .create_async()
        .await;

    client_for(&server.url())
        .cancel("ETA20240615123456", CANCEL_REASON)
        .await
        .unwrap();
    cancel.assert_async().await;
}

#[tokio::test]
async fn non_success_status_becomes_http_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;
    server
        .mock("PUT", "/documents/L1/state")
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;

    let err = client_for(&server.url()).cancel("L1", CANCEL_REASON).await.unwrap_err();
    assert!(matches!(&err, EtaError::Http { status: 503, body } if body == "maintenance"));
    assert!(err.is_retryable());
    assert_eq!(err.to_string(), "ETA API error: 503 - maintenance");
}

#[tokio::test]
async fn authentication_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_status(401)
        .with_body("invalid_client")
        .create_async()
        .await;

    let err = client_for(&server.url()).submit(&invoice()).await.unwrap_err();
    assert!(matches!(err, EtaError::Authentication(ref msg) if msg.contains("invalid_client")));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn token_response_without_token_fails_authentication() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_body(r#"{"expires_in": 3600}"#)
        .create_async()
        .await;

    let err = client_for(&server.url()).status("sub-1").await.unwrap_err();
    assert!(matches!(err, EtaError::Authentication(_)));
}

#[tokio::test]
async fn unreachable_host_is_retryable_network_error() {
    let err = client_for("http://127.0.0.1:1").status("sub-1").await.unwrap_err();
    assert!(matches!(err, EtaError::Network(_)));
    assert!(err.is_retryable());
}

// --- Demo mode ---

fn demo(seed: u64, probability: f64) -> DemoAuthority {
    DemoAuthority::with_rng(ChaCha8Rng::seed_from_u64(seed), probability, Duration::ZERO).unwrap()
}

#[tokio::test]
async fn demo_accepts_with_certainty() {
    let receipt = demo(3, 1.0).submit(&invoice()).await.unwrap();
    assert_eq!(receipt.status, DocumentStatus::Valid);
    assert!(receipt.errors.is_empty());
    assert_eq!(receipt.raw_response, DEMO_RESPONSE);
    assert!(receipt.long_id.starts_with("ETA"));
    assert!(receipt.submission_id.is_some());
}

#[tokio::test]
async fn demo_rejection_carries_one_error() {
    let receipt = demo(3, 0.0).submit(&invoice()).await.unwrap();
    assert_eq!(receipt.status, DocumentStatus::Invalid);
    assert_eq!(receipt.errors.len(), 1);
    assert_eq!(receipt.errors[0].code, DEMO_ERROR_CODE);
}

/// Yields the same word forever.
struct FixedRng(u64);

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        self.0 as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for (i, b) in dst.iter_mut().enumerate() {
            *b = self.0.to_le_bytes()[i % 8];
        }
    }
}

#[tokio::test]
async fn demo_draw_decides_at_default_probability() {
    let low = DemoAuthority::with_rng(FixedRng(0), 0.9, Duration::ZERO).unwrap();
    assert_eq!(low.submit(&invoice()).await.unwrap().status, DocumentStatus::Valid);

    let high = DemoAuthority::with_rng(FixedRng(u64::MAX), 0.9, Duration::ZERO).unwrap();
    let receipt = high.submit(&invoice()).await.unwrap();
    assert_eq!(receipt.status, DocumentStatus::Invalid);
    assert_eq!(receipt.errors[0].message, "Sample validation error for testing");
}

#[tokio::test]
async fn demo_is_deterministic_for_a_seed() {
    let (a, b) = (demo(11, 0.5), demo(11, 0.5));
    for _ in 0..5 {
        let ra = a.submit(&invoice()).await.unwrap();
        let rb = b.submit(&invoice()).await.unwrap();
        assert_eq!(ra.status, rb.status);
        assert_eq!(ra.submission_id, rb.submission_id);
        assert_eq!(ra.internal_id, rb.internal_id);
    }
}

#[tokio::test]
async fn demo_status_and_cancel_always_succeed() {
    let authority = demo(1, 0.9);
    assert_eq!(authority.status("anything").await.unwrap().status, DocumentStatus::Valid);
    authority.cancel("L1", CANCEL_REASON).await.unwrap();
    assert!(authority.is_simulated());
}

#[test]
fn connect_picks_demo_without_credentials() {
    let authority = connect(&EtaConfig::default()).unwrap();
    assert!(authority.is_simulated());

    let config = EtaConfig {
        client_id: "client".into(),
        client_secret: "secret".into(),
        ..EtaConfig::default()
    };
    assert!(!connect(&config).unwrap().is_simulated());
}
