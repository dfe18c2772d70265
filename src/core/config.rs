//! Deployment configuration, read once from the environment.

use std::str::FromStr;
use std::time::Duration;

use super::error::InvoiceError;
use super::numbering::DEFAULT_PREFIX;
use super::types::{MAIN_BRANCH_ID, Supplier};

/// Default Authority API endpoint.
pub const DEFAULT_ETA_API_URL: &str = "https://api.invoicing.eta.gov.eg";

/// Client ID that forces demo mode regardless of the secret.
pub const DEMO_CLIENT_ID: &str = "DEMO_MODE";

/// Everything the core needs from its deployment.
#[derive(Debug, Clone)]
pub struct Config {
    /// The issuing company.
    pub supplier: Supplier,
    pub eta: EtaConfig,
    /// Prefix for generated invoice numbers.
    pub invoice_prefix: String,
}

/// Authority connection settings and submission policy.
#[derive(Clone)]
pub struct EtaConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Explicit demo switch (`ENVIRONMENT=demo`).
    pub demo: bool,
    /// Submission attempts allowed before an invoice is rejected for good.
    pub max_submission_attempts: u32,
    /// Chance that a simulated submission is accepted.
    pub demo_acceptance_probability: f64,
    /// Simulated network latency in demo mode.
    pub demo_latency: Duration,
    /// Fixed seed for the demo simulator; OS entropy when absent.
    pub demo_seed: Option<u64>,
    /// Per-request timeout for Authority calls.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for EtaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtaConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("demo", &self.demo)
            .field("max_submission_attempts", &self.max_submission_attempts)
            .field("demo_acceptance_probability", &self.demo_acceptance_probability)
            .field("demo_latency", &self.demo_latency)
            .field("demo_seed", &self.demo_seed)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ETA_API_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            demo: false,
            max_submission_attempts: 3,
            demo_acceptance_probability: 0.9,
            demo_latency: Duration::from_millis(500),
            demo_seed: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EtaConfig {
    /// Whether Authority calls are simulated.
    ///
    /// True when demo mode is requested explicitly, when the client ID is
    /// the demo marker, or when either credential is missing.
    pub fn is_demo(&self) -> bool {
        self.demo
            || self.client_id == DEMO_CLIENT_ID
            || self.client_id.trim().is_empty()
            || self.client_secret.trim().is_empty()
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, InvoiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InvoiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let defaults = EtaConfig::default();

        let supplier = Supplier::new(
            get("SUPPLIER_NAME", "Test Company Ltd"),
            get("SUPPLIER_TAX_NUMBER", "123456789"),
            get("SUPPLIER_ADDRESS", "123 Business St, Cairo, Egypt"),
            get("SUPPLIER_ACTIVITY_CODE", "4620"),
        )
        .branch(get("SUPPLIER_BRANCH_ID", MAIN_BRANCH_ID));

        let demo_acceptance_probability = parse_or(
            &lookup,
            "ETA_DEMO_ACCEPTANCE_PROBABILITY",
            defaults.demo_acceptance_probability,
        )?;
        if !(0.0..=1.0).contains(&demo_acceptance_probability) {
            return Err(InvoiceError::Config(format!(
                "ETA_DEMO_ACCEPTANCE_PROBABILITY must be within [0, 1], got {demo_acceptance_probability}"
            )));
        }

        let max_submission_attempts = parse_or(
            &lookup,
            "ETA_MAX_SUBMISSION_ATTEMPTS",
            defaults.max_submission_attempts,
        )?;
        if max_submission_attempts == 0 {
            return Err(InvoiceError::Config(
                "ETA_MAX_SUBMISSION_ATTEMPTS must be at least 1".into(),
            ));
        }

        let eta = EtaConfig {
            base_url: get("ETA_API_URL", DEFAULT_ETA_API_URL),
            client_id: get("ETA_CLIENT_ID", ""),
            client_secret: get("ETA_CLIENT_SECRET", ""),
            demo: lookup("ENVIRONMENT").is_some_and(|e| e.eq_ignore_ascii_case("demo")),
            max_submission_attempts,
            demo_acceptance_probability,
            demo_latency: Duration::from_millis(parse_or(&lookup, "ETA_DEMO_LATENCY_MS", 500)?),
            demo_seed: lookup("ETA_DEMO_SEED")
                .map(|s| parse_value("ETA_DEMO_SEED", &s))
                .transpose()?,
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "ETA_REQUEST_TIMEOUT_SECS",
                30,
            )?),
        };

        Ok(Self {
            supplier,
            eta,
            invoice_prefix: get("INVOICE_PREFIX", DEFAULT_PREFIX),
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, InvoiceError> {
    raw.trim()
        .parse()
        .map_err(|_| InvoiceError::Config(format!("{key} has an invalid value '{raw}'")))
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, InvoiceError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
