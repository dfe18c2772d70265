use chrono::{DateTime, Utc};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::error::InvoiceError;

/// Default invoice number prefix.
pub const DEFAULT_PREFIX: &str = "INV";

/// Timestamped invoice number generator.
///
/// Generates numbers in the format `{prefix}-{yyyyMMdd}-{HHmmss}-{nnnn}`,
/// e.g. "INV-20240615-103000-4821", where `nnnn` is a random suffix in
/// `1000..=9998`.
///
/// Uniqueness is probabilistic. Two numbers issued within the same second
/// can collide; rejecting a duplicate is the job of the store's
/// conditional write.
#[derive(Debug, Clone)]
pub struct InvoiceNumberGenerator<R = ChaCha8Rng> {
    prefix: String,
    rng: R,
}

impl InvoiceNumberGenerator {
    /// Create a generator seeded from the thread RNG.
    pub fn new(prefix: impl Into<String>) -> Result<Self, InvoiceError> {
        Self::with_rng(prefix, ChaCha8Rng::from_rng(&mut rand::rng()))
    }
}

impl<R: RngCore> InvoiceNumberGenerator<R> {
    /// Create a generator drawing suffixes from `rng`.
    pub fn with_rng(prefix: impl Into<String>, rng: R) -> Result<Self, InvoiceError> {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(InvoiceError::Numbering("prefix must not be empty".into()));
        }
        if prefix.len() > 20 {
            return Err(InvoiceError::Numbering(
                "prefix cannot exceed 20 characters".into(),
            ));
        }
        Ok(Self { prefix, rng })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate the number for an invoice issued at `now`.
    pub fn next_number(&mut self, now: DateTime<Utc>) -> String {
        let suffix: u16 = self.rng.random_range(1000..9999);
        format!("{}-{}-{suffix}", self.prefix, now.format("%Y%m%d-%H%M%S"))
    }
}

/// Generate an invoice number for the current UTC time.
///
/// Falls back to [`DEFAULT_PREFIX`] when `prefix` is empty or too long.
pub fn generate_invoice_number(prefix: &str) -> String {
    let mut generator = InvoiceNumberGenerator::with_rng(prefix, rand::rng()).unwrap_or_else(|_| {
        InvoiceNumberGenerator {
            prefix: DEFAULT_PREFIX.to_string(),
            rng: rand::rng(),
        }
    });
    generator.next_number(Utc::now())
}
