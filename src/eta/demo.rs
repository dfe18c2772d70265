//! Simulated Authority for demo deployments and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::distr::{Bernoulli, Distribution};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use super::authority::*;
use super::error::EtaError;
use super::ids;
use crate::core::{EtaConfig, Invoice};

/// Raw response recorded for simulated submissions.
pub const DEMO_RESPONSE: &str = "DEMO_MODE_RESPONSE";

/// Code of the single synthetic rejection error.
pub const DEMO_ERROR_CODE: &str = "DEMO";

/// Authority stand-in that never touches the network.
///
/// Each submission is accepted with the configured probability, drawn from
/// the injected RNG. Rejections carry exactly one synthetic error. Status
/// polls always report `Valid` and cancellations always succeed.
pub struct DemoAuthority<R = ChaCha8Rng> {
    rng: Mutex<R>,
    acceptance: Bernoulli,
    latency: Duration,
}

impl DemoAuthority {
    /// Build from configuration, seeded from `demo_seed` or OS entropy.
    pub fn from_config(config: &EtaConfig) -> Result<Self, EtaError> {
        let rng = match config.demo_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Self::with_rng(rng, config.demo_acceptance_probability, config.demo_latency)
    }
}

impl<R: RngCore + Send> DemoAuthority<R> {
    pub fn with_rng(rng: R, acceptance_probability: f64, latency: Duration) -> Result<Self, EtaError> {
        let acceptance = Bernoulli::new(acceptance_probability)
            .map_err(|e| EtaError::Config(format!("acceptance probability: {e}")))?;
        Ok(Self {
            rng: Mutex::new(rng),
            acceptance,
            latency,
        })
    }

    fn rng(&self) -> MutexGuard<'_, R> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl<R: RngCore + Send> Authority for DemoAuthority<R> {
    async fn submit(&self, invoice: &Invoice) -> Result<SubmissionReceipt, EtaError> {
        self.simulate_latency().await;

        let (accepted, submission_id, long_id, internal_id) = {
            let mut rng = self.rng();
            let accepted = self.acceptance.sample(&mut *rng);
            (
                accepted,
                ids::submission_uuid(&mut *rng).to_string(),
                ids::long_id(&mut *rng, Utc::now()),
                ids::internal_id(&mut *rng),
            )
        };
        info!(invoice = %invoice.number, accepted, "simulated ETA submission");

        let (status, errors) = if accepted {
            (DocumentStatus::Valid, Vec::new())
        } else {
            (
                DocumentStatus::Invalid,
                vec![AuthorityValidationError::new(
                    DEMO_ERROR_CODE,
                    "Sample validation error for testing",
                )],
            )
        };

        Ok(SubmissionReceipt {
            submission_id: Some(submission_id),
            status,
            long_id,
            internal_id,
            errors,
            raw_response: DEMO_RESPONSE.to_string(),
        })
    }

    async fn status(&self, _submission_id: &str) -> Result<StatusReport, EtaError> {
        self.simulate_latency().await;
        Ok(StatusReport {
            status: DocumentStatus::Valid,
            long_id: None,
            internal_id: None,
            errors: Vec::new(),
        })
    }

    async fn cancel(&self, long_id: &str, _reason: &str) -> Result<(), EtaError> {
        self.simulate_latency().await;
        info!(long_id, "simulated ETA cancellation");
        Ok(())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
