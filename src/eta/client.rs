//! HTTP client for the Tax Authority's invoicing API.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info, warn};

use super::authority::{Authority, StatusReport, SubmissionReceipt};
use super::error::EtaError;
use super::ids;
use super::wire::*;
use crate::core::{EtaConfig, Invoice};

/// Tokens are refreshed this long before the Authority says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// Upper bound on how long a token is cached, whatever `expires_in` says.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Authority client speaking the real HTTP protocol.
///
/// Each call is bounded by the configured request timeout; a timeout is
/// reported as [`EtaError::Timeout`]. The bearer token is cached and shared
/// across calls.
pub struct EtaClient<R = ChaCha8Rng> {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
    token: tokio::sync::Mutex<Option<CachedToken>>,
    /// Source for the synthesized long/internal IDs.
    rng: Mutex<R>,
}

impl EtaClient {
    pub fn new(config: &EtaConfig) -> Result<Self, EtaError> {
        Self::with_rng(config, ChaCha8Rng::from_rng(&mut rand::rng()))
    }
}

impl<R: RngCore + Send> EtaClient<R> {
    pub fn with_rng(config: &EtaConfig, rng: R) -> Result<Self, EtaError> {
        if config.base_url.trim().is_empty() {
            return Err(EtaError::Config("ETA base URL is empty".into()));
        }
        let http = Client::builder()
            .build()
            .map_err(|e| EtaError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            timeout: config.request_timeout,
            token: tokio::sync::Mutex::new(None),
            rng: Mutex::new(rng),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn rng(&self) -> MutexGuard<'_, R> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a request and read its body, bounded by the request timeout.
    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String), EtaError> {
        let call = async {
            let response = request
                .send()
                .await
                .map_err(|e| EtaError::Network(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| EtaError::Network(e.to_string()))?;
            Ok::<_, EtaError>((status, body))
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(EtaError::Timeout(self.timeout)),
        }
    }

    async fn access_token(&self) -> Result<String, EtaError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.expires_at) {
            return Ok(token.value.clone());
        }

        let request = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            scope: TOKEN_SCOPE,
        };
        let (status, body) = self
            .execute(self.http.post(self.url("/connect/token")).json(&request))
            .await?;

        if !status.is_success() {
            return Err(EtaError::Authentication(format!("HTTP {status}: {body}")));
        }

        let response: TokenResponse =
            serde_json::from_str(&body).map_err(|e| EtaError::Authentication(e.to_string()))?;
        let value = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EtaError::Authentication("token response carried no access token".into()))?;

        let lifetime = Duration::from_secs(response.expires_in)
            .min(MAX_TOKEN_LIFETIME)
            .saturating_sub(TOKEN_REFRESH_MARGIN);
        debug!(lifetime_secs = lifetime.as_secs(), "obtained ETA access token");
        *cached = Instant::now()
            .checked_add(lifetime)
            .map(|expires_at| CachedToken {
                value: value.clone(),
                expires_at,
            });
        Ok(value)
    }
}

fn ensure_success(status: StatusCode, body: String) -> Result<String, EtaError> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(EtaError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl<R: RngCore + Send> Authority for EtaClient<R> {
    async fn submit(&self, invoice: &Invoice) -> Result<SubmissionReceipt, EtaError> {
        let token = self.access_token().await?;

        let document = EtaDocument::from_invoice(invoice);
        let payload = serde_json::to_vec(&document).map_err(|e| EtaError::Parse(e.to_string()))?;
        debug!(invoice = %invoice.number, bytes = payload.len(), "submitting document to ETA");

        let request = self
            .http
            .post(self.url("/documentsubmissions"))
            .bearer_auth(&token)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        let (status, body) = self.execute(request).await?;
        let body = ensure_success(status, body).inspect_err(|e| {
            warn!(invoice = %invoice.number, error = %e, "ETA rejected submission request");
        })?;

        let response = parse_submission_response(body.as_bytes())?;
        let (long_id, internal_id) = {
            let mut rng = self.rng();
            (ids::long_id(&mut *rng, Utc::now()), ids::internal_id(&mut *rng))
        };

        info!(
            invoice = %invoice.number,
            submission = response.submission_uuid.as_deref().unwrap_or("-"),
            "document submitted to ETA"
        );
        Ok(SubmissionReceipt {
            status: response.status(),
            submission_id: response.submission_uuid,
            long_id,
            internal_id,
            errors: response.error_messages,
            raw_response: body,
        })
    }

    async fn status(&self, submission_id: &str) -> Result<StatusReport, EtaError> {
        let token = self.access_token().await?;
        let request = self
            .http
            .get(self.url(&format!("/documentsubmissions/{submission_id}")))
            .bearer_auth(&token);
        let (status, body) = self.execute(request).await?;
        let body = ensure_success(status, body)?;
        debug!(submission = submission_id, bytes = body.len(), "received ETA status document");
        parse_status_document(body.as_bytes())
    }

    async fn cancel(&self, long_id: &str, reason: &str) -> Result<(), EtaError> {
        let token = self.access_token().await?;
        let request = self
            .http
            .put(self.url(&format!("/documents/{long_id}/state")))
            .bearer_auth(&token)
            .json(&CancelRequest {
                status: "cancelled",
                reason,
            });
        let (status, body) = self.execute(request).await?;
        ensure_success(status, body)?;
        info!(long_id, "document cancelled with ETA");
        Ok(())
    }
}
