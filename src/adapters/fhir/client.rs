//! Resilient FHIR delivery
//!
//! Posts a JSON payload, retrying on `429`, `5xx` and transport failures with
//! exponential backoff plus jitter. Payloads that are not delivered go to a
//! [`DeadLetterStore`]. HTTP failures never surface as errors: the caller
//! gets a [`DeliveryOutcome`].

use super::deadletter::{DeadLetterStore, FsDeadLetterStore};
use crate::config::{DeliveryConfig, SecretString};
use crate::domain::{DeliveryError, Result};
use rand::Rng;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

const FHIR_JSON: &str = "application/fhir+json";

/// Backoff schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each later one
    pub backoff_base: Duration,
    /// Upper bound of the random delay added to each backoff
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Total attempts allowed
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Deterministic part of the delay after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }

    /// Backoff plus uniform jitter
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
        };
        self.backoff(attempt) + jitter
    }
}

/// Result of a delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    /// A 2xx response was received
    pub delivered: bool,
    /// Last HTTP status, 0 when the endpoint never answered
    pub status_code: u16,
    /// Wall-clock time from the first attempt to the last
    pub latency_ms: u64,
    /// Attempts made
    pub attempts: u32,
}

fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// FHIR endpoint client with retry and dead-letter handling
pub struct FhirDeliveryClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<SecretString>,
    timeout: Duration,
    policy: RetryPolicy,
    dead_letters: Arc<dyn DeadLetterStore>,
}

impl FhirDeliveryClient {
    /// Create a client
    ///
    /// `timeout` bounds each attempt, not the whole retry sequence.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::InvalidEndpoint`] unless the endpoint is an
    /// `http(s)://` URL, or [`DeliveryError::ClientBuild`] when the HTTP client
    /// cannot be created.
    pub fn new(
        endpoint: &str,
        timeout: Duration,
        policy: RetryPolicy,
        dead_letters: Arc<dyn DeadLetterStore>,
    ) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(DeliveryError::InvalidEndpoint(endpoint).into());
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| DeliveryError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            token: None,
            timeout,
            policy,
            dead_letters,
        })
    }

    /// Create a client from the `[delivery]` configuration section
    pub fn from_config(config: &DeliveryConfig) -> Result<Self> {
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        };
        let store = Arc::new(FsDeadLetterStore::new(&config.deadletter_dir));
        let client = Self::new(
            &config.endpoint,
            Duration::from_secs(config.timeout_seconds),
            policy,
            store,
        )?;
        Ok(match &config.token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: SecretString) -> Self {
        if !token.expose_secret().is_empty() {
            self.token = Some(token);
        }
        self
    }

    /// Endpoint with any trailing `/` removed
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn request(&self, body: String) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, FHIR_JSON)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .header("Prefer", "handling=strict")
            .body(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        request
    }

    /// Deliver a payload
    ///
    /// Never fails: a payload that is not delivered is written to the
    /// dead-letter store and reported through `delivered == false`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hl7bridge::adapters::fhir::{FhirDeliveryClient, FsDeadLetterStore, RetryPolicy};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> hl7bridge::domain::Result<()> {
    /// let client = FhirDeliveryClient::new(
    ///     "https://fhir.example.com/fhir",
    ///     Duration::from_secs(20),
    ///     RetryPolicy::default(),
    ///     Arc::new(FsDeadLetterStore::new("out/deadletter")),
    /// )?;
    /// let outcome = client
    ///     .post(&serde_json::json!({"resourceType": "Bundle", "id": "b-1", "type": "transaction"}))
    ///     .await;
    /// println!("delivered={} status={}", outcome.delivered, outcome.status_code);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn post(&self, payload: &Value) -> DeliveryOutcome {
        let body = payload.to_string();
        let max_attempts = self.policy.max_attempts();
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last_response: Option<(u16, String)> = None;

        loop {
            attempts += 1;
            let failure = match self.request(body.clone()).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    last_response = Some((status, text));
                    if !is_retryable(status) {
                        break;
                    }
                    format!("HTTP {status}")
                }
                Err(e) => e.to_string(),
            };

            if attempts >= max_attempts {
                break;
            }
            let delay = self.policy.delay(attempts);
            crate::log_retry_attempt!(
                attempts,
                self.policy.max_retries,
                delay.as_millis() as u64,
                failure
            );
            tokio::time::sleep(delay).await;
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        let status_code = last_response.as_ref().map(|(s, _)| *s).unwrap_or(0);
        let delivered = (200..300).contains(&status_code);

        if delivered {
            tracing::info!(
                endpoint = %self.endpoint,
                status = status_code,
                attempts = attempts,
                latency_ms = latency_ms,
                "Payload delivered"
            );
        } else {
            tracing::error!(
                endpoint = %self.endpoint,
                status = status_code,
                attempts = attempts,
                latency_ms = latency_ms,
                "Delivery failed"
            );
            let response_body = last_response.as_ref().map(|(_, b)| b.as_str()).unwrap_or("");
            if let Err(e) = self.dead_letters.store(payload, response_body).await {
                tracing::error!(error = %e, "Failed to write dead-letter artifacts");
            }
        }

        DeliveryOutcome {
            delivered,
            status_code,
            latency_ms,
            attempts,
        }
    }
}
