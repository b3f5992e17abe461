use crate::domain::health::ServiceHealth;
use crate::domain::payment::{Amount, Payment, Processor};
use crate::domain::ports::{HealthProbe, Outcome, Upstream};
use crate::error::{Result, RouterError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentBody<'a> {
    correlation_id: &'a str,
    amount: Amount,
    requested_at: DateTime<Utc>,
}

/// HTTP adapter for one payment processor.
///
/// Serves both ports the router needs from a processor: payment submission
/// (`POST {base}/payments`) and health probing
/// (`GET {base}/payments/service-health`). Every call carries its own timeout.
#[derive(Debug, Clone)]
pub struct HttpProcessor {
    processor: Processor,
    payments_url: String,
    health_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl HttpProcessor {
    pub fn new(processor: Processor, base_url: &str, client: reqwest::Client) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            processor,
            payments_url: format!("{base_url}/payments"),
            health_url: format!("{base_url}/payments/service-health"),
            client,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }
}

/// Maps a processor's reply to a payment submission onto an [`Outcome`].
pub fn classify(status: StatusCode) -> Outcome {
    match status {
        StatusCode::OK => Outcome::Accepted,
        StatusCode::UNPROCESSABLE_ENTITY => Outcome::Rejected,
        _ => Outcome::TransientFailure,
    }
}

#[async_trait]
impl Upstream for HttpProcessor {
    fn processor(&self) -> Processor {
        self.processor
    }

    async fn send(&self, payment: &mut Payment) -> Outcome {
        let requested_at = payment.stamp(Utc::now());
        let body = PaymentBody {
            correlation_id: &payment.correlation_id,
            amount: payment.amount,
            requested_at,
        };

        let response = self
            .client
            .post(&self.payments_url)
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await;

        match response {
            Ok(r) => {
                let outcome = classify(r.status());
                if outcome == Outcome::TransientFailure {
                    debug!(
                        processor = %self.processor,
                        correlation_id = %payment.correlation_id,
                        status = r.status().as_u16(),
                        "processor returned an unexpected status"
                    );
                }
                outcome
            }
            Err(e) => {
                debug!(
                    processor = %self.processor,
                    correlation_id = %payment.correlation_id,
                    timeout = e.is_timeout(),
                    "payment request failed: {}",
                    e
                );
                Outcome::TransientFailure
            }
        }
    }
}

#[async_trait]
impl HealthProbe for HttpProcessor {
    fn processor(&self) -> Processor {
        self.processor
    }

    async fn probe(&self) -> Result<ServiceHealth> {
        let response = self
            .client
            .get(&self.health_url)
            .timeout(self.health_timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(processor = %self.processor, "health check rate limited");
                Err(RouterError::ProbeInconclusive(
                    "429 Too Many Requests".to_string(),
                ))
            }
            status if !status.is_success() => Err(RouterError::ProbeInconclusive(format!(
                "unexpected status {status}"
            ))),
            _ => Ok(response.json::<ServiceHealth>().await?),
        }
    }
}
