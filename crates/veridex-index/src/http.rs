//! HTTP layer: status mapping and retry.
//!
//! This is the only place status codes are interpreted; callers see
//! [`IndexError`] values. Transient failures are retried with jittered
//! exponential backoff, `Retry-After` honoured but capped.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};

/// Backoff cap for both rate-limit hints and exponential growth.
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// HTTP backend holding the reqwest client and retry policy.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpBackend {
    pub fn new(config: &IndexConfig) -> IndexResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IndexError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }

    /// GET a URL and return the body bytes, retrying transient failures.
    pub async fn get_bytes(&self, url: &str) -> IndexResult<Vec<u8>> {
        use rand::Rng;

        let mut retries = 0;
        loop {
            match self.get_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;

                    let backoff = match &e {
                        IndexError::RateLimited {
                            retry_after: Some(retry_after),
                        } => {
                            let capped = (*retry_after).min(BACKOFF_CAP);
                            let base_ms = capped.as_millis() as u64;
                            let jitter: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            Duration::from_millis(
                                (((base_ms as f64) * jitter).round() as u64).max(100),
                            )
                        }
                        _ => {
                            let base = Duration::from_secs(1 << retries).min(BACKOFF_CAP);
                            let jittered_ms =
                                rand::thread_rng().gen_range(0..=base.as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        url = %url,
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying index retrieval"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> IndexResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => {
                debug!(url = %url, "index retrieval ok");
                Ok(response.bytes().await?.to_vec())
            }

            404 => Err(IndexError::NotFound {
                url: url.to_string(),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(IndexError::RateLimited { retry_after })
            }

            _ if status == StatusCode::SERVICE_UNAVAILABLE
                || status.is_server_error() =>
            {
                Err(IndexError::Network {
                    message: format!("HTTP {} from {url}", status.as_u16()),
                })
            }

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(IndexError::Network {
                    message: format!("HTTP {}: {message}", status.as_u16()),
                })
            }
        }
    }
}
