//! HTTP client adapter for the Multibank timestamp service.
//!
//! Provides bounded retry over the single reference endpoint.

use crate::domain::types::TimestampUrl;
use crate::infra::error::{SigningError, SigningResult};
use serde::Deserialize;
use std::time::Duration;

/// Default Multibank timestamp endpoint.
pub const DEFAULT_TIMESTAMP_ENDPOINT: &str =
    "https://api-staging.multibank.uz/api/references/v1/timestamp";

/// Configuration for timestamp HTTP operations.
#[derive(Debug, Clone)]
pub struct TimestampHttpConfig {
    pub endpoint: TimestampUrl,
    pub timeout: Duration,
    pub retry_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for TimestampHttpConfig {
    fn default() -> Self {
        Self {
            endpoint: TimestampUrl::new(DEFAULT_TIMESTAMP_ENDPOINT).expect("default endpoint"),
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Envelope the timestamp service wraps its token in.
#[derive(Debug, Deserialize)]
struct TimestampEnvelope {
    data: String,
}

/// HTTP adapter fetching timestamp tokens for a signature value.
pub struct TimestampHttpClient {
    cfg: TimestampHttpConfig,
    http: reqwest::Client,
}

impl TimestampHttpClient {
    /// Create a new client from config.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(cfg: TimestampHttpConfig) -> SigningResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent("eimzo-signer/0.1")
            .build()?;
        Ok(Self { cfg, http })
    }

    /// Fetch the timestamp token for a hex signature value.
    pub async fn get_timestamp(&self, signature_hex: &str) -> SigningResult<String> {
        let mut last_err: Option<SigningError> = None;
        for attempt in 1..=self.cfg.retry_attempts {
            log::debug!(
                "timestamp attempt {} of {} -> {}",
                attempt,
                self.cfg.retry_attempts,
                self.cfg.endpoint.as_str()
            );
            match self.single_get(signature_hex).await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    log::warn!("timestamp attempt {attempt} failed: {e}");
                    last_err = Some(e);
                    if attempt < self.cfg.retry_attempts {
                        tokio::time::sleep(self.cfg.retry_delay).await;
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| SigningError::TimestampError("All attempts failed".into())))
    }

    async fn single_get(&self, signature_hex: &str) -> SigningResult<String> {
        let resp = self
            .http
            .get(self.cfg.endpoint.as_str())
            .query(&[("signature_hex", signature_hex)])
            .send()
            .await
            .map_err(|e| SigningError::TimestampError(format!("HTTP error: {e}")))?;
        if !resp.status().is_success() {
            return Err(SigningError::TimestampError(format!(
                "HTTP {} from {}",
                resp.status(),
                self.cfg.endpoint.as_str()
            )));
        }
        let envelope: TimestampEnvelope = resp
            .json()
            .await
            .map_err(|e| SigningError::TimestampError(format!("Malformed reply: {e}")))?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_reference_api() {
        let cfg = TimestampHttpConfig::default();
        assert!(cfg.endpoint.as_str().contains("/references/v1/timestamp"));
        assert_eq!(cfg.retry_attempts, 3);
    }

    #[test]
    fn envelope_parses() {
        let envelope: TimestampEnvelope =
            serde_json::from_str(r#"{"data":"dG9rZW4="}"#).unwrap();
        assert_eq!(envelope.data, "dG9rZW4=");
    }
}
