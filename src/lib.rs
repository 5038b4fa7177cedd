//! E-IMZO Signing Bridge Library
//!
//! A self-contained library that signs Directum document payloads through the
//! local E-IMZO agent, timestamps them via the Multibank API, and returns the
//! result to Directum.

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

use std::path::PathBuf;
use std::time::Duration;

pub use adapters::agent::{EimzoClient, SigningAgent};
pub use adapters::timestamp_http_client::TimestampHttpConfig;
pub use domain::keycache::DEFAULT_KEY_TTL;
pub use domain::types::{AgentUrl, KeyId, Thumbprint, TimestampUrl};
pub use infra::config::{BridgeConfiguration, ConfigManager};
pub use infra::error::{SigningError, SigningResult};
pub use pipelines::SignWorkflow;
pub use services::{CertificateLocator, MultibankSigner};

/// Main signing configuration
#[derive(Debug, Clone)]
pub struct SigningConfig {
    /// Thumbprint of the signing certificate
    pub thumbprint: Thumbprint,
    /// WebSocket endpoint of the local agent
    pub agent_url: AgentUrl,
    /// API key for the agent handshake (None uses the public localhost key)
    pub agent_api_key: Option<String>,
    /// Timestamp service settings
    pub timestamp: TimestampHttpConfig,
    /// Certificate store directory (None uses `~/DSKEYS`)
    pub cert_store_dir: Option<PathBuf>,
    /// Freshness window for the cached key handle
    pub key_ttl: Duration,
    /// Timeout for agent and callback exchanges
    pub network_timeout: Duration,
}

impl SigningConfig {
    /// Configuration with defaults for everything but the thumbprint.
    #[must_use]
    pub fn new(thumbprint: Thumbprint) -> Self {
        Self {
            thumbprint,
            agent_url: AgentUrl::new(adapters::agent::DEFAULT_AGENT_ENDPOINT)
                .expect("default agent endpoint"),
            agent_api_key: None,
            timestamp: TimestampHttpConfig::default(),
            cert_store_dir: None,
            key_ttl: DEFAULT_KEY_TTL,
            network_timeout: Duration::from_secs(30),
        }
    }

    /// Build a signing configuration from the persisted bridge settings.
    pub fn from_bridge(thumbprint: Thumbprint, bridge: &BridgeConfiguration) -> SigningResult<Self> {
        let timestamp = TimestampHttpConfig {
            endpoint: TimestampUrl::new(&bridge.timestamp_endpoint)?,
            timeout: Duration::from_secs(bridge.network_timeout_seconds),
            retry_attempts: bridge.retry_attempts,
            retry_delay: Duration::from_secs(bridge.retry_delay_seconds),
        };
        Ok(Self {
            thumbprint,
            agent_url: AgentUrl::new(&bridge.agent_url)?,
            agent_api_key: if bridge.agent_api_key.is_empty() {
                None
            } else {
                Some(bridge.agent_api_key.clone())
            },
            timestamp,
            cert_store_dir: if bridge.cert_store_dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(&bridge.cert_store_dir))
            },
            key_ttl: Duration::from_secs(bridge.key_ttl_minutes * 60),
            network_timeout: Duration::from_secs(bridge.network_timeout_seconds),
        })
    }
}

/// Result of a signing run.
#[derive(Debug, Clone)]
pub enum SignOutcome {
    /// Multibank chain completed; Directum got the callback.
    Multibank { signature_hex: String },
    /// Raw content was signed into a PKCS7 container.
    Raw { pkcs7_64: String },
}

impl SignOutcome {
    /// The artifact string the caller hands back to Directum.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            SignOutcome::Multibank { signature_hex } => signature_hex,
            SignOutcome::Raw { pkcs7_64 } => pkcs7_64,
        }
    }
}

/// Main signing function - signs base64-encoded Directum data.
///
/// One-shot convenience; callers signing repeatedly should keep a
/// [`SignWorkflow`] around so the cached key handle is reused.
pub async fn sign_data(signing_data_b64: &str, config: SigningConfig) -> SigningResult<SignOutcome> {
    log::info!("Starting signing process for {}", config.thumbprint);
    let workflow = SignWorkflow::new(config)?;
    let outcome = workflow.sign_data(signing_data_b64).await?;
    match &outcome {
        SignOutcome::Multibank { .. } => log::info!("Multibank signing chain completed"),
        SignOutcome::Raw { .. } => log::info!("Raw PKCS7 signature created"),
    }
    Ok(outcome)
}
