//! `SignWorkflow` wires the call chain together for signing requests.
//!
//! Decodes the Directum input, locates the certificate, then dispatches to
//! the Multibank path (embedded `forsign` job) or the raw PKCS7 path. The
//! agent client and the key-handle cache live on the workflow, so repeated
//! calls on one workflow reuse a fresh handle instead of re-loading the key
//! container.

use crate::adapters::agent::{AgentTransport, EimzoClient, SigningAgent};
use crate::adapters::directum::DirectumClient;
use crate::adapters::timestamp_http_client::TimestampHttpClient;
use crate::domain::{encoding, payload};
use crate::infra::error::SigningResult;
use crate::services::certificate::CertificateLocator;
use crate::services::key_resolver::KeyResolver;
use crate::services::signer::MultibankSigner;
use crate::{SignOutcome, SigningConfig};
use std::sync::Arc;

pub struct SignWorkflow<A = EimzoClient> {
    config: SigningConfig,
    locator: CertificateLocator,
    signer: MultibankSigner<A>,
}

impl SignWorkflow {
    /// Build a workflow talking to the real agent at the configured endpoint.
    pub fn new(config: SigningConfig) -> SigningResult<Self> {
        let transport = AgentTransport::new(config.agent_url.clone())
            .with_timeout(config.network_timeout);
        let agent = match &config.agent_api_key {
            Some(key) => EimzoClient::with_api_key(config.agent_url.clone(), key.clone()),
            None => EimzoClient::new(config.agent_url.clone()),
        }
        .with_transport(transport);
        Self::with_agent(config, Arc::new(agent))
    }
}

impl<A: SigningAgent> SignWorkflow<A> {
    /// Build a workflow over an explicit agent implementation.
    pub fn with_agent(config: SigningConfig, agent: Arc<A>) -> SigningResult<Self> {
        let locator = match &config.cert_store_dir {
            Some(dir) => CertificateLocator::new(dir.clone()),
            None => CertificateLocator::default_store()?,
        };
        let resolver = KeyResolver::with_ttl(Arc::clone(&agent), config.key_ttl);
        let timestamp = TimestampHttpClient::new(config.timestamp.clone())?;
        let directum = DirectumClient::new(config.network_timeout)?;
        let signer = MultibankSigner::new(agent, resolver, timestamp, directum);
        Ok(Self {
            config,
            locator,
            signer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Sign base64-encoded Directum data with the certificate matching the
    /// configured thumbprint.
    pub async fn sign_data(&self, signing_data_b64: &str) -> SigningResult<SignOutcome> {
        let data = encoding::from_base64(signing_data_b64)?;

        let located = self.locator.locate(&self.config.thumbprint)?;
        let identity = located.identity()?;
        log::info!(
            "signing as '{}' (serial {})",
            identity.common_name,
            identity.serial_hex
        );

        // The marker check tolerates binary content; only the Multibank path
        // requires the data to actually be text.
        let text = String::from_utf8_lossy(&data);
        if payload::has_forsign_marker(&text) {
            let job = payload::extract_signing_job(&text)?;
            log::info!("multibank path for document {}", job.document_id);
            let signature_hex = self.signer.sign_job(&job, &identity).await?;
            Ok(SignOutcome::Multibank { signature_hex })
        } else {
            log::info!("raw signature path ({} bytes)", data.len());
            let pkcs7_64 = self.signer.sign_raw(&data, &identity).await?;
            Ok(SignOutcome::Raw { pkcs7_64 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Thumbprint;

    #[test]
    fn construct_workflow() {
        let config = SigningConfig::new(Thumbprint::new("A".repeat(40)).unwrap());
        let workflow = SignWorkflow::new(config).unwrap();
        assert_eq!(workflow.config().key_ttl.as_secs(), 30 * 60);
    }
}
