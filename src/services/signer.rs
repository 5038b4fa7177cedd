//! Signing orchestrator.
//!
//! Drives the fixed call chain: resolve the key handle, create or extend the
//! PKCS7 container, fetch the timestamp token, attach it, and hand the result
//! back to Directum. The only recovery behavior is a single key-refresh retry
//! when the agent reports the handle gone.

use crate::adapters::agent::{Pkcs7Created, SigningAgent};
use crate::adapters::directum::DirectumClient;
use crate::adapters::timestamp_http_client::TimestampHttpClient;
use crate::domain::encoding;
use crate::domain::payload::SigningJob;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::certificate::CertIdentity;
use crate::services::key_resolver::KeyResolver;
use std::sync::Arc;

/// Orchestrator over the agent, the timestamp service and the callback.
pub struct MultibankSigner<A> {
    agent: Arc<A>,
    resolver: KeyResolver<A>,
    timestamp: TimestampHttpClient,
    directum: DirectumClient,
}

impl<A: SigningAgent> MultibankSigner<A> {
    #[must_use]
    pub fn new(
        agent: Arc<A>,
        resolver: KeyResolver<A>,
        timestamp: TimestampHttpClient,
        directum: DirectumClient,
    ) -> Self {
        Self {
            agent,
            resolver,
            timestamp,
            directum,
        }
    }

    /// Run the full Multibank chain for an extracted signing job.
    ///
    /// Returns the hex signature value, which is what Directum displays.
    pub async fn sign_job(
        &self,
        job: &SigningJob,
        identity: &CertIdentity,
    ) -> SigningResult<String> {
        let created = self
            .create_or_append(&job.agent_payload(), job.issigned, identity)
            .await?;

        log::info!("fetching timestamp for document {}", job.document_id);
        let token = self.timestamp.get_timestamp(&created.signature_hex).await?;

        let attached = self
            .agent
            .attach_timestamp(&created.pkcs7_64, &identity.serial_hex, &token)
            .await?;

        self.directum
            .import_sign(
                &job.address,
                &job.login,
                &job.password,
                job.document_id,
                &attached,
            )
            .await?;

        Ok(created.signature_hex)
    }

    /// Sign raw document bytes (no embedded job, no timestamp, no callback).
    ///
    /// Returns the base64 PKCS7 container.
    pub async fn sign_raw(&self, data: &[u8], identity: &CertIdentity) -> SigningResult<String> {
        let data_b64 = encoding::to_base64(data);
        let created = self.create_or_append(&data_b64, false, identity).await?;
        Ok(created.pkcs7_64)
    }

    /// PKCS7 create/append with the single key-refresh retry.
    ///
    /// A `KeyNotFound` rejection invalidates the cached handle, resolves a
    /// fresh one and repeats the call exactly once; any other error, and any
    /// error on the retry itself, is terminal.
    pub async fn create_or_append(
        &self,
        payload_b64: &str,
        issigned: bool,
        identity: &CertIdentity,
    ) -> SigningResult<Pkcs7Created> {
        let key_id = self.resolver.key_for(identity).await?;
        match self.call_pkcs7(payload_b64, issigned, &key_id).await {
            Err(SigningError::KeyNotFound) => {
                log::warn!("agent lost the key handle, refreshing and retrying once");
                self.resolver.invalidate().await;
                let key_id = self.resolver.refresh(identity).await?;
                self.call_pkcs7(payload_b64, issigned, &key_id).await
            }
            other => other,
        }
    }

    async fn call_pkcs7(
        &self,
        payload_b64: &str,
        issigned: bool,
        key_id: &crate::domain::types::KeyId,
    ) -> SigningResult<Pkcs7Created> {
        if issigned {
            self.agent.append_pkcs7(payload_b64, key_id).await
        } else {
            self.agent.create_pkcs7(payload_b64, key_id, false).await
        }
    }
}
