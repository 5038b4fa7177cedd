//! Typed client for the E-IMZO agent.
//!
//! Wraps the per-exchange transport with the JSON protocol and a one-time
//! API-key handshake, and exposes the agent operations the signing chain
//! needs.

use super::protocol::{
    operations, AgentRequest, AgentResponse, PfxCertificateEntry, Pkcs7Created, LOCALHOST_API_KEY,
    PLUGIN_PFX, PLUGIN_PKCS7,
};
use super::transport::AgentTransport;
use super::SigningAgent;
use crate::domain::types::{AgentUrl, KeyId};
use crate::infra::error::{SigningError, SigningResult};
use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Default local agent endpoint.
pub const DEFAULT_AGENT_ENDPOINT: &str = "ws://127.0.0.1:64646/service/cryptapi";

/// Client for the local E-IMZO agent.
pub struct EimzoClient {
    transport: AgentTransport,
    api_key: String,
    handshake: OnceCell<()>,
}

impl EimzoClient {
    /// Create a client for the given endpoint with the public localhost key.
    #[must_use]
    pub fn new(endpoint: AgentUrl) -> Self {
        Self::with_api_key(endpoint, LOCALHOST_API_KEY)
    }

    /// Create a client with a custom API key.
    #[must_use]
    pub fn with_api_key(endpoint: AgentUrl, api_key: impl Into<String>) -> Self {
        Self {
            transport: AgentTransport::new(endpoint),
            api_key: api_key.into(),
            handshake: OnceCell::new(),
        }
    }

    /// Replace the transport (used to adjust timeouts).
    #[must_use]
    pub fn with_transport(mut self, transport: AgentTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Perform the API-key handshake once per client.
    async fn ensure_handshake(&self) -> SigningResult<()> {
        self.handshake
            .get_or_try_init(|| async {
                let request =
                    AgentRequest::apikey(self.transport.endpoint().host(), &self.api_key);
                let response = self.send_raw(&request).await?;
                if response.success {
                    log::debug!("agent accepted the API key");
                    Ok(())
                } else {
                    Err(SigningError::AgentRejected(format!(
                        "API key rejected: {}",
                        response.reason_or_unknown()
                    )))
                }
            })
            .await
            .map(|()| ())
    }

    /// One serialized request/response exchange, without the handshake.
    async fn send_raw(&self, request: &AgentRequest) -> SigningResult<AgentResponse> {
        let payload = serde_json::to_string(request).map_err(|e| {
            SigningError::AgentError(format!("Failed to serialize agent request: {e}"))
        })?;
        log::debug!("agent call: {} / {}", request.plugin.as_deref().unwrap_or("-"), request.name);
        let reply = self.transport.roundtrip(&payload).await?;
        serde_json::from_str(&reply).map_err(|e| {
            SigningError::AgentError(format!("Malformed agent response: {e}"))
        })
    }

    /// Handshake, send, and map agent rejections to errors.
    async fn call(&self, request: AgentRequest) -> SigningResult<AgentResponse> {
        self.ensure_handshake().await?;
        let response = self.send_raw(&request).await?;
        if response.success {
            return Ok(response);
        }
        if response.is_key_not_found() {
            return Err(SigningError::KeyNotFound);
        }
        Err(SigningError::AgentRejected(
            response.reason_or_unknown().to_string(),
        ))
    }

    fn pkcs7_result(response: AgentResponse, operation: &str) -> SigningResult<Pkcs7Created> {
        let pkcs7_64 = response.pkcs7_64.ok_or_else(|| {
            SigningError::AgentError(format!("{operation}: response is missing pkcs7_64"))
        })?;
        let signature_hex = response.signature_hex.ok_or_else(|| {
            SigningError::AgentError(format!("{operation}: response is missing signature_hex"))
        })?;
        Ok(Pkcs7Created {
            pkcs7_64,
            signature_hex,
        })
    }
}

#[async_trait]
impl SigningAgent for EimzoClient {
    async fn version(&self) -> SigningResult<String> {
        // The version probe works before the handshake.
        let response = self.send_raw(&AgentRequest::version()).await?;
        response.version.ok_or_else(|| {
            SigningError::AgentError("version: response is missing version".to_string())
        })
    }

    async fn list_certificates(&self) -> SigningResult<Vec<PfxCertificateEntry>> {
        let request = AgentRequest::plugin_call(
            PLUGIN_PFX,
            operations::LIST_ALL_CERTIFICATES,
            std::iter::empty(),
        );
        let response = self.call(request).await?;
        Ok(response.certificates.unwrap_or_default())
    }

    async fn load_key(&self, entry: &PfxCertificateEntry) -> SigningResult<KeyId> {
        let request = AgentRequest::plugin_call(
            PLUGIN_PFX,
            operations::LOAD_KEY,
            entry.load_key_arguments(),
        );
        let response = self.call(request).await?;
        match response.key_id {
            Some(id) if !id.is_empty() => Ok(KeyId::new(id)),
            _ => Err(SigningError::AgentError(
                "load_key: response is missing keyId".to_string(),
            )),
        }
    }

    async fn create_pkcs7(
        &self,
        data_b64: &str,
        key_id: &KeyId,
        detached: bool,
    ) -> SigningResult<Pkcs7Created> {
        let detached_argument = if detached { "yes" } else { "no" };
        let request = AgentRequest::plugin_call(
            PLUGIN_PKCS7,
            operations::CREATE_PKCS7,
            [
                data_b64.to_string(),
                key_id.as_str().to_string(),
                detached_argument.to_string(),
            ],
        );
        let response = self.call(request).await?;
        Self::pkcs7_result(response, operations::CREATE_PKCS7)
    }

    async fn append_pkcs7(&self, pkcs7_b64: &str, key_id: &KeyId) -> SigningResult<Pkcs7Created> {
        let request = AgentRequest::plugin_call(
            PLUGIN_PKCS7,
            operations::APPEND_PKCS7_ATTACHED,
            [pkcs7_b64.to_string(), key_id.as_str().to_string()],
        );
        let response = self.call(request).await?;
        Self::pkcs7_result(response, operations::APPEND_PKCS7_ATTACHED)
    }

    async fn attach_timestamp(
        &self,
        pkcs7_b64: &str,
        serial_hex: &str,
        timestamp_b64: &str,
    ) -> SigningResult<String> {
        let request = AgentRequest::plugin_call(
            PLUGIN_PKCS7,
            operations::ATTACH_TIMESTAMP_TOKEN,
            [
                pkcs7_b64.to_string(),
                serial_hex.to_string(),
                timestamp_b64.to_string(),
            ],
        );
        let response = self.call(request).await?;
        response.pkcs7_64.ok_or_else(|| {
            SigningError::AgentError(
                "attach_timestamp_token_pkcs7: response is missing pkcs7_64".to_string(),
            )
        })
    }
}
