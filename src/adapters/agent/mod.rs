//! E-IMZO agent adapter: transport, wire protocol, typed client.

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::{EimzoClient, DEFAULT_AGENT_ENDPOINT};
pub use protocol::{AgentRequest, AgentResponse, PfxCertificateEntry, Pkcs7Created};
pub use transport::AgentTransport;

use crate::domain::types::KeyId;
use crate::infra::error::SigningResult;
use async_trait::async_trait;

/// Operations the signing chain needs from the agent.
///
/// A trait seam so the orchestrator can be exercised against a mock agent;
/// [`EimzoClient`] is the production implementation.
#[async_trait]
pub trait SigningAgent: Send + Sync {
    /// Agent version probe (works before the API-key handshake).
    async fn version(&self) -> SigningResult<String>;

    /// List certificate containers known to the agent.
    async fn list_certificates(&self) -> SigningResult<Vec<PfxCertificateEntry>>;

    /// Load a private key container; the agent answers with an opaque handle.
    async fn load_key(&self, entry: &PfxCertificateEntry) -> SigningResult<KeyId>;

    /// Create a PKCS7 signature over base64 content.
    async fn create_pkcs7(
        &self,
        data_b64: &str,
        key_id: &KeyId,
        detached: bool,
    ) -> SigningResult<Pkcs7Created>;

    /// Add a signature to an existing attached PKCS7 container.
    async fn append_pkcs7(&self, pkcs7_b64: &str, key_id: &KeyId) -> SigningResult<Pkcs7Created>;

    /// Attach a timestamp token to a PKCS7 container.
    async fn attach_timestamp(
        &self,
        pkcs7_b64: &str,
        serial_hex: &str,
        timestamp_b64: &str,
    ) -> SigningResult<String>;
}
