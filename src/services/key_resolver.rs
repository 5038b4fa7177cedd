//! Key handle resolution against the agent's certificate list.
//!
//! The agent only signs with a loaded key, addressed by an opaque handle.
//! Resolution lists the agent's containers, picks the one whose alias names
//! the certificate's subject CN, loads it, and caches the handle for the
//! freshness window.

use crate::adapters::agent::SigningAgent;
use crate::domain::keycache::{KeyHandleCache, DEFAULT_KEY_TTL};
use crate::domain::types::KeyId;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::certificate::CertIdentity;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Cache-aware key handle resolver.
pub struct KeyResolver<A> {
    agent: Arc<A>,
    cache: Mutex<KeyHandleCache>,
    ttl: Duration,
}

impl<A: SigningAgent> KeyResolver<A> {
    #[must_use]
    pub fn new(agent: Arc<A>) -> Self {
        Self::with_ttl(agent, DEFAULT_KEY_TTL)
    }

    #[must_use]
    pub fn with_ttl(agent: Arc<A>, ttl: Duration) -> Self {
        Self {
            agent,
            cache: Mutex::new(KeyHandleCache::new()),
            ttl,
        }
    }

    /// Key handle for the certificate, from cache when fresh.
    pub async fn key_for(&self, identity: &CertIdentity) -> SigningResult<KeyId> {
        if let Some(key_id) = self
            .cache
            .lock()
            .await
            .get_fresh(&identity.thumbprint, self.ttl)
        {
            log::debug!("using cached key handle for {}", identity.thumbprint);
            return Ok(key_id);
        }
        self.refresh(identity).await
    }

    /// Resolve a fresh handle, overwriting the cache.
    pub async fn refresh(&self, identity: &CertIdentity) -> SigningResult<KeyId> {
        let needle = format!("cn={}", identity.common_name);
        let entries = self.agent.list_certificates().await?;
        let entry = entries
            .iter()
            .find(|entry| entry.alias.to_lowercase().contains(&needle))
            .ok_or_else(|| {
                SigningError::CertificateNotFound(format!(
                    "Agent knows no container for '{}' ({} listed)",
                    identity.common_name,
                    entries.len()
                ))
            })?;

        log::info!("loading key container {} ({})", entry.name, entry.disk);
        let key_id = self.agent.load_key(entry).await?;
        self.cache
            .lock()
            .await
            .store(key_id.clone(), identity.thumbprint.clone());
        Ok(key_id)
    }

    /// Drop the cached handle.
    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }
}
