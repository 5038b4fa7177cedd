//! Cached agent key handle with a freshness window.
//!
//! Loading a key in the agent is slow and interactive (it may prompt the user
//! for the container password), so the issued handle is reused across signing
//! calls. The agent forgets handles on its own schedule; the cache therefore
//! bounds reuse to a freshness window and is dropped outright when the agent
//! reports the handle gone.

use crate::domain::types::{KeyId, Thumbprint};
use std::time::{Duration, Instant};

/// Default freshness window for a cached key handle.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(30 * 60);

/// Single-slot cache for the agent key handle.
#[derive(Debug, Default)]
pub struct KeyHandleCache {
    entry: Option<CachedHandle>,
}

#[derive(Debug)]
struct CachedHandle {
    key_id: KeyId,
    thumbprint: Thumbprint,
    created: Instant,
}

impl KeyHandleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly issued handle for the given certificate.
    pub fn store(&mut self, key_id: KeyId, thumbprint: Thumbprint) {
        self.entry = Some(CachedHandle {
            key_id,
            thumbprint,
            created: Instant::now(),
        });
    }

    /// Fetch the cached handle if it belongs to this certificate and is still
    /// within the freshness window. A handle aged exactly `ttl` is still fresh.
    #[must_use]
    pub fn get_fresh(&self, thumbprint: &Thumbprint, ttl: Duration) -> Option<KeyId> {
        self.lookup(thumbprint, ttl, Instant::now())
    }

    /// Drop the cached handle (the agent no longer recognizes it).
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    fn lookup(&self, thumbprint: &Thumbprint, ttl: Duration, now: Instant) -> Option<KeyId> {
        let entry = self.entry.as_ref()?;
        if &entry.thumbprint != thumbprint {
            return None;
        }
        if now.duration_since(entry.created) > ttl {
            return None;
        }
        Some(entry.key_id.clone())
    }
}
