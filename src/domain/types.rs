//! Type-safe wrappers using the new-type pattern
//!
//! This module provides type-safe wrappers for various inputs to prevent
//! common errors and improve API safety.

use crate::infra::error::{SigningError, SigningResult};
use std::fmt;
use std::str::FromStr;

/// Type-safe wrapper for certificate thumbprints (hex-encoded digest of the DER bytes).
///
/// Accepts SHA-1 (40 hex chars) and SHA-256 (64 hex chars) fingerprints;
/// stored uppercase so comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbprint(String);

impl Thumbprint {
    /// Create a new `Thumbprint` after validation.
    pub fn new(thumbprint: impl AsRef<str>) -> SigningResult<Self> {
        let raw = thumbprint.as_ref().trim();
        if raw.len() != 40 && raw.len() != 64 {
            return Err(SigningError::ValidationError(format!(
                "Thumbprint must be 40 or 64 hex characters, got {}",
                raw.len()
            )));
        }
        if !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SigningError::ValidationError(
                "Thumbprint must contain only hex characters".to_string(),
            ));
        }
        Ok(Thumbprint(raw.to_ascii_uppercase()))
    }

    /// Get the normalized (uppercase) thumbprint.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a hex fingerprint.
    #[must_use]
    pub fn matches(&self, fingerprint_hex: &str) -> bool {
        self.0.eq_ignore_ascii_case(fingerprint_hex)
    }
}

impl FromStr for Thumbprint {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque key handle issued by the agent after loading a private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyId(String);

impl KeyId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        KeyId(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for the local agent WebSocket endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentUrl(String);

impl AgentUrl {
    /// Create a new `AgentUrl` after validation.
    pub fn new(url: impl AsRef<str>) -> SigningResult<Self> {
        let url = url.as_ref();
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(SigningError::ValidationError(format!(
                "Agent URL must start with ws:// or wss://, got: {url}"
            )));
        }
        if url.len() <= 6 {
            return Err(SigningError::ValidationError(
                "Agent URL too short".to_string(),
            ));
        }
        Ok(AgentUrl(url.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host portion of the endpoint, used as the first `apikey` argument.
    #[must_use]
    pub fn host(&self) -> &str {
        let without_scheme = self
            .0
            .strip_prefix("wss://")
            .or_else(|| self.0.strip_prefix("ws://"))
            .unwrap_or(&self.0);
        let end = without_scheme
            .find([':', '/'])
            .unwrap_or(without_scheme.len());
        &without_scheme[..end]
    }
}

impl FromStr for AgentUrl {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for AgentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for the timestamp service URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampUrl(String);

impl TimestampUrl {
    /// Create a new `TimestampUrl` after validation.
    pub fn new(url: impl AsRef<str>) -> SigningResult<Self> {
        let url = url.as_ref();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SigningError::ValidationError(format!(
                "Timestamp URL must start with http:// or https://, got: {url}"
            )));
        }
        if url.len() <= 8 {
            return Err(SigningError::ValidationError(
                "Timestamp URL too short".to_string(),
            ));
        }
        Ok(TimestampUrl(url.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TimestampUrl {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for TimestampUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbprint_normalizes_to_uppercase() {
        let tp = Thumbprint::new("ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12").unwrap();
        assert_eq!(tp.as_str(), "AB12CD34EF56AB12CD34EF56AB12CD34EF56AB12");
        assert!(tp.matches("ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12"));
    }

    #[test]
    fn thumbprint_rejects_bad_input() {
        assert!(Thumbprint::new("short").is_err());
        assert!(Thumbprint::new("zz12cd34ef56ab12cd34ef56ab12cd34ef56ab12").is_err());
    }

    #[test]
    fn agent_url_host_extraction() {
        let url = AgentUrl::new("ws://127.0.0.1:64646/service/cryptapi").unwrap();
        assert_eq!(url.host(), "127.0.0.1");

        let url = AgentUrl::new("wss://agent.local/service").unwrap();
        assert_eq!(url.host(), "agent.local");
    }

    #[test]
    fn agent_url_rejects_http() {
        assert!(AgentUrl::new("http://127.0.0.1:64646").is_err());
    }

    #[test]
    fn timestamp_url_validation() {
        assert!(TimestampUrl::new("https://api-staging.multibank.uz/api/references/v1/timestamp")
            .is_ok());
        assert!(TimestampUrl::new("ftp://example.com").is_err());
    }
}
