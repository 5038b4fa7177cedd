//! Signing chain tests against a scripted agent.
//!
//! Exercises key resolution, handle caching and the single key-refresh retry
//! without a running E-IMZO agent.

use async_trait::async_trait;
use eimzo_signer::adapters::agent::{PfxCertificateEntry, Pkcs7Created, SigningAgent};
use eimzo_signer::adapters::directum::DirectumClient;
use eimzo_signer::adapters::timestamp_http_client::{TimestampHttpClient, TimestampHttpConfig};
use eimzo_signer::domain::encoding;
use eimzo_signer::domain::types::{KeyId, Thumbprint};
use eimzo_signer::infra::error::{SigningError, SigningResult};
use eimzo_signer::services::certificate::CertIdentity;
use eimzo_signer::services::key_resolver::KeyResolver;
use eimzo_signer::services::signer::MultibankSigner;
use eimzo_signer::{SignWorkflow, SigningConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Clone, Copy)]
enum FailureScript {
    None,
    KeyNotFoundOnce,
    AlwaysRejected,
}

struct ScriptedAgent {
    script: FailureScript,
    alias: String,
    list_calls: AtomicUsize,
    load_calls: AtomicUsize,
    create_calls: AtomicUsize,
    append_calls: AtomicUsize,
}

impl ScriptedAgent {
    fn new(script: FailureScript) -> Self {
        Self {
            script,
            alias: "cn=test user,o=acme,uid=123456789".to_string(),
            list_calls: AtomicUsize::new(0),
            load_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            append_calls: AtomicUsize::new(0),
        }
    }

    fn with_alias(script: FailureScript, alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            ..Self::new(script)
        }
    }

    fn signed(pkcs7_64: &str) -> Pkcs7Created {
        Pkcs7Created {
            pkcs7_64: pkcs7_64.to_string(),
            signature_hex: "0AFFEE".to_string(),
        }
    }
}

#[async_trait]
impl SigningAgent for ScriptedAgent {
    async fn version(&self) -> SigningResult<String> {
        Ok("3.37".to_string())
    }

    async fn list_certificates(&self) -> SigningResult<Vec<PfxCertificateEntry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![PfxCertificateEntry {
            disk: "C:".to_string(),
            path: "/DSKEYS".to_string(),
            name: "container.pfx".to_string(),
            alias: self.alias.clone(),
        }])
    }

    async fn load_key(&self, _entry: &PfxCertificateEntry) -> SigningResult<KeyId> {
        let n = self.load_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(KeyId::new(format!("handle-{n}")))
    }

    async fn create_pkcs7(
        &self,
        _data_b64: &str,
        _key_id: &KeyId,
        _detached: bool,
    ) -> SigningResult<Pkcs7Created> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.script {
            FailureScript::KeyNotFoundOnce if n == 1 => Err(SigningError::KeyNotFound),
            FailureScript::AlwaysRejected => {
                Err(SigningError::AgentRejected("container is locked".to_string()))
            }
            _ => Ok(Self::signed("cGtjczc=")),
        }
    }

    async fn append_pkcs7(&self, _pkcs7_b64: &str, _key_id: &KeyId) -> SigningResult<Pkcs7Created> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::signed("YXBwZW5kZWQ="))
    }

    async fn attach_timestamp(
        &self,
        pkcs7_b64: &str,
        _serial_hex: &str,
        _timestamp_b64: &str,
    ) -> SigningResult<String> {
        Ok(pkcs7_b64.to_string())
    }
}

fn identity() -> CertIdentity {
    CertIdentity {
        thumbprint: Thumbprint::new("A".repeat(40)).unwrap(),
        common_name: "test user".to_string(),
        serial_hex: "0A1B2C".to_string(),
    }
}

fn signer(agent: Arc<ScriptedAgent>) -> MultibankSigner<ScriptedAgent> {
    let resolver = KeyResolver::new(Arc::clone(&agent));
    let timestamp = TimestampHttpClient::new(TimestampHttpConfig::default()).unwrap();
    let directum = DirectumClient::new(Duration::from_secs(5)).unwrap();
    MultibankSigner::new(agent, resolver, timestamp, directum)
}

#[tokio::test]
async fn lost_key_handle_triggers_exactly_one_retry() {
    let agent = Arc::new(ScriptedAgent::new(FailureScript::KeyNotFoundOnce));
    let signer = signer(Arc::clone(&agent));

    let created = signer
        .create_or_append("ZGF0YQ==", false, &identity())
        .await
        .unwrap();

    assert_eq!(created.signature_hex, "0AFFEE");
    assert_eq!(agent.create_calls.load(Ordering::SeqCst), 2);
    // Initial resolution plus the refresh after the rejection.
    assert_eq!(agent.load_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn other_agent_errors_are_not_retried() {
    let agent = Arc::new(ScriptedAgent::new(FailureScript::AlwaysRejected));
    let signer = signer(Arc::clone(&agent));

    let result = signer.create_or_append("ZGF0YQ==", false, &identity()).await;

    assert!(matches!(result, Err(SigningError::AgentRejected(_))));
    assert_eq!(agent.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.load_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fresh_handle_is_reused_across_calls() {
    let agent = Arc::new(ScriptedAgent::new(FailureScript::None));
    let signer = signer(Arc::clone(&agent));

    signer
        .create_or_append("Zmlyc3Q=", false, &identity())
        .await
        .unwrap();
    signer
        .create_or_append("c2Vjb25k", false, &identity())
        .await
        .unwrap();

    assert_eq!(agent.create_calls.load(Ordering::SeqCst), 2);
    assert_eq!(agent.load_calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn already_signed_payload_goes_through_append() {
    let agent = Arc::new(ScriptedAgent::new(FailureScript::None));
    let signer = signer(Arc::clone(&agent));

    let created = signer
        .create_or_append("cGtjczc=", true, &identity())
        .await
        .unwrap();

    assert_eq!(created.pkcs7_64, "YXBwZW5kZWQ=");
    assert_eq!(agent.append_calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_subject_is_reported_with_container_count() {
    let agent = Arc::new(ScriptedAgent::with_alias(
        FailureScript::None,
        "cn=somebody else,o=acme",
    ));
    let signer = signer(Arc::clone(&agent));

    let result = signer.create_or_append("ZGF0YQ==", false, &identity()).await;

    match result {
        Err(SigningError::CertificateNotFound(msg)) => {
            assert!(msg.contains("test user"));
            assert!(msg.contains("1 listed"));
        }
        other => panic!("expected CertificateNotFound, got {other:?}"),
    }
    assert_eq!(agent.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn alias_matching_is_case_insensitive() {
    let agent = Arc::new(ScriptedAgent::with_alias(
        FailureScript::None,
        "CN=Test User,O=ACME",
    ));
    let signer = signer(Arc::clone(&agent));

    let created = signer
        .create_or_append("ZGF0YQ==", false, &identity())
        .await
        .unwrap();
    assert_eq!(created.pkcs7_64, "cGtjczc=");
}

/// Self-signed certificate with subject `CN=test user`, matching the
/// scripted agent's container alias.
const WORKFLOW_CERT_DER_B64: &str = "MIIBfTCCASOgAwIBAgIUDszGjPfSz3a9Za/tDzUnJE5iWYUwCgYIKoZIzj0EAwIwFDESMBAGA1UEAwwJdGVzdCB1c2VyMB4XDTI2MDgyOTA5MjYwMVoXDTQ2MDgyNDA5MjYwMVowFDESMBAGA1UEAwwJdGVzdCB1c2VyMFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEBU1oFv7STLwBtVigkUVmyS1smzC8OOCD2ExYxlof8/jCdPvlul5+GlU69qNrdxcWuvRGWCnBYC6anPtfGP3bSaNTMFEwHQYDVR0OBBYEFDA9cnMLPNAKCtulEVIrAsGkH8fRMB8GA1UdIwQYMBaAFDA9cnMLPNAKCtulEVIrAsGkH8fRMA8GA1UdEwEB/wQFMAMBAf8wCgYIKoZIzj0EAwIDSAAwRQIgJIKNQNfejyLIV4K9N/vO0N1xJTyvEWOdQsqjutAADfYCIQD1th8ObpcFyIkYvkMGSGCUIr3W3YmWwrHYshjRalBs/g==";

/// SHA-1 fingerprint of the DER bytes above.
const WORKFLOW_CERT_SHA1: &str = "F1488AB293B9DE37D9342C416D0E0E09FE0C6037";

#[tokio::test]
async fn one_workflow_reuses_the_key_handle_across_calls() {
    let store = TempDir::new().unwrap();
    let der = encoding::from_base64(WORKFLOW_CERT_DER_B64).unwrap();
    std::fs::write(store.path().join("bridge.cer"), &der).unwrap();

    let mut config = SigningConfig::new(Thumbprint::new(WORKFLOW_CERT_SHA1).unwrap());
    config.cert_store_dir = Some(store.path().to_path_buf());

    let agent = Arc::new(ScriptedAgent::new(FailureScript::None));
    let workflow = SignWorkflow::with_agent(config, Arc::clone(&agent)).unwrap();

    let payload = encoding::to_base64(b"plain document body");
    workflow.sign_data(&payload).await.unwrap();
    workflow.sign_data(&payload).await.unwrap();

    assert_eq!(agent.create_calls.load(Ordering::SeqCst), 2);
    // The container is listed and loaded once; the second call hits the cache.
    assert_eq!(agent.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.load_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn raw_signing_returns_the_container() {
    let agent = Arc::new(ScriptedAgent::new(FailureScript::None));
    let signer = signer(Arc::clone(&agent));

    let pkcs7_64 = signer.sign_raw(b"raw document", &identity()).await.unwrap();

    assert_eq!(pkcs7_64, "cGtjczc=");
    assert_eq!(agent.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.append_calls.load(Ordering::SeqCst), 0);
}
