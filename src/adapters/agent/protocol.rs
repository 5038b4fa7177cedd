//! Wire protocol for the E-IMZO agent.
//!
//! Defines the JSON message format exchanged with the local signing agent:
//! every request names a plugin, an operation and positional string arguments;
//! every response carries `success` plus result fields or a `reason`.

use serde::{Deserialize, Serialize};

/// Plugin handling PFX key containers.
pub const PLUGIN_PFX: &str = "pfx";
/// Plugin handling PKCS7 containers.
pub const PLUGIN_PKCS7: &str = "pkcs7";

/// Operation names understood by the agent.
pub mod operations {
    pub const APIKEY: &str = "apikey";
    pub const VERSION: &str = "version";
    pub const LIST_ALL_CERTIFICATES: &str = "list_all_certificates";
    pub const LOAD_KEY: &str = "load_key";
    pub const CREATE_PKCS7: &str = "create_pkcs7";
    pub const APPEND_PKCS7_ATTACHED: &str = "append_pkcs7_attached";
    pub const ATTACH_TIMESTAMP_TOKEN: &str = "attach_timestamp_token_pkcs7";
}

/// Rejection reason the agent returns when a key handle has expired or was
/// never issued. Triggers the single key-refresh retry.
pub const REASON_KEY_NOT_FOUND: &str = "Ключ по идентификатору не найден";

/// Well-known public API key the agent accepts for localhost clients.
pub const LOCALHOST_API_KEY: &str = "A7BCFA5D490B351BE0754130DF03A068F855DB4333D43921125B9CF2670EF6A40370C646B90401955E1F7BC9CDBF59CE0B2C5467D820BE189C845D0B79CFC96F";

/// Request sent to the agent.
///
/// The `apikey` handshake and `version` probe are plugin-less; everything else
/// addresses a plugin.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    pub name: String,
    pub arguments: Vec<String>,
}

impl AgentRequest {
    /// Build a plugin-scoped request.
    #[must_use]
    pub fn plugin_call(
        plugin: &str,
        name: &str,
        arguments: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            plugin: Some(plugin.to_string()),
            name: name.to_string(),
            arguments: arguments.into_iter().collect(),
        }
    }

    /// Build the API-key handshake request.
    #[must_use]
    pub fn apikey(host: &str, api_key: &str) -> Self {
        Self {
            plugin: None,
            name: operations::APIKEY.to_string(),
            arguments: vec![host.to_string(), api_key.to_string()],
        }
    }

    /// Build the plugin-less version probe.
    #[must_use]
    pub fn version() -> Self {
        Self {
            plugin: None,
            name: operations::VERSION.to_string(),
            arguments: Vec::new(),
        }
    }
}

/// Certificate container entry reported by `list_all_certificates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PfxCertificateEntry {
    pub disk: String,
    pub path: String,
    pub name: String,
    pub alias: String,
}

impl PfxCertificateEntry {
    /// Positional arguments for `load_key`.
    #[must_use]
    pub fn load_key_arguments(&self) -> Vec<String> {
        vec![
            self.disk.clone(),
            self.path.clone(),
            self.name.clone(),
            self.alias.clone(),
        ]
    }
}

/// Response received from the agent.
///
/// Only the fields relevant to the current operation are present; everything
/// else is `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentResponse {
    #[serde(default)]
    pub success: bool,
    pub reason: Option<String>,
    pub pkcs7_64: Option<String>,
    pub signature_hex: Option<String>,
    #[serde(rename = "keyId")]
    pub key_id: Option<String>,
    pub certificates: Option<Vec<PfxCertificateEntry>>,
    pub version: Option<String>,
}

impl AgentResponse {
    /// Whether the agent rejected the request because the key handle is gone.
    #[must_use]
    pub fn is_key_not_found(&self) -> bool {
        !self.success && self.reason.as_deref() == Some(REASON_KEY_NOT_FOUND)
    }

    /// Rejection reason, or a placeholder when the agent sent none.
    #[must_use]
    pub fn reason_or_unknown(&self) -> &str {
        self.reason.as_deref().unwrap_or("(no reason given)")
    }
}

/// Result fields of a successful `create_pkcs7`/`append_pkcs7_attached` call.
#[derive(Debug, Clone)]
pub struct Pkcs7Created {
    /// Base64 PKCS7 container.
    pub pkcs7_64: String,
    /// Hex signature value used for the timestamp lookup.
    pub signature_hex: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_request_serializes_expected_shape() {
        let request = AgentRequest::plugin_call(
            PLUGIN_PKCS7,
            operations::CREATE_PKCS7,
            ["ZGF0YQ==".to_string(), "key-1".to_string(), "no".to_string()],
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "plugin": "pkcs7",
                "name": "create_pkcs7",
                "arguments": ["ZGF0YQ==", "key-1", "no"]
            })
        );
    }

    #[test]
    fn apikey_request_has_no_plugin_field() {
        let request = AgentRequest::apikey("127.0.0.1", LOCALHOST_API_KEY);
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("plugin"));
        assert!(json.contains("apikey"));
    }

    #[test]
    fn response_parses_result_fields() {
        let raw = r#"{"success":true,"pkcs7_64":"UEtDUzc=","signature_hex":"AABB","keyId":"k-9"}"#;
        let response: AgentResponse = serde_json::from_str(raw).unwrap();
        assert!(response.success);
        assert_eq!(response.pkcs7_64.as_deref(), Some("UEtDUzc="));
        assert_eq!(response.signature_hex.as_deref(), Some("AABB"));
        assert_eq!(response.key_id.as_deref(), Some("k-9"));
    }

    #[test]
    fn response_detects_key_not_found() {
        let raw = format!(r#"{{"success":false,"reason":"{REASON_KEY_NOT_FOUND}"}}"#);
        let response: AgentResponse = serde_json::from_str(&raw).unwrap();
        assert!(response.is_key_not_found());

        let other: AgentResponse =
            serde_json::from_str(r#"{"success":false,"reason":"busy"}"#).unwrap();
        assert!(!other.is_key_not_found());
    }

    #[test]
    fn response_parses_certificate_list() {
        let raw = r#"{"success":true,"certificates":[{"disk":"C:","path":"\\DSKEYS","name":"box.pfx","alias":"cn=acme llc,serialnumber=123"}]}"#;
        let response: AgentResponse = serde_json::from_str(raw).unwrap();
        let certs = response.certificates.unwrap();
        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].name, "box.pfx");
        assert_eq!(certs[0].load_key_arguments().len(), 4);
    }
}
