//! Extraction of the Multibank signing job embedded in Directum signing data.
//!
//! Directum hands over a text blob where the actual job parameters sit as a
//! JSON object after a `forsign` marker, surrounded by certificate metadata.
//! The object has to be bounded by hand: depending on the document, the last
//! token of the object is `"}`, `}}` or `]}`, and text may follow it.

use crate::domain::encoding;
use crate::infra::error::{SigningError, SigningResult};
use serde::Deserialize;

/// Marker that separates certificate metadata from the signing job.
pub const FORSIGN_MARKER: &str = "forsign";

/// Closing token patterns that can terminate the embedded object.
const CLOSING_PATTERNS: [&str; 3] = ["\"}", "}}", "]}"];

/// Signing job parameters extracted from the `forsign` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningJob {
    /// Directum server base address for the callback.
    pub address: String,
    /// Basic-auth login for the callback.
    pub login: String,
    /// Basic-auth password for the callback.
    pub password: String,
    /// Identifier of the document being signed.
    pub document_id: i64,
    /// Whether `pkcs7` already carries a signature to extend.
    pub issigned: bool,
    /// Either an existing PKCS7 container (base64) or the raw content to sign.
    pub pkcs7: String,
}

impl SigningJob {
    /// Content argument for the agent call.
    ///
    /// An unsigned job carries plain document content which the agent expects
    /// base64-wrapped; an already-signed job carries base64 PKCS7 as-is.
    #[must_use]
    pub fn agent_payload(&self) -> String {
        if self.issigned {
            self.pkcs7.clone()
        } else {
            encoding::utf8_to_base64(&self.pkcs7)
        }
    }
}

/// Whether the decoded signing data carries an embedded Multibank job.
#[must_use]
pub fn has_forsign_marker(text: &str) -> bool {
    text.contains(FORSIGN_MARKER)
}

/// Extract and parse the signing job that follows the `forsign` marker.
///
/// # Errors
///
/// Returns `PayloadError` when the marker, the opening brace or a closing
/// pattern is missing, or when the bounded object is not valid JSON.
pub fn extract_signing_job(text: &str) -> SigningResult<SigningJob> {
    let object = extract_embedded_object(text)?;
    serde_json::from_str(object).map_err(|e| {
        SigningError::PayloadError(format!("Embedded signing job is not valid JSON: {e}"))
    })
}

/// Bound the JSON object embedded after the `forsign` marker.
///
/// The end of the object is the furthest occurrence of any closing pattern;
/// taking the maximum handles nested objects and arrays, whichever token the
/// object happens to end with.
pub fn extract_embedded_object(text: &str) -> SigningResult<&str> {
    let marker = text.find(FORSIGN_MARKER).ok_or_else(|| {
        SigningError::PayloadError("Signing data has no 'forsign' marker".to_string())
    })?;
    let after_marker = &text[marker..];

    let brace = after_marker.find('{').ok_or_else(|| {
        SigningError::PayloadError("No JSON object after the 'forsign' marker".to_string())
    })?;
    let param = &after_marker[brace..];

    let last_index = CLOSING_PATTERNS
        .iter()
        .filter_map(|pattern| param.rfind(pattern).map(|i| i + pattern.len()))
        .max()
        .ok_or_else(|| {
            SigningError::PayloadError(
                "Embedded object has no recognizable closing token".to_string(),
            )
        })?;

    Ok(&param[..last_index])
}
