//! Base64 and hex conversion helpers shared across the signing chain.
//!
//! The agent and the Multibank API exchange everything as strings: PKCS7
//! containers as standard base64, signatures and serial numbers as hex.

use crate::infra::error::SigningResult;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode raw bytes as standard base64.
#[must_use]
pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a standard base64 string.
pub fn from_base64(data: &str) -> SigningResult<Vec<u8>> {
    Ok(STANDARD.decode(data.trim())?)
}

/// Re-encode a UTF-8 string as base64 of its bytes.
///
/// Used for unsigned payloads: the agent expects the document content
/// base64-wrapped before `create_pkcs7`.
#[must_use]
pub fn utf8_to_base64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Encode bytes as uppercase hex (fingerprints, serial numbers).
#[must_use]
pub fn to_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode a hex string into bytes.
pub fn from_hex(data: &str) -> SigningResult<Vec<u8>> {
    Ok(hex::decode(data.trim())?)
}
