//! Error handling types and result definitions for the signing bridge.

use thiserror::Error;

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;

/// Comprehensive error types for signing operations
#[derive(Error, Debug, miette::Diagnostic)]
pub enum SigningError {
    #[error("Agent error: {0}")]
    AgentError(String),

    #[error("Agent rejected request: {0}")]
    AgentRejected(String),

    #[error("Key handle not found by the agent")]
    KeyNotFound,

    #[error("Certificate not found: {0}")]
    CertificateNotFound(String),

    #[error("Certificate error: {0}")]
    CertificateError(String),

    #[error("Payload error: {0}")]
    PayloadError(String),

    #[error("Timestamp error: {0}")]
    TimestampError(String),

    #[error("Callback error: {0}")]
    CallbackError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<reqwest::Error> for SigningError {
    fn from(error: reqwest::Error) -> Self {
        SigningError::NetworkError(error.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SigningError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        SigningError::AgentError(error.to_string())
    }
}

impl From<der::Error> for SigningError {
    fn from(error: der::Error) -> Self {
        SigningError::CertificateError(error.to_string())
    }
}

impl From<std::io::Error> for SigningError {
    fn from(error: std::io::Error) -> Self {
        SigningError::IoError(error.to_string())
    }
}

impl From<base64::DecodeError> for SigningError {
    fn from(error: base64::DecodeError) -> Self {
        SigningError::EncodingError(error.to_string())
    }
}

impl From<hex::FromHexError> for SigningError {
    fn from(error: hex::FromHexError) -> Self {
        SigningError::EncodingError(error.to_string())
    }
}
