//! Directum callback adapter.
//!
//! Posts the finished signature back to the originating Directum instance via
//! the Multibank integration module, authenticated with the credentials the
//! signing job carried.

use crate::infra::error::{SigningError, SigningResult};
use serde::Serialize;
use std::time::Duration;

/// Route of the integration endpoint, relative to the server address.
const IMPORT_SIGN_ROUTE: &str = "integration/odata/MultibankModule/ImportSign/";

/// Body of the `ImportSign` call.
#[derive(Debug, Serialize)]
struct ImportSignBody<'a> {
    #[serde(rename = "externalSign")]
    external_sign: &'a str,
    document_id: i64,
}

/// HTTP client posting signed artifacts back to Directum.
pub struct DirectumClient {
    http: reqwest::Client,
}

impl DirectumClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> SigningResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("eimzo-signer/0.1")
            .build()?;
        Ok(Self { http })
    }

    /// Import a signed artifact for a document.
    ///
    /// The address comes from the signing job and already ends with `/`;
    /// basic authentication uses the job's credentials.
    pub async fn import_sign(
        &self,
        address: &str,
        login: &str,
        password: &str,
        document_id: i64,
        external_sign: &str,
    ) -> SigningResult<()> {
        let url = format!("{address}{IMPORT_SIGN_ROUTE}");
        log::info!("returning signature for document {document_id} to {url}");

        let body = ImportSignBody {
            external_sign,
            document_id,
        };
        let resp = self
            .http
            .post(&url)
            .basic_auth(login, Some(password))
            .json(&body)
            .send()
            .await
            .map_err(|e| SigningError::CallbackError(format!("Failed to reach Directum: {e}")))?;

        if !resp.status().is_success() {
            return Err(SigningError::CallbackError(format!(
                "Directum answered HTTP {} for document {document_id}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_serializes_with_external_sign_casing() {
        let body = ImportSignBody {
            external_sign: "UEtDUzc=",
            document_id: 42,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"externalSign": "UEtDUzc=", "document_id": 42})
        );
    }
}
