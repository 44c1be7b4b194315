//! HTTP gateway content store.
//!
//! Reads go through a public gateway (`GET {gateway}/ipfs/{cid}`); writes go
//! to an authenticated upload endpoint that answers `{"cid": "..."}`.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ContentConfig;
use crate::content::store::ContentStore;
use crate::error::{EngineError, EngineResult};

/// Environment variable holding the upload API token.
pub const CONTENT_TOKEN_ENV_VAR: &str = "HUMANWORK_CONTENT_TOKEN";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    cid: String,
}

/// Content store reached over HTTP.
#[derive(Clone)]
pub struct HttpContentStore {
    client: Client,
    gateway_url: String,
    upload_url: String,
    token: Option<String>,
}

impl HttpContentStore {
    pub fn new(config: &ContentConfig, token: Option<String>) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(client_build_error)?;

        Ok(Self {
            client,
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.clone(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Build a store whose upload token comes from `HUMANWORK_CONTENT_TOKEN`.
    pub fn from_env(config: &ContentConfig) -> EngineResult<Self> {
        Self::new(config, std::env::var(CONTENT_TOKEN_ENV_VAR).ok())
    }

    fn gateway_path(&self, cid: &str) -> String {
        format!("{}/ipfs/{}", self.gateway_url, cid)
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn get(&self, cid: &str) -> EngineResult<Vec<u8>> {
        let res = self
            .client
            .get(self.gateway_path(cid))
            .send()
            .await
            .map_err(|e| EngineError::content(cid, format!("gateway request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            return Err(EngineError::content(cid, format!("gateway returned {}", status)));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| EngineError::content(cid, format!("reading body failed: {}", e)))?;
        Ok(body.to_vec())
    }

    async fn put(&self, name: &str, bytes: Vec<u8>) -> EngineResult<String> {
        let token = self.token.as_ref().ok_or_else(|| {
            EngineError::PublishFailed(format!(
                "upload token not set; export {}",
                CONTENT_TOKEN_ENV_VAR
            ))
        })?;

        let res = self
            .client
            .post(&self.upload_url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header("X-Name", name)
            .body(bytes)
            .send()
            .await
            .map_err(|e| EngineError::PublishFailed(format!("upload request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(EngineError::PublishFailed(format!(
                "upload returned {}: {}",
                status, text
            )));
        }

        let upload: UploadResponse = res
            .json()
            .await
            .map_err(|e| EngineError::PublishFailed(format!("malformed upload response: {}", e)))?;
        tracing::debug!(name = %name, cid = %upload.cid, "Payload uploaded");
        Ok(upload.cid)
    }
}

impl std::fmt::Debug for HttpContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContentStore")
            .field("gateway_url", &self.gateway_url)
            .field("upload_url", &self.upload_url)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

/// Client construction only fails on setup problems.
fn client_build_error(e: impl std::fmt::Display) -> EngineError {
    EngineError::Validation(format!("failed to build content HTTP client: {}", e))
}
