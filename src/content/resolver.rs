//! Content resolution: identifier to structured metadata, and back.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::content::store::ContentStore;
use crate::error::{EngineError, EngineResult};
use crate::jobs::types::JobMetadata;
use crate::observability::metrics;

/// Turns content identifiers into [`JobMetadata`] and publishes payloads.
///
/// Content is immutable per identifier, so successful resolutions may be
/// cached for the life of the resolver. Failures are never cached.
#[derive(Clone)]
pub struct ContentResolver {
    store: Arc<dyn ContentStore>,
    cache: Option<Arc<DashMap<String, JobMetadata>>>,
}

impl ContentResolver {
    pub fn new(store: Arc<dyn ContentStore>, cache_enabled: bool) -> Self {
        Self {
            store,
            cache: cache_enabled.then(|| Arc::new(DashMap::new())),
        }
    }

    /// Fetch and parse the metadata document stored under `cid`.
    ///
    /// Fails with `ContentUnavailable` when the identifier is empty, the
    /// store cannot serve it, or the payload is not a metadata object.
    pub async fn resolve(&self, cid: &str) -> EngineResult<JobMetadata> {
        if cid.trim().is_empty() {
            return Err(EngineError::content(cid, "empty content identifier"));
        }

        let cached = self
            .cache
            .as_ref()
            .and_then(|c| c.get(cid).map(|entry| entry.value().clone()));
        if let Some(metadata) = cached {
            metrics::record_content_resolution("cached");
            return Ok(metadata);
        }

        let bytes = self.store.get(cid).await?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::content(cid, format!("payload is not JSON: {}", e)))?;
        if !value.is_object() {
            return Err(EngineError::content(cid, "payload is not a JSON object"));
        }
        let metadata: JobMetadata = serde_json::from_value(value)
            .map_err(|e| EngineError::content(cid, format!("malformed metadata: {}", e)))?;

        if let Some(cache) = &self.cache {
            cache.insert(cid.to_string(), metadata.clone());
        }
        metrics::record_content_resolution("resolved");
        Ok(metadata)
    }

    /// Resolve `cid`, degrading any failure to `None` so the caller can show
    /// placeholder fields instead.
    pub async fn resolve_or_placeholder(&self, project_id: u64, cid: &str) -> Option<JobMetadata> {
        match self.resolve(cid).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!(
                    project_id = project_id,
                    cid = %cid,
                    error = %e,
                    "Metadata unavailable, using placeholder"
                );
                metrics::record_content_resolution("placeholder");
                None
            }
        }
    }

    /// Serialize `payload` as JSON, store it and return its identifier.
    pub async fn publish<T: Serialize>(&self, name: &str, payload: &T) -> EngineResult<String> {
        let bytes = serde_json::to_vec(payload)
            .map_err(|e| EngineError::PublishFailed(format!("cannot serialize {}: {}", name, e)))?;
        let cid = self.store.put(name, bytes).await?;
        tracing::info!(name = %name, cid = %cid, "Payload published");
        Ok(cid)
    }

    /// Fetch any JSON document, e.g. a profile, by identifier.
    pub async fn fetch_payload<T: DeserializeOwned>(&self, cid: &str) -> EngineResult<T> {
        let bytes = self.store.get(cid).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::content(cid, format!("malformed payload: {}", e)))
    }

    /// Number of cached resolutions.
    pub fn cached_entries(&self) -> usize {
        self.cache.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("cache_enabled", &self.cache.is_some())
            .field("cached_entries", &self.cached_entries())
            .finish()
    }
}
