//! Read-only JSON handlers over the job synchronizer.

use alloy::primitives::Address;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::EngineError;
use crate::jobs::sync::JobSynchronizer;
use crate::jobs::types::JobView;
use crate::ledger::reader::LedgerReader;

/// State shared by all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub synchronizer: JobSynchronizer,
    pub ledger: Arc<dyn LedgerReader>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub expected_chain_id: u64,
    pub network_ok: bool,
    pub views_stale: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsResponse {
    pub count: usize,
    /// True when served from the last synchronized snapshot.
    pub cached: bool,
    /// Unix seconds at which the listed view was synchronized.
    pub synced_at: u64,
    pub jobs: Vec<JobView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    #[serde(default)]
    pub cached: bool,
}

/// Engine error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::NetworkMismatch { .. } => StatusCode::CONFLICT,
            EngineError::LedgerCall { .. }
            | EngineError::ContentUnavailable { .. }
            | EngineError::PublishFailed(_) => StatusCode::BAD_GATEWAY,
            EngineError::NoActiveAccount | EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::TransactionRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "class": self.0.class().as_str(),
        });
        (status, Json(body)).into_response()
    }
}

pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let guard = state.synchronizer.guard();
    let network_ok = match guard.check_ledger(state.ledger.as_ref()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            false
        }
    };

    let status = if network_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if network_ok { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        expected_chain_id: guard.expected().0,
        network_ok,
        views_stale: state.synchronizer.is_stale(),
    };
    (status, Json(body))
}

pub async fn open_jobs(
    State(state): State<ApiState>,
    Query(query): Query<JobsQuery>,
) -> Result<Json<JobsResponse>, ApiError> {
    if query.cached {
        if let Some(snapshot) = state.synchronizer.cached_open_jobs() {
            return Ok(Json(JobsResponse {
                count: snapshot.jobs.len(),
                cached: true,
                synced_at: unix_secs(snapshot.synced_at),
                jobs: snapshot.jobs.clone(),
            }));
        }
    }

    let jobs = state.synchronizer.list_open_jobs().await?;
    Ok(Json(JobsResponse {
        count: jobs.len(),
        cached: false,
        synced_at: unix_secs(SystemTime::now()),
        jobs,
    }))
}

pub async fn account_jobs(
    State(state): State<ApiState>,
    Path(account): Path<String>,
) -> Result<Json<JobsResponse>, ApiError> {
    let account: Address = account.parse().map_err(|e| {
        EngineError::Validation(format!("invalid account '{}': {}", account, e))
    })?;

    let jobs = state.synchronizer.list_jobs_for_account(Some(account)).await?;
    Ok(Json(JobsResponse {
        count: jobs.len(),
        cached: false,
        synced_at: unix_secs(SystemTime::now()),
        jobs,
    }))
}

fn unix_secs(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                EngineError::NetworkMismatch {
                    expected: 296,
                    actual: 1,
                },
                StatusCode::CONFLICT,
            ),
            (EngineError::ledger(3, "boom"), StatusCode::BAD_GATEWAY),
            (
                EngineError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (EngineError::NoActiveAccount, StatusCode::BAD_REQUEST),
            (
                EngineError::TransactionRejected("no".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
