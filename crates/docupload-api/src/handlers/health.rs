//! Health check handlers.

use crate::constants::DOCS_PATH;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

const HEALTHY: &str = "Healthy";
const UNHEALTHY: &str = "Unhealthy";

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub storage: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[utoipa::path(
    get,
    path = "/api/documents/health",
    tag = "Document Upload",
    responses(
        (status = 200, description = "Service is running", body = ServiceHealthResponse)
    )
)]
pub async fn service_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ServiceHealthResponse {
        status: HEALTHY.to_string(),
        timestamp: Utc::now(),
        service: state.config.api.title.clone(),
        version: state.config.telemetry.service_version.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All checks passed", body = HealthCheckResponse),
        (status = 503, description = "A check failed", body = HealthCheckResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = state.storage.clone();
    let storage_status = run_check(
        CHECK_TIMEOUT,
        async move { storage.health_check().await },
        "unhealthy",
    )
    .await;

    let healthy = storage_status == "healthy";
    if !healthy {
        tracing::warn!(storage = %storage_status, "Health check failed");
    }

    let status = if healthy { HEALTHY } else { UNHEALTHY };
    let response = HealthCheckResponse {
        status: status.to_string(),
        checks: HealthChecks {
            storage: storage_status,
        },
    };
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

pub async fn root_redirect() -> Redirect {
    Redirect::temporary(DOCS_PATH)
}
