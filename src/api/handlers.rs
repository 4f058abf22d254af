//! HTTP API handlers.

use axum::{
    http::{Method, StatusCode, Uri},
    Json,
};
use serde::Serialize;
use strum::{AsRefStr, Display};
use tracing::debug;
use utoipa::ToSchema;

use crate::metrics;

/// Identifier reported by the liveness probe.
pub const SERVICE_NAME: &str = "ai-service";

/// Liveness state. The process can only report itself alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthState {
    /// Process is running and answering requests.
    Healthy,
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthStatus {
    /// Always `healthy`.
    pub status: HealthState,
    /// Service identifier.
    pub service: String,
}

impl HealthStatus {
    /// The one payload the health check ever returns.
    pub fn healthy() -> Self {
        Self {
            status: HealthState::Healthy,
            service: SERVICE_NAME.to_string(),
        }
    }
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthStatus)
    )
)]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}

/// Fallback for unmatched paths and methods: empty 404.
pub async fn not_found(method: Method, uri: Uri) -> StatusCode {
    debug!(%method, %uri, "no route matched");
    metrics::inc_not_found();
    StatusCode::NOT_FOUND
}
