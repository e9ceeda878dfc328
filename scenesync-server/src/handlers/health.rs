//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded"
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Whether the film photo base directory exists
    pub film_base_available: bool,
    /// Whether the scene photo base directory exists
    pub scene_base_available: bool,
    /// Service name
    pub service: &'static str,
}

/// GET /health - Health check endpoint
///
/// Reports "degraded" when either photo base directory is missing, since no
/// folder can be matched until it is created.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let film_base_available = state.film_base.is_dir();
    let scene_base_available = state.scene_base.is_dir();

    let status = if film_base_available && scene_base_available {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        film_base_available,
        scene_base_available,
        service: "scenesync-server",
    })
}

/// Readiness response for orchestrators
#[derive(Serialize)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /ready - Readiness check
pub async fn ready() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        message: None,
    })
}
