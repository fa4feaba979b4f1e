/// Health check endpoint
///
/// Reports process liveness and database reachability. Public, unversioned,
/// suitable for load-balancer probes.

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "ok" or "degraded"
    pub status: &'static str,

    /// Whether the database answered the probe
    pub database: bool,

    /// Crate version
    pub version: &'static str,
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = susucircle_shared::db::pool::health_check(&state.db)
        .await
        .is_ok();

    let (status, code) = if database {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
