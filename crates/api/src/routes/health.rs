//! Liveness probe for the catalog service.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — liveness check. Reports process health only; outbox lag is
/// visible through the metrics endpoint instead.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
