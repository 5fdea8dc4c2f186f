//! Prometheus scrape endpoint.
//!
//! Exposes the purchase-flow counters recorded across the crates:
//! `orders_created_total`, `outbox_published_total`,
//! `outbox_publish_failures_total`, `outbox_poison_total`, and the
//! payment-result counters.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — renders the current metrics snapshot in Prometheus text
/// format.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
