//! Purchase entry point.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use common::{CorrelationId, GameId, UserId};
use fulfillment::PurchaseHandler;
use serde::{Deserialize, Serialize};
use store::{CatalogStore, GameCatalog};

use crate::error::ApiError;

/// Header carrying the request correlation id. Accepted from the caller when
/// present, generated otherwise, and echoed on the response.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Shared application state accessible from all handlers.
pub struct AppState<S, G> {
    pub purchases: PurchaseHandler<S, G>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub user_id: uuid::Uuid,
    pub game_id: uuid::Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub order_id: String,
    pub correlation_id: String,
}

/// POST /purchases — place a purchase order for a game.
///
/// Returns 201 with the order id once the order and its outbox record are
/// committed; publication to the broker happens asynchronously.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Json(req): Json<PurchaseRequest>,
) -> Result<Response, ApiError>
where
    S: CatalogStore + 'static,
    G: GameCatalog + 'static,
{
    let correlation_id = correlation_from_headers(&headers);

    let order_id = state
        .purchases
        .handle(
            UserId::from_uuid(req.user_id),
            GameId::from_uuid(req.game_id),
            correlation_id.clone(),
        )
        .await?;

    let response = PurchaseResponse {
        order_id: order_id.to_string(),
        correlation_id: correlation_id.to_string(),
    };

    Ok((
        StatusCode::CREATED,
        [(CORRELATION_HEADER, correlation_id.to_string())],
        Json(response),
    )
        .into_response())
}

fn correlation_from_headers(headers: &HeaderMap) -> CorrelationId {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(CorrelationId::from_string)
        .unwrap_or_else(CorrelationId::generate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_value_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_HEADER, HeaderValue::from_static("corr-77"));
        assert_eq!(correlation_from_headers(&headers).as_str(), "corr-77");
    }

    #[test]
    fn missing_or_empty_header_generates_an_id() {
        let generated = correlation_from_headers(&HeaderMap::new());
        assert!(!generated.as_str().is_empty());

        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_HEADER, HeaderValue::from_static(""));
        assert!(!correlation_from_headers(&headers).as_str().is_empty());
    }
}
