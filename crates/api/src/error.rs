//! API error types with HTTP response mapping.
//!
//! Malformed request bodies are rejected by axum's `Json` extractor before a
//! handler runs, so the only errors surfaced here come from the purchase
//! flow itself.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use fulfillment::FulfillmentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Error raised by the purchase flow.
    Fulfillment(FulfillmentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Fulfillment(err) = self;
        let (status, message) = fulfillment_error_to_response(err);

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    match &err {
        FulfillmentError::Domain(DomainError::GameNotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        FulfillmentError::Domain(DomainError::GameAlreadyPurchased { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        FulfillmentError::Domain(DomainError::ItemNotFound { .. }) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Fulfillment(err.into())
    }
}
