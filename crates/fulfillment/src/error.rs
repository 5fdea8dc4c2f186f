//! Fulfillment error types.

use broker::BrokerError;
use domain::{DomainError, RegistryError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur across the purchase and fulfillment flow.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// A domain validation error, surfaced synchronously and never retried.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// An error occurred in the catalog store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An error occurred at the broker seam.
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// An outbox record carried an unknown or malformed event.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
