//! Publisher and handler traits.

use async_trait::async_trait;

use crate::BrokerError;

/// Error type returned by message handlers. A returned error triggers
/// redelivery per the at-least-once contract.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outbound side of the broker seam.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event to the broker.
    async fn publish(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), BrokerError>;
}

/// Inbound side: invoked once per delivered message, possibly more than once
/// for the same logical message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one delivery. Returning an error requests redelivery;
    /// returning `Ok` acknowledges the message even when the handler chose
    /// to drop it.
    async fn handle(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), HandlerError>;
}
