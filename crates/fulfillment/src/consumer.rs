//! Payment-result consumption.

use async_trait::async_trait;
use broker::{HandlerError, MessageHandler};
use domain::{CatalogEvent, EventRegistry, ItemStatus, LibraryEntry, PaymentProcessed, events};
use store::CatalogStore;

use crate::error::FulfillmentError;

/// Settles an order item from a payment outcome and, on approval, grants the
/// library entitlement. Safe under broker redelivery: settled items ignore
/// duplicates, and the entitlement grant checks for an existing entry before
/// inserting.
pub struct PaymentResultConsumer<S> {
    store: S,
}

impl<S: CatalogStore> PaymentResultConsumer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Applies one payment result.
    ///
    /// Events for unknown orders or items are dropped after logging; they
    /// signal a bug or data loss that redelivery cannot fix. Store failures
    /// are returned so the broker redelivers.
    #[tracing::instrument(
        skip(self, event),
        fields(order_id = %event.order_id, correlation_id = %event.correlation_id)
    )]
    pub async fn handle(&self, event: &PaymentProcessed) -> Result<(), FulfillmentError> {
        let Some(mut order) = self.store.get_order(event.order_id).await? else {
            metrics::counter!("payment_results_dropped_total").increment(1);
            tracing::error!(
                order_id = %event.order_id,
                game_id = %event.game_id,
                "payment result references unknown order, dropping"
            );
            return Ok(());
        };

        let outcome = if event.status.is_approved() {
            ItemStatus::Approved
        } else {
            ItemStatus::Rejected
        };

        if let Err(error) = order.apply_payment(event.game_id, outcome) {
            metrics::counter!("payment_results_dropped_total").increment(1);
            tracing::error!(%error, "payment result references unknown item, dropping");
            return Ok(());
        }

        let entry = if event.status.is_approved()
            && !self
                .store
                .library_entry_exists(order.user_id, event.game_id)
                .await?
        {
            Some(LibraryEntry::grant(order.user_id, event.game_id))
        } else {
            None
        };

        self.store.save_payment_outcome(&order, entry.as_ref()).await?;

        metrics::counter!("payment_results_applied_total").increment(1);
        tracing::info!(
            game_id = %event.game_id,
            status = %event.status,
            order_status = %order.status,
            granted = entry.is_some(),
            "payment result applied"
        );

        Ok(())
    }
}

/// Broker-facing adapter: decodes incoming messages and routes
/// `PaymentProcessed` to the consumer.
pub struct PaymentSubscriptionHandler<S> {
    consumer: PaymentResultConsumer<S>,
    registry: EventRegistry,
}

impl<S: CatalogStore> PaymentSubscriptionHandler<S> {
    pub fn new(consumer: PaymentResultConsumer<S>) -> Self {
        Self {
            consumer,
            registry: EventRegistry::default(),
        }
    }
}

#[async_trait]
impl<S: CatalogStore> MessageHandler for PaymentSubscriptionHandler<S> {
    async fn handle(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), HandlerError> {
        let event = match self.registry.decode(event_type, payload) {
            Ok(event) => event,
            Err(error) => {
                // Redelivery cannot fix a malformed message; ack it.
                tracing::error!(event_type, %error, "dropping undecodable message");
                return Ok(());
            }
        };

        match event {
            CatalogEvent::PaymentProcessed(payment) => {
                self.consumer.handle(&payment).await.map_err(HandlerError::from)
            }
            CatalogEvent::OrderPlaced(_) => {
                tracing::debug!(event_type = events::ORDER_PLACED, "ignoring own event");
                Ok(())
            }
        }
    }
}
