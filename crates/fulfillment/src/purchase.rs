//! Purchase command handling.

use common::{CorrelationId, GameId, OrderId, UserId};
use domain::{CatalogEvent, DomainError, Order, OrderPlaced};
use store::{CatalogStore, GameCatalog, OutboxRecord};

use crate::error::FulfillmentError;

/// Handles purchase requests: validates, records the order, and enqueues the
/// `OrderPlaced` event in the outbox — all inside one store transaction.
///
/// Publication is delegated entirely to the relay; nothing on this path
/// touches the broker, so a broker outage never fails a purchase.
pub struct PurchaseHandler<S, G> {
    store: S,
    catalog: G,
}

impl<S: CatalogStore, G: GameCatalog> PurchaseHandler<S, G> {
    /// Creates a new handler over the given store and game catalog.
    pub fn new(store: S, catalog: G) -> Self {
        Self { store, catalog }
    }

    /// Creates a purchase order for `(user_id, game_id)`.
    ///
    /// Fails with [`DomainError::GameNotFound`] when the game does not exist
    /// and [`DomainError::GameAlreadyPurchased`] when the user already owns
    /// the game or has an in-flight order for it.
    #[tracing::instrument(skip(self), fields(correlation_id = %correlation_id))]
    pub async fn handle(
        &self,
        user_id: UserId,
        game_id: GameId,
        correlation_id: CorrelationId,
    ) -> Result<OrderId, FulfillmentError> {
        let game = self
            .catalog
            .get_game(game_id)
            .await?
            .ok_or(DomainError::GameNotFound(game_id))?;

        if self.store.library_entry_exists(user_id, game_id).await?
            || self.store.has_open_order(user_id, game_id).await?
        {
            return Err(DomainError::GameAlreadyPurchased { user_id, game_id }.into());
        }

        let order = Order::place(user_id, game_id, game.price);
        let event: CatalogEvent = OrderPlaced {
            order_id: order.id,
            user_id,
            game_id,
            price: game.price,
            correlation_id: correlation_id.clone(),
        }
        .into();
        let record = OutboxRecord::for_event(&event, correlation_id)?;

        self.store.insert_order_with_outbox(&order, &record).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            %user_id,
            %game_id,
            price = %game.price,
            "order created"
        );

        Ok(order.id)
    }
}
