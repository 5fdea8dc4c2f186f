//! Persistence traits.

use std::time::Duration;

use async_trait::async_trait;
use common::{GameId, OrderId, UserId};
use domain::{Game, LibraryEntry, Order};
use uuid::Uuid;

use crate::Result;
use crate::outbox::OutboxRecord;

/// Transactional store for orders, outbox records, and library entitlements.
///
/// Each method executes as one atomic unit against the underlying store.
/// Relay and consumer instances may run in separate processes, so all
/// cross-instance coordination (outbox claims, the library uniqueness
/// constraint) lives in the store rather than in process-local locks.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persists a new order together with its outbox record in a single
    /// transaction. The record becomes relay-visible only once the order
    /// commit it describes is durable.
    async fn insert_order_with_outbox(&self, order: &Order, record: &OutboxRecord) -> Result<()>;

    /// Loads an order with its items.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Returns true if the user has a non-terminal order containing the game.
    async fn has_open_order(&self, user_id: UserId, game_id: GameId) -> Result<bool>;

    /// Returns true if the user already holds an entitlement for the game.
    async fn library_entry_exists(&self, user_id: UserId, game_id: GameId) -> Result<bool>;

    /// Persists an updated order and, if present, a new library entry in a
    /// single transaction. The entry insert is a no-op when the `(user,
    /// game)` pair already exists, which absorbs duplicate deliveries that
    /// race past the consumer's existence check.
    async fn save_payment_outcome(&self, order: &Order, entry: Option<&LibraryEntry>)
    -> Result<()>;

    /// Claims up to `limit` pending outbox records, oldest first.
    ///
    /// A claimed record is invisible to other claimants until `lease`
    /// expires or the record is marked processed, whichever comes first.
    /// Records whose `processed_at` is set are never returned.
    async fn claim_pending(&self, limit: u32, lease: Duration) -> Result<Vec<OutboxRecord>>;

    /// Marks an outbox record as processed. Irreversible.
    async fn mark_processed(&self, record_id: Uuid) -> Result<()>;

    /// Releases a claim early so the record is immediately claimable again.
    ///
    /// Called after a failed publish attempt; without it a failed record
    /// would stay invisible until the lease runs out. Lease expiry remains
    /// the backstop for claimants that crash before reaching this call.
    async fn release_claim(&self, record_id: Uuid) -> Result<()>;

    /// Number of outbox records still awaiting publication.
    async fn pending_outbox_count(&self) -> Result<u64>;
}

/// Game lookup provided by the catalog CRUD layer.
#[async_trait]
pub trait GameCatalog: Send + Sync {
    /// Loads a game by ID, returning its current price.
    async fn get_game(&self, game_id: GameId) -> Result<Option<Game>>;
}
