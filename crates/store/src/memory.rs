//! In-memory catalog store for testing.
//!
//! Mirrors the semantics of the PostgreSQL implementation, including outbox
//! claim leases and the library uniqueness backstop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{GameId, OrderId, UserId};
use domain::{Game, LibraryEntry, Order};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{CatalogStore, GameCatalog};
use crate::{OutboxRecord, Result};

struct StoredRecord {
    record: OutboxRecord,
    claimed_until: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    outbox: Vec<StoredRecord>,
    library: HashMap<(UserId, GameId), LibraryEntry>,
}

/// In-memory implementation of [`CatalogStore`].
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCatalogStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every outbox record, processed or not. Test helper.
    pub async fn all_outbox_records(&self) -> Vec<OutboxRecord> {
        self.inner
            .read()
            .await
            .outbox
            .iter()
            .map(|s| s.record.clone())
            .collect()
    }

    /// Returns the stored library entries. Test helper.
    pub async fn library_entries(&self) -> Vec<LibraryEntry> {
        self.inner.read().await.library.values().cloned().collect()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert_order_with_outbox(&self, order: &Order, record: &OutboxRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.orders.insert(order.id, order.clone());
        inner.outbox.push(StoredRecord {
            record: record.clone(),
            claimed_until: None,
        });
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&order_id).cloned())
    }

    async fn has_open_order(&self, user_id: UserId, game_id: GameId) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.orders.values().any(|order| {
            order.user_id == user_id
                && !order.status.is_terminal()
                && order.item_for_game(game_id).is_some()
        }))
    }

    async fn library_entry_exists(&self, user_id: UserId, game_id: GameId) -> Result<bool> {
        Ok(self
            .inner
            .read()
            .await
            .library
            .contains_key(&(user_id, game_id)))
    }

    async fn save_payment_outcome(
        &self,
        order: &Order,
        entry: Option<&LibraryEntry>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.orders.insert(order.id, order.clone());
        if let Some(entry) = entry {
            inner
                .library
                .entry((entry.user_id, entry.game_id))
                .or_insert_with(|| entry.clone());
        }
        Ok(())
    }

    async fn claim_pending(&self, limit: u32, lease: Duration) -> Result<Vec<OutboxRecord>> {
        let now = Utc::now();
        let claimed_until = now + lease;
        let mut inner = self.inner.write().await;

        let mut claimable: Vec<&mut StoredRecord> = inner
            .outbox
            .iter_mut()
            .filter(|stored| {
                stored.record.is_pending()
                    && stored.claimed_until.is_none_or(|until| until < now)
            })
            .collect();
        claimable.sort_by_key(|stored| stored.record.created_at);

        let mut claimed = Vec::new();
        for stored in claimable.into_iter().take(limit as usize) {
            stored.claimed_until = Some(claimed_until);
            claimed.push(stored.record.clone());
        }
        Ok(claimed)
    }

    async fn mark_processed(&self, record_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(stored) = inner
            .outbox
            .iter_mut()
            .find(|stored| stored.record.id == record_id && stored.record.is_pending())
        {
            stored.record.processed_at = Some(Utc::now());
            stored.claimed_until = None;
        }
        Ok(())
    }

    async fn release_claim(&self, record_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(stored) = inner
            .outbox
            .iter_mut()
            .find(|stored| stored.record.id == record_id && stored.record.is_pending())
        {
            stored.claimed_until = None;
        }
        Ok(())
    }

    async fn pending_outbox_count(&self) -> Result<u64> {
        Ok(self
            .inner
            .read()
            .await
            .outbox
            .iter()
            .filter(|stored| stored.record.is_pending())
            .count() as u64)
    }
}

/// In-memory game catalog for testing.
#[derive(Clone, Default)]
pub struct InMemoryGameCatalog {
    games: Arc<RwLock<HashMap<GameId, Game>>>,
}

impl InMemoryGameCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a game to the catalog.
    pub async fn add_game(&self, game: Game) {
        self.games.write().await.insert(game.id, game);
    }
}

#[async_trait]
impl GameCatalog for InMemoryGameCatalog {
    async fn get_game(&self, game_id: GameId) -> Result<Option<Game>> {
        Ok(self.games.read().await.get(&game_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CorrelationId, Money};
    use domain::{CatalogEvent, OrderPlaced};

    fn placed_record(order: &Order) -> OutboxRecord {
        let event: CatalogEvent = OrderPlaced {
            order_id: order.id,
            user_id: order.user_id,
            game_id: order.items[0].game_id,
            price: order.total_price,
            correlation_id: CorrelationId::generate(),
        }
        .into();
        OutboxRecord::for_event(&event, CorrelationId::generate()).unwrap()
    }

    fn sample_order() -> Order {
        Order::place(UserId::new(), GameId::new(), Money::from_cents(5999))
    }

    #[tokio::test]
    async fn insert_makes_order_and_record_visible_together() {
        let store = InMemoryCatalogStore::new();
        let order = sample_order();
        let record = placed_record(&order);

        store.insert_order_with_outbox(&order, &record).await.unwrap();

        assert_eq!(store.get_order(order.id).await.unwrap(), Some(order));
        assert_eq!(store.pending_outbox_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn claim_excludes_processed_records() {
        let store = InMemoryCatalogStore::new();
        let order = sample_order();
        let record = placed_record(&order);
        store.insert_order_with_outbox(&order, &record).await.unwrap();

        store.mark_processed(record.id).await.unwrap();

        let claimed = store
            .claim_pending(10, Duration::from_secs(30))
            .await
            .unwrap();
        assert!(claimed.is_empty());
        assert_eq!(store.pending_outbox_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn claim_returns_oldest_first_and_respects_limit() {
        let store = InMemoryCatalogStore::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let order = sample_order();
            let record = placed_record(&order);
            ids.push(record.id);
            store.insert_order_with_outbox(&order, &record).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let claimed = store
            .claim_pending(2, Duration::from_secs(30))
            .await
            .unwrap();
        let claimed_ids: Vec<_> = claimed.iter().map(|r| r.id).collect();
        assert_eq!(claimed_ids, ids[..2]);
    }

    #[tokio::test]
    async fn lease_blocks_a_second_claim() {
        let store = InMemoryCatalogStore::new();
        let order = sample_order();
        let record = placed_record(&order);
        store.insert_order_with_outbox(&order, &record).await.unwrap();

        let first = store
            .claim_pending(10, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        let second = store
            .claim_pending(10, Duration::from_secs(30))
            .await
            .unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn released_claim_is_immediately_reclaimable() {
        let store = InMemoryCatalogStore::new();
        let order = sample_order();
        let record = placed_record(&order);
        store.insert_order_with_outbox(&order, &record).await.unwrap();

        store
            .claim_pending(10, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(
            store
                .claim_pending(10, Duration::from_secs(60))
                .await
                .unwrap()
                .is_empty()
        );

        store.release_claim(record.id).await.unwrap();

        let reclaimed = store
            .claim_pending(10, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].id, record.id);
    }

    #[tokio::test]
    async fn expired_lease_releases_the_claim() {
        let store = InMemoryCatalogStore::new();
        let order = sample_order();
        let record = placed_record(&order);
        store.insert_order_with_outbox(&order, &record).await.unwrap();

        store
            .claim_pending(10, Duration::from_millis(5))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let reclaimed = store
            .claim_pending(10, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].id, record.id);
    }

    #[tokio::test]
    async fn library_entry_is_unique_per_user_game() {
        let store = InMemoryCatalogStore::new();
        let order = sample_order();
        let entry = LibraryEntry::grant(order.user_id, order.items[0].game_id);

        store
            .save_payment_outcome(&order, Some(&entry))
            .await
            .unwrap();
        let duplicate = LibraryEntry::grant(order.user_id, order.items[0].game_id);
        store
            .save_payment_outcome(&order, Some(&duplicate))
            .await
            .unwrap();

        let entries = store.library_entries().await;
        assert_eq!(entries.len(), 1);
        // The original grant survives the duplicate.
        assert_eq!(entries[0].purchase_date, entry.purchase_date);
    }

    #[tokio::test]
    async fn has_open_order_ignores_terminal_orders() {
        let store = InMemoryCatalogStore::new();
        let mut order = sample_order();
        let game_id = order.items[0].game_id;
        let record = placed_record(&order);
        store.insert_order_with_outbox(&order, &record).await.unwrap();

        assert!(store.has_open_order(order.user_id, game_id).await.unwrap());

        order
            .apply_payment(game_id, domain::ItemStatus::Rejected)
            .unwrap();
        store.save_payment_outcome(&order, None).await.unwrap();

        assert!(!store.has_open_order(order.user_id, game_id).await.unwrap());
    }
}
