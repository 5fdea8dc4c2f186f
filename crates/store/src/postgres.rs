//! PostgreSQL-backed catalog store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{CorrelationId, GameId, Money, OrderId, OrderItemId, UserId};
use domain::{Game, ItemStatus, LibraryEntry, Order, OrderItem, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::store::{CatalogStore, GameCatalog};
use crate::{OutboxRecord, Result, StoreError};

/// PostgreSQL implementation of [`CatalogStore`] and [`GameCatalog`].
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Creates a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let status: String = row.try_get("status")?;
        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            game_id: GameId::from_uuid(row.try_get::<Uuid, _>("game_id")?),
            price: Money::from_cents(row.try_get("price_cents")?),
            status: ItemStatus::parse(&status)
                .ok_or_else(|| StoreError::CorruptRow(format!("item status {status:?}")))?,
        })
    }

    fn row_to_record(row: &PgRow) -> Result<OutboxRecord> {
        Ok(OutboxRecord {
            id: row.try_get("id")?,
            event_type: row.try_get("event_type")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
            processed_at: row.try_get("processed_at")?,
            correlation_id: CorrelationId::from_string(row.try_get::<String, _>("correlation_id")?),
        })
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn insert_order_with_outbox(&self, order: &Order, record: &OutboxRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total_price_cents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total_price.cents())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, game_id, price_cents, status)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(item.game_id.as_uuid())
            .bind(item.price.cents())
            .bind(item.status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO outbox (id, event_type, payload, created_at, processed_at, correlation_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(&record.event_type)
        .bind(&record.payload)
        .bind(record.created_at)
        .bind(record.processed_at)
        .bind(record.correlation_id.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, status, total_price_cents, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows = sqlx::query(
            r#"
            SELECT id, game_id, price_cents, status
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        let status: String = row.try_get("status")?;
        Ok(Some(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            status: OrderStatus::parse(&status)
                .ok_or_else(|| StoreError::CorruptRow(format!("order status {status:?}")))?,
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            items,
        }))
    }

    async fn has_open_order(&self, user_id: UserId, game_id: GameId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM orders o
                JOIN order_items i ON i.order_id = o.id
                WHERE o.user_id = $1
                  AND i.game_id = $2
                  AND o.status IN ('Pending', 'Approved')
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(game_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn library_entry_exists(&self, user_id: UserId, game_id: GameId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_games WHERE user_id = $1 AND game_id = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(game_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn save_payment_outcome(
        &self,
        order: &Order,
        entry: Option<&LibraryEntry>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::CorruptRow(format!(
                "order {} vanished during payment settlement",
                order.id
            )));
        }

        for item in &order.items {
            sqlx::query("UPDATE order_items SET status = $2 WHERE id = $1")
                .bind(item.id.as_uuid())
                .bind(item.status.as_str())
                .execute(&mut *tx)
                .await?;
        }

        if let Some(entry) = entry {
            // The primary key on (user_id, game_id) is the idempotency
            // backstop; a concurrent duplicate delivery loses quietly.
            sqlx::query(
                r#"
                INSERT INTO user_games (user_id, game_id, purchase_date)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, game_id) DO NOTHING
                "#,
            )
            .bind(entry.user_id.as_uuid())
            .bind(entry.game_id.as_uuid())
            .bind(entry.purchase_date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn claim_pending(&self, limit: u32, lease: Duration) -> Result<Vec<OutboxRecord>> {
        let claimed_until = Utc::now() + lease;

        // SKIP LOCKED closes the claim race between concurrent relay
        // instances; the lease bounds how long a crashed claimant can keep a
        // record invisible.
        let rows = sqlx::query(
            r#"
            UPDATE outbox
            SET claimed_until = $1
            WHERE id IN (
                SELECT id
                FROM outbox
                WHERE processed_at IS NULL
                  AND (claimed_until IS NULL OR claimed_until < now())
                ORDER BY created_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, event_type, payload, created_at, processed_at, correlation_id
            "#,
        )
        .bind(claimed_until)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut records = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>>>()?;
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn mark_processed(&self, record_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE outbox
            SET processed_at = now(), claimed_until = NULL
            WHERE id = $1 AND processed_at IS NULL
            "#,
        )
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn release_claim(&self, record_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE outbox
            SET claimed_until = NULL
            WHERE id = $1 AND processed_at IS NULL
            "#,
        )
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn pending_outbox_count(&self) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM outbox WHERE processed_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }
}

#[async_trait]
impl GameCatalog for PostgresCatalogStore {
    async fn get_game(&self, game_id: GameId) -> Result<Option<Game>> {
        let row = sqlx::query("SELECT id, title, price_cents FROM games WHERE id = $1")
            .bind(game_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Game {
                id: GameId::from_uuid(row.try_get::<Uuid, _>("id")?),
                title: row.try_get("title")?,
                price: Money::from_cents(row.try_get("price_cents")?),
            })),
            None => Ok(None),
        }
    }
}
