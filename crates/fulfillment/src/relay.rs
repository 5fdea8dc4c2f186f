//! Outbox relay: the sole bridge from durable storage to the message bus.

use std::sync::Arc;
use std::time::Duration;

use broker::EventPublisher;
use domain::{CatalogEvent, EventRegistry};
use store::{CatalogStore, OutboxRecord};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::FulfillmentError;

/// Relay tuning knobs.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Time between ticks. Also the retry backoff for records left pending.
    pub tick_interval: Duration,
    /// Maximum records claimed per tick.
    pub batch_size: u32,
    /// How long a claimed record stays invisible to other relay instances.
    /// Must comfortably exceed `batch_size * publish_timeout`.
    pub claim_lease: Duration,
    /// Bound on a single publish call so one slow publish cannot starve the
    /// batch.
    pub publish_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            batch_size: 100,
            claim_lease: Duration::from_secs(60),
            publish_timeout: Duration::from_secs(10),
        }
    }
}

/// Periodically drains pending outbox records to the broker.
///
/// Delivery contract is at-least-once: a record is marked processed only
/// after a successful publish, and a failed publish leaves it pending for
/// the next tick. Unknown or undecodable records are marked processed after
/// logging — an explicit lossy policy that prevents poison-message livelock.
pub struct OutboxRelay<S, P> {
    store: S,
    publisher: P,
    registry: EventRegistry,
    config: RelayConfig,
}

impl<S, P> OutboxRelay<S, P>
where
    S: CatalogStore + Send + Sync + 'static,
    P: EventPublisher + 'static,
{
    /// Creates a relay over the given store and publisher, decoding through
    /// the default event registry.
    pub fn new(store: S, publisher: P, config: RelayConfig) -> Self {
        Self {
            store,
            publisher,
            registry: EventRegistry::default(),
            config,
        }
    }

    /// Processes one batch of pending records. Returns how many were
    /// published.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> Result<usize, FulfillmentError> {
        let records = self
            .store
            .claim_pending(self.config.batch_size, self.config.claim_lease)
            .await?;

        if records.is_empty() {
            return Ok(0);
        }

        tracing::debug!(count = records.len(), "processing outbox batch");

        let mut published = 0;
        for record in &records {
            match self.publish_record(record).await {
                Ok(()) => published += 1,
                Err(error) => {
                    metrics::counter!("outbox_publish_failures_total").increment(1);
                    tracing::error!(
                        record_id = %record.id,
                        event_type = %record.event_type,
                        %error,
                        "outbox publish failed, will retry next tick"
                    );
                    // Hand the claim back so the next tick retries
                    // immediately; the lease only covers claimants that
                    // crash before reaching this point.
                    self.store.release_claim(record.id).await?;
                }
            }
        }

        Ok(published)
    }

    async fn publish_record(&self, record: &OutboxRecord) -> Result<(), FulfillmentError> {
        let event = match self.registry.decode(&record.event_type, &record.payload) {
            Ok(event) => event,
            Err(error) => {
                // Data corruption, not a transient fault: retrying cannot
                // fix it, so mark processed to avoid livelock.
                metrics::counter!("outbox_poison_total").increment(1);
                tracing::error!(
                    record_id = %record.id,
                    event_type = %record.event_type,
                    correlation_id = %record.correlation_id,
                    %error,
                    "undecodable outbox record, marking processed"
                );
                self.store.mark_processed(record.id).await?;
                return Ok(());
            }
        };

        tokio::time::timeout(
            self.config.publish_timeout,
            self.publisher.publish(&record.event_type, &record.payload),
        )
        .await
        .map_err(|_| broker::BrokerError::Timeout)??;

        self.store.mark_processed(record.id).await?;

        metrics::counter!("outbox_published_total").increment(1);
        if let CatalogEvent::OrderPlaced(placed) = &event {
            tracing::info!(
                order_id = %placed.order_id,
                game_id = %placed.game_id,
                user_id = %placed.user_id,
                correlation_id = %record.correlation_id,
                "published OrderPlaced"
            );
        } else {
            tracing::debug!(
                record_id = %record.id,
                event_type = %record.event_type,
                "published outbox record"
            );
        }

        Ok(())
    }

    /// Starts the periodic tick loop. The returned handle stops it cleanly;
    /// a record claimed by an interrupted tick is released by lease expiry.
    pub fn start(self) -> RelayHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let relay = Arc::new(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(relay.config.tick_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(
                interval_secs = relay.config.tick_interval.as_secs_f64(),
                batch_size = relay.config.batch_size,
                "outbox relay started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(error) = relay.run_once().await {
                            tracing::error!(%error, "outbox relay tick failed");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("outbox relay stopped");
                            return;
                        }
                    }
                }
            }
        });

        RelayHandle { shutdown_tx, task }
    }
}

/// Handle for stopping a running relay.
pub struct RelayHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RelayHandle {
    /// Signals the relay to stop and waits for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}
