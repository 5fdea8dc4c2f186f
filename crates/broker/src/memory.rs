//! In-process broker with at-least-once delivery semantics.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, RwLock, watch};

use crate::publisher::{EventPublisher, MessageHandler};
use crate::BrokerError;

/// One delivered message.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub event_type: String,
    pub payload: serde_json::Value,
}

#[derive(Default)]
struct Channel {
    queue: Mutex<VecDeque<Delivery>>,
    notify: Notify,
}

/// In-memory broker. Publishes land on a queue; a [`Subscription`] drains
/// the queue and requeues messages whose handler failed.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    channel: Arc<Channel>,
    log: Arc<RwLock<Vec<Delivery>>>,
}

impl InMemoryBroker {
    /// Creates a new broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every publish the broker has seen, in order. Test helper.
    pub async fn published(&self) -> Vec<Delivery> {
        self.log.read().await.clone()
    }

    /// Number of messages waiting for a subscriber.
    pub async fn queued(&self) -> usize {
        self.channel.queue.lock().await.len()
    }

    /// Creates a subscription draining this broker's queue.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            channel: Arc::clone(&self.channel),
            redelivery_delay: Duration::from_millis(50),
        }
    }
}

#[async_trait]
impl EventPublisher for InMemoryBroker {
    async fn publish(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), BrokerError> {
        let delivery = Delivery {
            event_type: event_type.to_string(),
            payload: payload.clone(),
        };
        self.log.write().await.push(delivery.clone());
        self.channel.queue.lock().await.push_back(delivery);
        self.channel.notify.notify_one();
        Ok(())
    }
}

/// A durable-subscription stand-in: delivers queued messages to a handler
/// and redelivers on handler error until shutdown.
pub struct Subscription {
    channel: Arc<Channel>,
    redelivery_delay: Duration,
}

impl Subscription {
    /// Overrides the delay between redelivery attempts.
    pub fn with_redelivery_delay(mut self, delay: Duration) -> Self {
        self.redelivery_delay = delay;
        self
    }

    /// Runs the delivery loop until `shutdown` flips to true.
    pub async fn run<H: MessageHandler>(self, handler: H, mut shutdown: watch::Receiver<bool>) {
        loop {
            let delivery = {
                let mut queue = self.channel.queue.lock().await;
                queue.pop_front()
            };

            match delivery {
                Some(delivery) => {
                    if let Err(error) = handler
                        .handle(&delivery.event_type, &delivery.payload)
                        .await
                    {
                        tracing::warn!(
                            event_type = %delivery.event_type,
                            %error,
                            "handler failed, requeueing for redelivery"
                        );
                        self.channel.queue.lock().await.push_back(delivery);
                        tokio::select! {
                            () = tokio::time::sleep(self.redelivery_delay) => {}
                            _ = shutdown.changed() => {}
                        }
                    }
                }
                None => {
                    tokio::select! {
                        () = self.channel.notify.notified() => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }

            if *shutdown.borrow() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        fail_first: usize,
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle(
            &self,
            _event_type: &str,
            _payload: &serde_json::Value,
        ) -> Result<(), crate::HandlerError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err("transient".into());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn publish_records_and_queues() {
        let broker = InMemoryBroker::new();
        broker
            .publish("OrderPlaced", &serde_json::json!({"orderId": "x"}))
            .await
            .unwrap();

        assert_eq!(broker.queued().await, 1);
        let published = broker.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type, "OrderPlaced");
    }

    #[tokio::test]
    async fn subscription_delivers_messages() {
        let broker = InMemoryBroker::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            calls: Arc::clone(&calls),
            fail_first: 0,
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(broker.subscribe().run(handler, shutdown_rx));

        broker
            .publish("PaymentProcessed", &serde_json::json!({}))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(broker.queued().await, 0);
    }

    #[tokio::test]
    async fn failed_handler_gets_redelivery() {
        let broker = InMemoryBroker::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            calls: Arc::clone(&calls),
            fail_first: 2,
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let subscription = broker
            .subscribe()
            .with_redelivery_delay(Duration::from_millis(1));
        let task = tokio::spawn(subscription.run(handler, shutdown_rx));

        broker
            .publish("PaymentProcessed", &serde_json::json!({}))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        // Two failures then one success.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(broker.queued().await, 0);
    }
}
