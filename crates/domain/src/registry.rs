//! Closed event registry.
//!
//! Maps each stable event tag to a decoder. The registry is enumerated at
//! construction time; unknown tags and malformed payloads are typed errors
//! rather than the result of an open-ended runtime type search.

use std::collections::HashMap;

use thiserror::Error;

use crate::events::{self, CatalogEvent, OrderPlaced, PaymentProcessed};

/// Errors raised when resolving or decoding an outbox payload.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The event tag has no registered decoder.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// The payload could not be decoded as the tagged event.
    #[error("Malformed payload for event type {event_type}: {source}")]
    MalformedPayload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

type DecodeFn = fn(&serde_json::Value) -> Result<CatalogEvent, serde_json::Error>;

/// Registry of event decoders keyed by stable tag.
pub struct EventRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registers a decoder for a tag, replacing any existing entry.
    pub fn register(&mut self, event_type: &'static str, decoder: DecodeFn) {
        self.decoders.insert(event_type, decoder);
    }

    /// Returns true if the tag has a registered decoder.
    pub fn knows(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Resolves the tag and decodes the payload.
    pub fn decode(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<CatalogEvent, RegistryError> {
        let decoder = self
            .decoders
            .get(event_type)
            .ok_or_else(|| RegistryError::UnknownEventType(event_type.to_string()))?;

        decoder(payload).map_err(|source| RegistryError::MalformedPayload {
            event_type: event_type.to_string(),
            source,
        })
    }
}

impl Default for EventRegistry {
    /// Registry with every event the catalog service knows about.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(events::ORDER_PLACED, |payload| {
            serde_json::from_value::<OrderPlaced>(payload.clone()).map(CatalogEvent::from)
        });
        registry.register(events::PAYMENT_PROCESSED, |payload| {
            serde_json::from_value::<PaymentProcessed>(payload.clone()).map(CatalogEvent::from)
        });
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CorrelationId, GameId, Money, OrderId, UserId};

    #[test]
    fn decodes_registered_events() {
        let registry = EventRegistry::default();
        let event = OrderPlaced {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            game_id: GameId::new(),
            price: Money::from_cents(5999),
            correlation_id: CorrelationId::generate(),
        };
        let payload = serde_json::to_value(&event).unwrap();

        let decoded = registry.decode(events::ORDER_PLACED, &payload).unwrap();
        assert_eq!(decoded, CatalogEvent::OrderPlaced(event));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let registry = EventRegistry::default();
        let err = registry
            .decode("GameShipped", &serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownEventType(tag) if tag == "GameShipped"));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let registry = EventRegistry::default();
        let err = registry
            .decode(events::ORDER_PLACED, &serde_json::json!({"orderId": 42}))
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedPayload { .. }));
    }

    #[test]
    fn registry_is_closed_until_registered() {
        let mut registry = EventRegistry::empty();
        assert!(!registry.knows(events::ORDER_PLACED));

        registry.register(events::ORDER_PLACED, |payload| {
            serde_json::from_value::<OrderPlaced>(payload.clone()).map(CatalogEvent::from)
        });
        assert!(registry.knows(events::ORDER_PLACED));
    }
}
