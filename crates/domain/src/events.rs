//! Event contracts crossing the broker boundary.
//!
//! Plain immutable value records. Wire field names are camelCase and stable
//! across versions; `price` serializes as a decimal number.

use common::{CorrelationId, GameId, Money, OrderId, UserId};
use serde::{Deserialize, Serialize};

/// Stable tag for the order-placed event.
pub const ORDER_PLACED: &str = "OrderPlaced";

/// Stable tag for the payment-processed event.
pub const PAYMENT_PROCESSED: &str = "PaymentProcessed";

/// Published when a purchase order has been durably recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub game_id: GameId,
    pub price: Money,
    pub correlation_id: CorrelationId,
}

/// Outcome of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentStatus::Approved)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Approved => write!(f, "Approved"),
            PaymentStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Received from the payment service with the outcome for one order item.
/// The correlation id is preserved verbatim from the originating
/// `OrderPlaced` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProcessed {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub game_id: GameId,
    pub price: Money,
    pub status: PaymentStatus,
    pub correlation_id: CorrelationId,
}

/// Every event the catalog service publishes or consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    OrderPlaced(OrderPlaced),
    PaymentProcessed(PaymentProcessed),
}

impl CatalogEvent {
    /// Returns the stable wire tag for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::OrderPlaced(_) => ORDER_PLACED,
            CatalogEvent::PaymentProcessed(_) => PAYMENT_PROCESSED,
        }
    }

    /// Serializes the event body to its wire JSON form.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            CatalogEvent::OrderPlaced(event) => serde_json::to_value(event),
            CatalogEvent::PaymentProcessed(event) => serde_json::to_value(event),
        }
    }
}

impl From<OrderPlaced> for CatalogEvent {
    fn from(event: OrderPlaced) -> Self {
        CatalogEvent::OrderPlaced(event)
    }
}

impl From<PaymentProcessed> for CatalogEvent {
    fn from(event: PaymentProcessed) -> Self {
        CatalogEvent::PaymentProcessed(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_placed_wire_field_names() {
        let event = OrderPlaced {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            game_id: GameId::new(),
            price: Money::from_cents(5999),
            correlation_id: CorrelationId::from_string("corr-1"),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("orderId").is_some());
        assert!(json.get("userId").is_some());
        assert!(json.get("gameId").is_some());
        assert_eq!(json.get("price"), Some(&serde_json::json!(59.99)));
        assert_eq!(json.get("correlationId"), Some(&serde_json::json!("corr-1")));
    }

    #[test]
    fn payment_processed_status_serializes_as_plain_string() {
        let event = PaymentProcessed {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            game_id: GameId::new(),
            price: Money::from_cents(5999),
            status: PaymentStatus::Approved,
            correlation_id: CorrelationId::from_string("corr-2"),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json.get("status"), Some(&serde_json::json!("Approved")));

        let back: PaymentProcessed = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn event_type_tags() {
        let event: CatalogEvent = OrderPlaced {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            game_id: GameId::new(),
            price: Money::from_cents(100),
            correlation_id: CorrelationId::generate(),
        }
        .into();
        assert_eq!(event.event_type(), "OrderPlaced");
    }
}
