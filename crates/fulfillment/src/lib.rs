//! Reliable event publication and order fulfillment.
//!
//! The purchase handler records an order and its `OrderPlaced` outbox record
//! in one transaction; the relay bridges durable storage to the broker on a
//! fixed interval; the payment-result consumer settles the order and grants
//! the library entitlement exactly-once-in-effect.

pub mod consumer;
pub mod error;
pub mod purchase;
pub mod relay;

pub use consumer::{PaymentResultConsumer, PaymentSubscriptionHandler};
pub use error::FulfillmentError;
pub use purchase::PurchaseHandler;
pub use relay::{OutboxRelay, RelayConfig, RelayHandle};
