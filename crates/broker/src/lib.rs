//! Publish/subscribe seam.
//!
//! The [`EventPublisher`] and [`MessageHandler`] traits are the boundary to
//! the message transport. [`InMemoryBroker`] is an in-process stand-in with
//! at-least-once delivery: a handler error requeues the message for
//! redelivery. Real transport internals sit behind the same traits.

pub mod error;
pub mod memory;
pub mod publisher;

pub use error::BrokerError;
pub use memory::{Delivery, InMemoryBroker, Subscription};
pub use publisher::{EventPublisher, HandlerError, MessageHandler};
