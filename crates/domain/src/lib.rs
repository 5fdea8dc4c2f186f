//! Domain layer for the catalog purchase and fulfillment flow.
//!
//! Contains the order aggregate with its status-derivation rule, the event
//! contracts crossing the broker boundary, and the closed registry that maps
//! event tags to decoders.

pub mod error;
pub mod events;
pub mod game;
pub mod library;
pub mod order;
pub mod registry;

pub use error::DomainError;
pub use events::{CatalogEvent, OrderPlaced, PaymentProcessed, PaymentStatus};
pub use game::Game;
pub use library::LibraryEntry;
pub use order::{ItemStatus, Order, OrderItem, OrderStatus, derive_order_status};
pub use registry::{EventRegistry, RegistryError};
