//! Persistence layer: the `CatalogStore` transactional seam with Postgres and
//! in-memory implementations.
//!
//! Every trait method is one atomic unit. In particular the order write and
//! its outbox record commit together or not at all; that atomicity is the
//! load-bearing guarantee of the outbox pattern.

pub mod error;
pub mod memory;
pub mod outbox;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryCatalogStore, InMemoryGameCatalog};
pub use outbox::OutboxRecord;
pub use postgres::PostgresCatalogStore;
pub use store::{CatalogStore, GameCatalog};
