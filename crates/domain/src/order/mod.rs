//! Order aggregate: an order exclusively owns its line items, and its status
//! is derived from the item-status multiset rather than transitioned
//! incrementally.

mod aggregate;
mod status;

pub use aggregate::{Order, OrderItem, derive_order_status};
pub use status::{ItemStatus, OrderStatus};
