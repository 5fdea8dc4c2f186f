pub mod correlation;
pub mod ids;
pub mod money;

pub use correlation::CorrelationId;
pub use ids::{GameId, OrderId, OrderItemId, UserId};
pub use money::Money;
