//! Domain error types.

use common::{GameId, OrderId, UserId};
use thiserror::Error;

/// Validation errors surfaced synchronously to the caller. These are never
/// retried.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested game does not exist in the catalog.
    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    /// The user already owns the game or has an in-flight order for it.
    #[error("Game {game_id} already purchased by user {user_id}")]
    GameAlreadyPurchased { user_id: UserId, game_id: GameId },

    /// The order has no line item for the given game.
    #[error("Order {order_id} has no item for game {game_id}")]
    ItemNotFound { order_id: OrderId, game_id: GameId },
}
