//! Library entitlement granted after an approved payment.

use chrono::{DateTime, Utc};
use common::{GameId, UserId};
use serde::{Deserialize, Serialize};

/// A user's entitlement to a game.
///
/// Identified by the `(user_id, game_id)` pair; the uniqueness constraint on
/// that pair in the store is the system's idempotency backstop for duplicate
/// payment deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub user_id: UserId,
    pub game_id: GameId,
    pub purchase_date: DateTime<Utc>,
}

impl LibraryEntry {
    /// Creates an entitlement dated now.
    pub fn grant(user_id: UserId, game_id: GameId) -> Self {
        Self {
            user_id,
            game_id,
            purchase_date: Utc::now(),
        }
    }
}
