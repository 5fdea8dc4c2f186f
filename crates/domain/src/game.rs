//! Catalog game read model used by the purchase flow.

use common::{GameId, Money};
use serde::{Deserialize, Serialize};

/// A game as seen by the purchase handler: identity, display name, and the
/// current price charged at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub title: String,
    pub price: Money,
}

impl Game {
    pub fn new(id: GameId, title: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            title: title.into(),
            price,
        }
    }
}
