//! The order aggregate and its status-derivation rule.

use chrono::{DateTime, Utc};
use common::{GameId, Money, OrderId, OrderItemId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::{ItemStatus, OrderStatus};

/// A line item within an order. Owned exclusively by its order; there is no
/// back-pointer beyond the foreign key used for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub game_id: GameId,
    pub price: Money,
    pub status: ItemStatus,
}

impl OrderItem {
    /// Creates a new pending item for a game at the given price.
    pub fn pending(game_id: GameId, price: Money) -> Self {
        Self {
            id: OrderItemId::new(),
            game_id,
            price,
            status: ItemStatus::Pending,
        }
    }
}

/// An order and its line items.
///
/// Created by the purchase handler; after creation it is mutated only by the
/// payment-result consumer and never deleted in normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Creates a new pending order for a single game purchase.
    pub fn place(user_id: UserId, game_id: GameId, price: Money) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Pending,
            total_price: price,
            created_at: now,
            updated_at: now,
            items: vec![OrderItem::pending(game_id, price)],
        }
    }

    /// Returns the line item for the given game, if any.
    pub fn item_for_game(&self, game_id: GameId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.game_id == game_id)
    }

    /// Applies a payment outcome to the item for `game_id` and re-derives the
    /// order status.
    ///
    /// Items are terminal once non-Pending, so replaying the same outcome is
    /// a no-op and a conflicting outcome from a late duplicate is ignored.
    /// The status derivation is a pure function of the item multiset, making
    /// the whole operation safe to apply on every broker delivery.
    pub fn apply_payment(
        &mut self,
        game_id: GameId,
        outcome: ItemStatus,
    ) -> Result<(), DomainError> {
        debug_assert!(outcome.is_terminal());

        let order_id = self.id;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.game_id == game_id)
            .ok_or(DomainError::ItemNotFound { order_id, game_id })?;

        match item.status {
            ItemStatus::Pending => item.status = outcome,
            settled if settled == outcome => {}
            settled => {
                tracing::warn!(
                    %order_id,
                    %game_id,
                    existing = %settled,
                    incoming = %outcome,
                    "ignoring conflicting payment outcome for settled item"
                );
            }
        }

        self.status = derive_order_status(&self.items);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Derives the order status from the item-status multiset.
///
/// Precedence: all items Approved → Completed; no Pending item and at least
/// one Rejected → Rejected; otherwise Approved (partially settled) unless
/// every item is still Pending.
pub fn derive_order_status(items: &[OrderItem]) -> OrderStatus {
    let all_approved = items.iter().all(|i| i.status == ItemStatus::Approved);
    let any_rejected = items.iter().any(|i| i.status == ItemStatus::Rejected);
    let any_pending = items.iter().any(|i| i.status == ItemStatus::Pending);
    let any_settled = items.iter().any(|i| i.status.is_terminal());

    if all_approved && !items.is_empty() {
        OrderStatus::Completed
    } else if any_rejected && !any_pending {
        OrderStatus::Rejected
    } else if any_settled {
        OrderStatus::Approved
    } else {
        OrderStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(status: ItemStatus) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(),
            game_id: GameId::new(),
            price: Money::from_cents(1000),
            status,
        }
    }

    #[test]
    fn place_creates_pending_order_with_one_pending_item() {
        let user_id = UserId::new();
        let game_id = GameId::new();
        let order = Order::place(user_id, game_id, Money::from_cents(5999));

        assert_eq!(order.user_id, user_id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price, Money::from_cents(5999));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].game_id, game_id);
        assert_eq!(order.items[0].status, ItemStatus::Pending);
        assert_eq!(order.items[0].price, Money::from_cents(5999));
    }

    #[test]
    fn derive_all_approved_is_completed() {
        let items = vec![item(ItemStatus::Approved), item(ItemStatus::Approved)];
        assert_eq!(derive_order_status(&items), OrderStatus::Completed);
    }

    #[test]
    fn derive_single_rejected_is_rejected() {
        let items = vec![item(ItemStatus::Rejected)];
        assert_eq!(derive_order_status(&items), OrderStatus::Rejected);
    }

    #[test]
    fn derive_approved_and_rejected_with_no_pending_is_rejected() {
        let items = vec![item(ItemStatus::Approved), item(ItemStatus::Rejected)];
        assert_eq!(derive_order_status(&items), OrderStatus::Rejected);
    }

    #[test]
    fn derive_pending_and_approved_is_approved() {
        let items = vec![item(ItemStatus::Pending), item(ItemStatus::Approved)];
        assert_eq!(derive_order_status(&items), OrderStatus::Approved);
    }

    #[test]
    fn derive_pending_and_rejected_is_approved_partial() {
        // A rejected item with others still pending leaves the order
        // partially settled, not terminally rejected.
        let items = vec![item(ItemStatus::Pending), item(ItemStatus::Rejected)];
        assert_eq!(derive_order_status(&items), OrderStatus::Approved);
    }

    #[test]
    fn derive_all_pending_is_pending() {
        let items = vec![item(ItemStatus::Pending), item(ItemStatus::Pending)];
        assert_eq!(derive_order_status(&items), OrderStatus::Pending);
    }

    #[test]
    fn apply_payment_approves_item_and_completes_order() {
        let game_id = GameId::new();
        let mut order = Order::place(UserId::new(), game_id, Money::from_cents(5999));

        order.apply_payment(game_id, ItemStatus::Approved).unwrap();

        assert_eq!(order.items[0].status, ItemStatus::Approved);
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn apply_payment_rejects_item_and_rejects_order() {
        let game_id = GameId::new();
        let mut order = Order::place(UserId::new(), game_id, Money::from_cents(5999));

        order.apply_payment(game_id, ItemStatus::Rejected).unwrap();

        assert_eq!(order.items[0].status, ItemStatus::Rejected);
        assert_eq!(order.status, OrderStatus::Rejected);
    }

    #[test]
    fn apply_payment_is_idempotent() {
        let game_id = GameId::new();
        let mut order = Order::place(UserId::new(), game_id, Money::from_cents(5999));

        order.apply_payment(game_id, ItemStatus::Approved).unwrap();
        let settled = order.clone();
        order.apply_payment(game_id, ItemStatus::Approved).unwrap();

        assert_eq!(order.items, settled.items);
        assert_eq!(order.status, settled.status);
    }

    #[test]
    fn apply_payment_ignores_conflicting_outcome() {
        let game_id = GameId::new();
        let mut order = Order::place(UserId::new(), game_id, Money::from_cents(5999));

        order.apply_payment(game_id, ItemStatus::Approved).unwrap();
        order.apply_payment(game_id, ItemStatus::Rejected).unwrap();

        // Terminal-once wins over the late duplicate.
        assert_eq!(order.items[0].status, ItemStatus::Approved);
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn apply_payment_unknown_game_is_item_not_found() {
        let mut order = Order::place(UserId::new(), GameId::new(), Money::from_cents(5999));

        let err = order
            .apply_payment(GameId::new(), ItemStatus::Approved)
            .unwrap_err();
        assert!(matches!(err, DomainError::ItemNotFound { .. }));
    }
}
