//! Order and order-item status enums.

use serde::{Deserialize, Serialize};

/// Status of a single order line item.
///
/// `Pending` is the only mutable state; once an item is `Approved` or
/// `Rejected` it is terminal and never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ItemStatus {
    /// Returns true once the item has a payment outcome.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Approved => "Approved",
            ItemStatus::Rejected => "Rejected",
        }
    }

    /// Parses a status name stored in the database.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(ItemStatus::Pending),
            "Approved" => Some(ItemStatus::Approved),
            "Rejected" => Some(ItemStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of an order, always derived from its items.
///
/// `Approved` means partially settled: some items have an outcome but at
/// least one is still pending, or the settled subset is all approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl OrderStatus {
    /// Returns true if no further payment outcomes can change the order.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Rejected)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Approved => "Approved",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Completed => "Completed",
        }
    }

    /// Parses a status name stored in the database.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(OrderStatus::Pending),
            "Approved" => Some(OrderStatus::Approved),
            "Rejected" => Some(OrderStatus::Rejected),
            "Completed" => Some(OrderStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
