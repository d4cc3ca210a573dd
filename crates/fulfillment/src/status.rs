//! Order status lifecycle.

use serde::{Deserialize, Serialize};

/// The status of an order in its fulfillment lifecycle.
///
/// The lifecycle is linear, no skips and no cycles:
/// ```text
/// Created ──► Assembled ──► InTransit ──► AtPickupPoint ──► Completed
/// ```
///
/// Orders are always created as `Created`; every later transition is
/// driven by an external fulfillment workflow through
/// [`crate::OrderFulfillment::update_order_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been placed and stock decremented.
    #[default]
    Created,

    /// All items have been picked and packed.
    Assembled,

    /// Order has left the warehouse.
    InTransit,

    /// Order has arrived at the pickup point.
    AtPickupPoint,

    /// Order was collected (terminal state).
    Completed,
}

impl OrderStatus {
    /// Returns the immediate successor in the lifecycle, or `None` for
    /// the terminal state.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Created => Some(OrderStatus::Assembled),
            OrderStatus::Assembled => Some(OrderStatus::InTransit),
            OrderStatus::InTransit => Some(OrderStatus::AtPickupPoint),
            OrderStatus::AtPickupPoint => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    /// Returns true if `to` is the immediate next status in sequence.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Assembled => "ASSEMBLED",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::AtPickupPoint => "AT_PICKUP_POINT",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "CREATED" => Some(OrderStatus::Created),
            "ASSEMBLED" => Some(OrderStatus::Assembled),
            "IN_TRANSIT" => Some(OrderStatus::InTransit),
            "AT_PICKUP_POINT" => Some(OrderStatus::AtPickupPoint),
            "COMPLETED" => Some(OrderStatus::Completed),
            _ => None,
        }
    }

    /// All statuses in lifecycle order.
    pub fn all() -> [OrderStatus; 5] {
        [
            OrderStatus::Created,
            OrderStatus::Assembled,
            OrderStatus::InTransit,
            OrderStatus::AtPickupPoint,
            OrderStatus::Completed,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
