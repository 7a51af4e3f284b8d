use serde::Deserialize;
use serde::Serialize;

use super::error::Result;
use super::state::ClientId;
use super::state::Order;
use super::state::OrderId;

/// Server-pushed notification. Delivery is at-least-once with no ordering across
/// orders; events caused by this client's own requests may come back too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PushEvent {
    NewOrder {
        order: Order,
    },
    OrderModified {
        order: Order,
    },
    OrderDeleted {
        order_id: OrderId,
        #[serde(default)]
        client_id: Option<ClientId>,
    },
    OrderUpdated {
        order: Order,
    },
    OrderSeenByFactory {
        order_id: OrderId,
    },
    OrderAssigned {
        order: Order,
    },
    WeekClosed {
        week: String,
        archived_count: usize,
        #[serde(default)]
        message: Option<String>,
    },
}

impl PushEvent {
    pub fn from_json(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "new_order",
            Self::OrderModified { .. } => "order_modified",
            Self::OrderDeleted { .. } => "order_deleted",
            Self::OrderUpdated { .. } => "order_updated",
            Self::OrderSeenByFactory { .. } => "order_seen_by_factory",
            Self::OrderAssigned { .. } => "order_assigned",
            Self::WeekClosed { .. } => "week_closed",
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::NewOrder { order }
            | Self::OrderModified { order }
            | Self::OrderUpdated { order }
            | Self::OrderAssigned { order } => Some(order.id),
            Self::OrderDeleted { order_id, .. } | Self::OrderSeenByFactory { order_id } => {
                Some(*order_id)
            }
            Self::WeekClosed { .. } => None,
        }
    }
}
