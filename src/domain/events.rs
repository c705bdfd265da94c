use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::OrderStatus;

/// Notification requests written to the outbox alongside the order mutation that
/// caused them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    OrderConfirmation { order_id: Uuid },
    StatusUpdate { order_id: Uuid, status: OrderStatus },
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderConfirmation { .. } => "order.confirmation",
            OrderEvent::StatusUpdate { .. } => "order.status_update",
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::OrderConfirmation { order_id } => *order_id,
            OrderEvent::StatusUpdate { order_id, .. } => *order_id,
        }
    }
}
