use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::order::{Order, OrderItem, OrderStatus};

pub const ORDER_CREATED_ROUTING_KEY: &str = "order.created";
pub const ORDER_STATUS_UPDATED_ROUTING_KEY: &str = "order.status.updated";

/// Domain events as they appear on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    #[serde(rename_all = "camelCase")]
    OrderCreated {
        order_id: Uuid,
        order_number: String,
        user_id: i64,
        user_email: String,
        total_amount: BigDecimal,
        status: OrderStatus,
        items: Vec<OrderItem>,
        /// Unix epoch seconds at publish time.
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    OrderStatusUpdated {
        order_id: Uuid,
        order_number: String,
        user_id: i64,
        status: OrderStatus,
        timestamp: i64,
    },
}

impl OrderEvent {
    pub fn created(order: &Order, at: DateTime<Utc>) -> Self {
        OrderEvent::OrderCreated {
            order_id: order.id,
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            user_email: order.user_email.clone(),
            total_amount: order.total_amount.clone(),
            status: order.status,
            items: order.items.clone(),
            timestamp: at.timestamp(),
        }
    }

    pub fn status_updated(order: &Order, at: DateTime<Utc>) -> Self {
        OrderEvent::OrderStatusUpdated {
            order_id: order.id,
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            status: order.status,
            timestamp: at.timestamp(),
        }
    }

    pub fn routing_key(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated { .. } => ORDER_CREATED_ROUTING_KEY,
            OrderEvent::OrderStatusUpdated { .. } => ORDER_STATUS_UPDATED_ROUTING_KEY,
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::OrderCreated { order_id, .. }
            | OrderEvent::OrderStatusUpdated { order_id, .. } => *order_id,
        }
    }
}
