use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown order status '{s}'")))
    }
}

/// Embedded shipping address. Immutable once the order exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "9.99")]
    pub unit_price: BigDecimal,
    /// Always `unit_price * quantity`, computed server-side.
    #[schema(value_type = String, example = "19.98")]
    pub total_price: BigDecimal,
}

/// A line as supplied by the caller, before pricing.
#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl OrderItemInput {
    pub fn priced(self) -> OrderItem {
        let total_price = &self.unit_price * &BigDecimal::from(self.quantity);
        OrderItem {
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price,
        }
    }
}

/// Everything the caller decides about a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub user_email: String,
    pub items: Vec<OrderItemInput>,
    pub shipping_address: Address,
}

/// The order aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: i64,
    pub user_email: String,
    pub items: Vec<OrderItem>,
    #[schema(value_type = String, example = "25.00")]
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub shipping_address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materialize a fresh PENDING order. Item and order totals are derived
    /// here and nowhere else.
    pub fn place(new: NewOrder, order_number: String, now: DateTime<Utc>) -> Self {
        let items: Vec<OrderItem> = new.items.into_iter().map(OrderItemInput::priced).collect();
        let total_amount = total_of(&items);
        Order {
            id: Uuid::new_v4(),
            order_number,
            user_id: new.user_id,
            user_email: new.user_email,
            items,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address: new.shipping_address,
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn total_of(items: &[OrderItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::from(0), |acc, item| acc + &item.total_price)
}

/// Current UTC time at the precision PostgreSQL stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
