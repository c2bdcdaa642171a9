use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::schema::orders;

/// One order document. `items` and `shipping_address` are embedded as JSONB.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: i64,
    pub user_email: String,
    pub items: Value,
    pub total_amount: BigDecimal,
    pub status: String,
    pub shipping_address: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Order> for OrderRow {
    type Error = DomainError;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        Ok(OrderRow {
            id: order.id,
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            user_email: order.user_email.clone(),
            items: serde_json::to_value(&order.items)?,
            total_amount: order.total_amount.clone(),
            status: order.status.as_str().to_string(),
            shipping_address: serde_json::to_value(&order.shipping_address)?,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            user_email: row.user_email,
            items: serde_json::from_value(row.items)?,
            total_amount: row.total_amount,
            status: row.status.parse().map_err(|_| {
                DomainError::Store(format!("unknown stored status '{}'", row.status))
            })?,
            shipping_address: serde_json::from_value(row.shipping_address)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{now, Address, NewOrder, OrderItemInput};

    fn order() -> Order {
        Order::place(
            NewOrder {
                user_id: 3,
                user_email: "c@example.com".to_string(),
                items: vec![OrderItemInput {
                    product_id: 5,
                    product_name: "Lamp".to_string(),
                    quantity: 2,
                    unit_price: "12.50".parse().unwrap(),
                }],
                shipping_address: Address {
                    street: "5 Elm".to_string(),
                    city: "Paris".to_string(),
                    state: "IDF".to_string(),
                    postal_code: "75001".to_string(),
                    country: "FR".to_string(),
                },
            },
            "ORD-20250101-2222".to_string(),
            now(),
        )
    }

    #[test]
    fn row_embeds_items_and_address_as_documents() {
        let order = order();
        let row = OrderRow::try_from(&order).unwrap();

        assert_eq!(row.status, "PENDING");
        assert_eq!(row.items[0]["productName"], "Lamp");
        assert_eq!(row.shipping_address["postalCode"], "75001");

        let back = Order::try_from(row).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn unknown_stored_status_is_a_store_error() {
        let mut row = OrderRow::try_from(&order()).unwrap();
        row.status = "LOST".to_string();

        let err = Order::try_from(row).unwrap_err();
        assert!(matches!(err, DomainError::Store(_)));
    }
}
