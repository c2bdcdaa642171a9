use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::SharedOrderService;
use crate::domain::errors::DomainError;
use crate::domain::order::{Address, NewOrder, Order, OrderItemInput, OrderStatus};
use crate::domain::stats::OrderStats;
use crate::errors::AppError;

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    /// Decimal price, as a string ("9.99") or a JSON number. Any `totalPrice`
    /// sent by the caller is ignored and recomputed.
    #[schema(value_type = String, example = "9.99")]
    #[serde(deserialize_with = "decimal_from_json")]
    pub unit_price: BigDecimal,
}

/// Parses a JSON number from its written digits, so `9.99` stays `9.99`
/// instead of the nearest binary float.
fn decimal_from_json<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => {
            return Err(de::Error::custom(format!(
                "expected a decimal string or number, found {other}"
            )))
        }
    };
    BigDecimal::from_str(text.trim()).map_err(de::Error::custom)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: i64,
    pub user_email: String,
    pub items: Vec<CreateOrderItemRequest>,
    pub shipping_address: Address,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Column width of `orders.user_email`.
const MAX_EMAIL_LEN: usize = 320;

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

impl CreateOrderRequest {
    /// Checks presence and ranges, reporting every problem at once.
    pub fn validate(self) -> Result<NewOrder, DomainError> {
        let mut problems = Vec::new();

        if self.user_id == 0 {
            problems.push("userId is required".to_string());
        }
        let email = self.user_email.trim();
        if !looks_like_email(email) {
            problems.push("userEmail must be a valid email address".to_string());
        } else if email.chars().count() > MAX_EMAIL_LEN {
            problems.push(format!("userEmail must be at most {MAX_EMAIL_LEN} characters"));
        }
        if self.items.is_empty() {
            problems.push("items must not be empty".to_string());
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.product_name.trim().is_empty() {
                problems.push(format!("items[{i}].productName is required"));
            }
            if item.quantity < 1 {
                problems.push(format!("items[{i}].quantity must be at least 1"));
            }
            if item.unit_price < BigDecimal::from(0) {
                problems.push(format!("items[{i}].unitPrice must not be negative"));
            }
        }
        let address = &self.shipping_address;
        for (field, value) in [
            ("street", &address.street),
            ("city", &address.city),
            ("state", &address.state),
            ("postalCode", &address.postal_code),
            ("country", &address.country),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("shippingAddress.{field} is required"));
            }
        }

        if !problems.is_empty() {
            return Err(DomainError::Validation(problems.join("; ")));
        }

        Ok(NewOrder {
            user_id: self.user_id,
            user_email: self.user_email.trim().to_string(),
            items: self
                .items
                .into_iter()
                .map(|i| OrderItemInput {
                    product_id: i.product_id,
                    product_name: i.product_name,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
            shipping_address: self.shipping_address,
        })
    }
}

fn parse_order_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("invalid order id '{raw}'")))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/v1/orders
///
/// Prices the items, assigns an order number and stores the order as PENDING.
/// The `order.created` event is published afterwards; a broker outage does not
/// affect the response.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<SharedOrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let new_order = body.into_inner().validate()?;

    let order = web::block(move || service.create_order(new_order))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(order))
}

/// GET /api/v1/orders/{id}
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(
        ("id" = String, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 400, description = "Malformed order id"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<SharedOrderService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = parse_order_id(&path.into_inner())?;

    let order = web::block(move || service.get_order(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(order))
}

/// GET /api/v1/orders
///
/// Every order, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "All orders, newest first", body = [Order]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<SharedOrderService>,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.get_all_orders())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(orders))
}

/// GET /api/v1/orders/user/{user_id}
#[utoipa::path(
    get,
    path = "/api/v1/orders/user/{user_id}",
    params(
        ("user_id" = i64, Path, description = "Purchaser id"),
    ),
    responses(
        (status = 200, description = "The user's orders, newest first", body = [Order]),
        (status = 400, description = "Malformed user id"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_user_orders(
    service: web::Data<SharedOrderService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw = path.into_inner();
    let user_id: i64 = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid user id '{raw}'")))?;

    let orders = web::block(move || service.get_orders_by_user(user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(orders))
}

/// PATCH /api/v1/orders/{id}/status
///
/// Any status may be set from any other. The `order.status.updated` event is
/// published after the write.
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    params(
        ("id" = String, Path, description = "Order UUID"),
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Order),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    service: web::Data<SharedOrderService>,
    path: web::Path<String>,
    body: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = parse_order_id(&path.into_inner())?;
    let status = body.into_inner().status;

    let order = web::block(move || service.update_status(order_id, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(order))
}

/// GET /api/v1/orders/stats
#[utoipa::path(
    get,
    path = "/api/v1/orders/stats",
    responses(
        (status = 200, description = "Live order statistics", body = OrderStats),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn order_stats(
    service: web::Data<SharedOrderService>,
) -> Result<HttpResponse, AppError> {
    let stats = web::block(move || service.get_stats())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateOrderRequest {
        serde_json::from_value(serde_json::json!({
            "userId": 1,
            "userEmail": "a@example.com",
            "items": [
                {"productId": 1, "productName": "Pen", "quantity": 2, "unitPrice": 10.0},
                {"productId": 2, "productName": "Ink", "quantity": 1, "unitPrice": "5.0", "totalPrice": 999}
            ],
            "shippingAddress": {
                "street": "1 Main St", "city": "Springfield", "state": "IL",
                "postalCode": "62701", "country": "US"
            }
        }))
        .expect("valid request json")
    }

    #[test]
    fn valid_request_becomes_new_order() {
        let new_order = request().validate().expect("valid");
        assert_eq!(new_order.user_id, 1);
        assert_eq!(new_order.items.len(), 2);
        assert_eq!(new_order.items[1].unit_price, "5.0".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn numeric_price_keeps_its_written_digits() {
        let item: CreateOrderItemRequest = serde_json::from_str(
            r#"{"productId": 1, "productName": "Pen", "quantity": 3, "unitPrice": 9.99}"#,
        )
        .unwrap();
        assert_eq!(item.unit_price.to_string(), "9.99");
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let parsed = serde_json::from_str::<CreateOrderItemRequest>(
            r#"{"productId": 1, "productName": "Pen", "quantity": 1, "unitPrice": true}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn overlong_email_is_rejected() {
        let mut req = request();
        req.user_email = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(matches!(
            req.validate(),
            Err(DomainError::Validation(msg)) if msg.contains("at most 320")
        ));

        let mut req = request();
        let domain = "@example.com";
        req.user_email = format!("{}{domain}", "a".repeat(MAX_EMAIL_LEN - domain.len()));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_items_are_rejected() {
        let mut req = request();
        req.items.clear();
        assert!(matches!(
            req.validate(),
            Err(DomainError::Validation(msg)) if msg.contains("items")
        ));
    }

    #[test]
    fn every_problem_is_reported() {
        let mut req = request();
        req.user_email = "not-an-email".to_string();
        req.items[0].quantity = 0;
        req.items[1].unit_price = BigDecimal::from(-1);
        req.shipping_address.city = "  ".to_string();

        let Err(DomainError::Validation(msg)) = req.validate() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("userEmail"));
        assert!(msg.contains("items[0].quantity"));
        assert!(msg.contains("items[1].unitPrice"));
        assert!(msg.contains("shippingAddress.city"));
    }

    #[test]
    fn email_check_needs_both_sides() {
        assert!(looks_like_email("a@b.c"));
        assert!(!looks_like_email("@b.c"));
        assert!(!looks_like_email("a@"));
        assert!(!looks_like_email("a@b@c"));
    }

    #[test]
    fn unknown_status_fails_to_deserialize() {
        let parsed: Result<UpdateOrderStatusRequest, _> =
            serde_json::from_value(serde_json::json!({"status": "LOST"}));
        assert!(parsed.is_err());
    }
}
