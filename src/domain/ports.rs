use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::{DomainError, PublishError};
use super::order::{Order, OrderStatus};
use super::stats::OrderStats;

pub trait OrderStore: Send + Sync + 'static {
    /// Fails with [`DomainError::Store`] if an order with the same id exists.
    fn insert(&self, order: &Order) -> Result<(), DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Newest first.
    fn find_by_user(&self, user_id: i64) -> Result<Vec<Order>, DomainError>;
    /// Newest first.
    fn find_all(&self) -> Result<Vec<Order>, DomainError>;
    /// Atomically sets `status` and `updated_at` if the current status is one
    /// of `allowed_from`, returning the document exactly as written.
    fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        allowed_from: &[OrderStatus],
        at: DateTime<Utc>,
    ) -> Result<Order, DomainError>;
    fn stats(&self) -> Result<OrderStats, DomainError>;
}

pub trait EventPublisher: Send + Sync + 'static {
    fn publish_order_created(&self, order: &Order) -> Result<(), PublishError>;
    fn publish_order_status_updated(&self, order: &Order) -> Result<(), PublishError>;
}

impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    fn insert(&self, order: &Order) -> Result<(), DomainError> {
        (**self).insert(order)
    }
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        (**self).find_by_id(id)
    }
    fn find_by_user(&self, user_id: i64) -> Result<Vec<Order>, DomainError> {
        (**self).find_by_user(user_id)
    }
    fn find_all(&self) -> Result<Vec<Order>, DomainError> {
        (**self).find_all()
    }
    fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        allowed_from: &[OrderStatus],
        at: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        (**self).update_status(id, status, allowed_from, at)
    }
    fn stats(&self) -> Result<OrderStats, DomainError> {
        (**self).stats()
    }
}

impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    fn publish_order_created(&self, order: &Order) -> Result<(), PublishError> {
        (**self).publish_order_created(order)
    }
    fn publish_order_status_updated(&self, order: &Order) -> Result<(), PublishError> {
        (**self).publish_order_status_updated(order)
    }
}
