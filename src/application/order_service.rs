use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{self, NewOrder, Order, OrderStatus};
use crate::domain::order_number::OrderNumberGenerator;
use crate::domain::ports::{EventPublisher, OrderStore};
use crate::domain::stats::OrderStats;
use crate::domain::transition;

/// The service as wired by the HTTP layer: store and publisher chosen at startup.
pub type SharedOrderService = OrderService<Arc<dyn OrderStore>, Arc<dyn EventPublisher>>;

/// Orchestrates the order lifecycle. Outcomes depend only on the store;
/// event publishing is attempted afterwards and its failures are logged.
pub struct OrderService<S, P> {
    store: S,
    publisher: P,
    numbers: OrderNumberGenerator,
}

impl<S: OrderStore, P: EventPublisher> OrderService<S, P> {
    pub fn new(store: S, publisher: P, numbers: OrderNumberGenerator) -> Self {
        Self {
            store,
            publisher,
            numbers,
        }
    }

    pub fn create_order(&self, new_order: NewOrder) -> Result<Order, DomainError> {
        let now = order::now();
        let order = Order::place(new_order, self.numbers.generate_at(now), now);

        self.store.insert(&order)?;
        log::info!(
            "Created order {} ({}) for user {}",
            order.order_number,
            order.id,
            order.user_id
        );

        if let Err(e) = self.publisher.publish_order_created(&order) {
            log::warn!("Failed to publish order created event for {}: {}", order.id, e);
        }

        Ok(order)
    }

    pub fn get_order(&self, id: Uuid) -> Result<Order, DomainError> {
        self.store.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    pub fn get_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>, DomainError> {
        self.store.find_by_user(user_id)
    }

    pub fn get_all_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.store.find_all()
    }

    pub fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, DomainError> {
        let order = self.store.update_status(
            id,
            status,
            transition::allowed_sources(status),
            order::now(),
        )?;
        log::info!("Order {} moved to {}", order.id, order.status);

        if let Err(e) = self.publisher.publish_order_status_updated(&order) {
            log::warn!(
                "Failed to publish order status updated event for {}: {}",
                order.id,
                e
            );
        }

        Ok(order)
    }

    pub fn get_stats(&self) -> Result<OrderStats, DomainError> {
        self.store.stats()
    }
}
