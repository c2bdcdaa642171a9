use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::OrderStore;
use crate::domain::stats::{OrderStats, StatusTotals};

/// Process-local order store. Orders are kept in insertion order; every
/// operation takes the lock once, so `update_status` is atomic per order.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Order>>, DomainError> {
        self.orders
            .read()
            .map_err(|e| DomainError::Store(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Order>>, DomainError> {
        self.orders
            .write()
            .map_err(|e| DomainError::Store(e.to_string()))
    }

    fn newest_first<'a>(orders: impl DoubleEndedIterator<Item = &'a Order>) -> Vec<Order> {
        // Reversed insertion order breaks created_at ties toward the latest insert.
        let mut out: Vec<Order> = orders.rev().cloned().collect();
        out.sort_by_key(|o| Reverse(o.created_at));
        out
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.write()?;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(DomainError::Store(format!(
                "order {} already exists",
                order.id
            )));
        }
        orders.push(order.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.read()?.iter().find(|o| o.id == id).cloned())
    }

    fn find_by_user(&self, user_id: i64) -> Result<Vec<Order>, DomainError> {
        let orders = self.read()?;
        let mine: Vec<&Order> = orders.iter().filter(|o| o.user_id == user_id).collect();
        Ok(Self::newest_first(mine.into_iter()))
    }

    fn find_all(&self) -> Result<Vec<Order>, DomainError> {
        Ok(Self::newest_first(self.read()?.iter()))
    }

    fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        allowed_from: &[OrderStatus],
        at: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        let mut orders = self.write()?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DomainError::NotFound)?;
        if !allowed_from.contains(&order.status) {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }
        order.status = status;
        order.updated_at = at.max(order.updated_at + Duration::microseconds(1));
        Ok(order.clone())
    }

    fn stats(&self) -> Result<OrderStats, DomainError> {
        let orders = self.read()?;
        let mut groups: BTreeMap<OrderStatus, StatusTotals> = BTreeMap::new();
        for order in orders.iter() {
            let group = groups.entry(order.status).or_insert_with(|| StatusTotals {
                status: order.status,
                count: 0,
                revenue: BigDecimal::from(0),
            });
            group.count += 1;
            group.revenue += &order.total_amount;
        }
        Ok(OrderStats::from_groups(groups.into_values(), Utc::now()))
    }
}
