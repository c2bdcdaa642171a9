use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, sum, IntervalDsl};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel::sql_types::Timestamptz;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::OrderStore;
use crate::domain::stats::{OrderStats, StatusTotals};
use crate::schema::orders;

use super::models::OrderRow;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Store(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Store(format!("malformed order document: {e}"))
    }
}

diesel::define_sql_function!(fn greatest(a: Timestamptz, b: Timestamptz) -> Timestamptz);

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    rows.into_iter().map(Order::try_from).collect()
}

impl OrderStore for DieselOrderStore {
    fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let row = OrderRow::try_from(order)?;

        diesel::insert_into(orders::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Store(format!("order {} already exists", order.id))
                }
                other => other.into(),
            })?;
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Order::try_from)
            .transpose()
    }

    fn find_by_user(&self, user_id: i64) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;
        to_orders(rows)
    }

    fn find_all(&self) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;
        to_orders(rows)
    }

    fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        allowed_from: &[OrderStatus],
        at: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;
        let sources: Vec<&str> = allowed_from.iter().map(OrderStatus::as_str).collect();

        // Single UPDATE ... RETURNING: the row lock makes the returned document
        // exactly the one this statement wrote.
        let updated = diesel::update(
            orders::table
                .filter(orders::id.eq(id))
                .filter(orders::status.eq_any(sources)),
        )
        .set((
            orders::status.eq(status.as_str()),
            // Never equal to or behind the stored value, whatever the clock says.
            orders::updated_at.eq(greatest(at, orders::updated_at + 1_i64.microseconds())),
        ))
        .returning(OrderRow::as_returning())
        .get_result(&mut conn)
        .optional()?;

        if let Some(row) = updated {
            return Order::try_from(row);
        }

        // Nothing matched: either the order is missing or its status is not
        // an accepted source.
        let current: Option<String> = orders::table
            .find(id)
            .select(orders::status)
            .first(&mut conn)
            .optional()?;
        match current {
            None => Err(DomainError::NotFound),
            Some(from) => Err(DomainError::InvalidTransition {
                from: from
                    .parse()
                    .map_err(|_| DomainError::Store(format!("unknown stored status '{from}'")))?,
                to: status,
            }),
        }
    }

    fn stats(&self) -> Result<OrderStats, DomainError> {
        let mut conn = self.pool.get()?;

        let groups: Vec<(String, i64, Option<BigDecimal>)> = orders::table
            .group_by(orders::status)
            .select((orders::status, count_star(), sum(orders::total_amount)))
            .load(&mut conn)?;

        let totals = groups
            .into_iter()
            .map(|(status, count, revenue)| {
                Ok(StatusTotals {
                    status: status.parse().map_err(|_| {
                        DomainError::Store(format!("unknown stored status '{status}'"))
                    })?,
                    count,
                    revenue: revenue.unwrap_or_else(|| BigDecimal::from(0)),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(OrderStats::from_groups(totals, Utc::now()))
    }
}
