use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::order::OrderStatus;

/// Count and revenue for every order currently in one status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTotals {
    pub status: OrderStatus,
    pub count: i64,
    pub revenue: BigDecimal,
}

/// Live aggregate over every order ever placed.
///
/// Cancelled orders count toward both `total_orders` and `total_revenue`.
/// `status_breakdown` lists only statuses that currently hold at least one
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    #[schema(value_type = String, example = "60.00")]
    pub total_revenue: BigDecimal,
    #[schema(value_type = Object)]
    pub status_breakdown: BTreeMap<OrderStatus, i64>,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = i64)]
    pub timestamp: DateTime<Utc>,
}

impl OrderStats {
    pub fn from_groups<I>(groups: I, timestamp: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = StatusTotals>,
    {
        let mut stats = OrderStats {
            total_orders: 0,
            total_revenue: BigDecimal::from(0),
            status_breakdown: BTreeMap::new(),
            timestamp,
        };
        for group in groups {
            if group.count == 0 {
                continue;
            }
            stats.total_orders += group.count;
            stats.total_revenue += group.revenue;
            *stats.status_breakdown.entry(group.status).or_insert(0) += group.count;
        }
        stats
    }
}
