use super::order::OrderStatus;

/// Statuses an order may currently hold for a move to `target` to be accepted.
///
/// Every status is accepted today, including moving a delivered order back to
/// pending. Stores apply this inside their atomic update, so tightening the
/// lifecycle only touches this function.
pub fn allowed_sources(_target: OrderStatus) -> &'static [OrderStatus] {
    &OrderStatus::ALL
}
