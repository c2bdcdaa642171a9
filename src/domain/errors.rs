use thiserror::Error;

use super::order::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Order not found")]
    NotFound,
    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Store error: {0}")]
    Store(String),
}

/// Failure to hand a domain event to the broker. Never surfaced to callers of
/// the order operations.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Event broker not available")]
    Unavailable,
    #[error("Event queue is full")]
    QueueFull,
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Broker rejected event: {0}")]
    Broker(String),
    #[error("Timed out delivering event")]
    Timeout,
}
