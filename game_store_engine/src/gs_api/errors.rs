use thiserror::Error;

use crate::{
    db_types::{GameId, OrderId},
    payments::{PaymentGatewayError, SignatureError},
    traits::StoreError,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order: {0}")]
    ValidationError(String),
    #[error("Game {0} does not exist")]
    GameNotFound(GameId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Not enough stock for '{title}': {available} available, {requested} requested")]
    InsufficientStock { title: String, available: i64, requested: i64 },
    #[error("You are not allowed to access order {0}")]
    Forbidden(OrderId),
    #[error("Payment provider error: {0}")]
    PaymentProvider(#[from] PaymentGatewayError),
    #[error("{0}")]
    StoreError(StoreError),
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            StoreError::GameNotFound(id) => OrderFlowError::GameNotFound(id),
            e => OrderFlowError::StoreError(e),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("Malformed payment notification: {0}")]
    MalformedPayload(String),
    #[error("Payment notification failed verification: {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("Invalid stock adjustment: {0}")]
    ValidationError(String),
    #[error("Game {0} does not exist")]
    GameNotFound(GameId),
    #[error("{0}")]
    StoreError(StoreError),
}

impl From<StoreError> for InventoryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::GameNotFound(id) => InventoryError::GameNotFound(id),
            e => InventoryError::StoreError(e),
        }
    }
}

impl From<InventoryError> for StoreError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::GameNotFound(id) => StoreError::GameNotFound(id),
            InventoryError::StoreError(e) => e,
            e => StoreError::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReviewError {
    #[error("Invalid review: {0}")]
    ValidationError(String),
    #[error("Game {0} does not exist")]
    GameNotFound(GameId),
    #[error("You have not reviewed game {0}")]
    ReviewNotFound(GameId),
    #[error("You have already reviewed game {0}")]
    DuplicateReview(GameId),
    #[error("{0}")]
    StoreError(StoreError),
}

impl From<StoreError> for ReviewError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::GameNotFound(id) => ReviewError::GameNotFound(id),
            StoreError::DuplicateReview(id) => ReviewError::DuplicateReview(id),
            e => ReviewError::StoreError(e),
        }
    }
}
