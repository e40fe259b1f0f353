use thiserror::Error;

use crate::db_types::{GameId, OrderId};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Game {0} does not exist")]
    GameNotFound(GameId),
    #[error("A review by this user already exists for game {0}")]
    DuplicateReview(GameId),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

/// `true` if the error is a violated UNIQUE constraint.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
