use thiserror::Error;

use crate::{ProductId, UserId};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Merging into an existing cart line would exceed the per-line limit.
    #[error("Quantity limit of {limit} exceeded for user {user_id}, product {product_id}")]
    QuantityLimitExceeded {
        user_id: UserId,
        product_id: ProductId,
        limit: u32,
    },

    /// A stored row could not be mapped back into a model.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// The backing store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
