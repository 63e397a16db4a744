//! Domain error types.

use common::{Money, OrderStatus, ProductId};
use store::StoreError;
use thiserror::Error;

/// A request was missing data or carried malformed data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was not supplied.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A required text field was empty.
    #[error("{0} must not be blank")]
    BlankField(&'static str),

    /// Quantities must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// A single cart line may not grow past the store limit.
    #[error("Quantity exceeds the per-line limit of {limit}")]
    QuantityLimit { limit: u32 },

    /// Unit prices must not be negative.
    #[error("Invalid price for product {product_id}: {price}")]
    InvalidPrice { product_id: ProductId, price: Money },

    /// A checkout needs at least one item.
    #[error("Checkout has no items")]
    NoItems,

    /// The supplied total does not match the items.
    #[error("Total mismatch: items add up to {computed}, request says {supplied}")]
    TotalMismatch { computed: Money, supplied: Money },

    /// The items add up to more than can be represented.
    #[error("Total overflows")]
    TotalOverflow,

    /// The order lifecycle does not allow this status change.
    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// An update request changed nothing.
    #[error("No updatable fields supplied")]
    NoChanges,
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The addressed cart line, draft or order does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::QuantityLimitExceeded { limit, .. } => {
                DomainError::Validation(ValidationError::QuantityLimit { limit })
            }
            StoreError::Conflict(msg) => DomainError::Conflict(msg),
            other => DomainError::Store(other),
        }
    }
}
