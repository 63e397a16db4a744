//! Cart aggregation: one line per (user, product), merged on repeated adds.

mod commands;
mod service;

pub use commands::{AddToCart, RemoveFromCart, SetQuantity};
pub use service::{CartAddition, CartService};

use store::MAX_LINE_QUANTITY;

use crate::error::ValidationError;

/// Checks a requested quantity and narrows it to the stored type.
///
/// Zero is rejected rather than treated as a removal; deleting a line is
/// always an explicit [`RemoveFromCart`].
pub(crate) fn validate_quantity(quantity: i64) -> Result<u32, ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::InvalidQuantity { quantity });
    }
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q <= MAX_LINE_QUANTITY)
        .ok_or(ValidationError::QuantityLimit {
            limit: MAX_LINE_QUANTITY,
        })
}
