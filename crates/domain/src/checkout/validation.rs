//! Draft request validation.

use common::{Address, LineItem, Money, UserId};
use store::MAX_LINE_QUANTITY;

use super::CreateDraft;
use crate::error::ValidationError;

/// A draft request that passed every check.
#[derive(Debug)]
pub(crate) struct ValidDraft {
    pub user_id: UserId,
    pub name: String,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub address: Address,
    pub payment_method: String,
}

/// Validates a draft request, recomputing the total from the items.
pub(crate) fn validate_draft(cmd: CreateDraft) -> Result<ValidDraft, ValidationError> {
    if cmd.user_id.is_blank() {
        return Err(ValidationError::BlankField("userId"));
    }
    if cmd.items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    for item in &cmd.items {
        if item.quantity == 0 {
            return Err(ValidationError::InvalidQuantity { quantity: 0 });
        }
        if item.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::QuantityLimit {
                limit: MAX_LINE_QUANTITY,
            });
        }
        if item.unit_price.is_negative() {
            return Err(ValidationError::InvalidPrice {
                product_id: item.product_id,
                price: item.unit_price,
            });
        }
    }

    let supplied = cmd.total.ok_or(ValidationError::MissingField("total"))?;
    let address = cmd.address.ok_or(ValidationError::MissingField("address"))?;
    if address.is_incomplete() {
        return Err(ValidationError::BlankField("address"));
    }
    let payment_method = cmd
        .payment_method
        .ok_or(ValidationError::MissingField("payment"))?;
    if payment_method.trim().is_empty() {
        return Err(ValidationError::BlankField("payment"));
    }

    let computed = compute_total(&cmd.items)?;
    if computed != supplied {
        return Err(ValidationError::TotalMismatch { computed, supplied });
    }

    let name = cmd
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| address.name.clone());

    Ok(ValidDraft {
        user_id: cmd.user_id,
        name,
        items: cmd.items,
        total: computed,
        address,
        payment_method,
    })
}

/// Sums `quantity * unit_price` over the items.
pub(crate) fn compute_total(items: &[LineItem]) -> Result<Money, ValidationError> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        item.subtotal()
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or(ValidationError::TotalOverflow)
    })
}
