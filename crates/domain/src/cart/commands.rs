//! Cart commands.

use common::{CartLineId, ProductId, UserId};

/// Command to add a product to a user's cart.
///
/// The quantity is kept as the caller sent it and validated by the service.
#[derive(Debug, Clone)]
pub struct AddToCart {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
}

impl AddToCart {
    /// Adds a single unit.
    pub fn new(user_id: impl Into<UserId>, product_id: impl Into<ProductId>) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            quantity: 1,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Command to overwrite the quantity of one cart line.
#[derive(Debug, Clone)]
pub struct SetQuantity {
    pub line_id: CartLineId,
    pub quantity: i64,
    /// When set, lines owned by anyone else are reported as not found.
    pub user_id: Option<UserId>,
}

impl SetQuantity {
    pub fn new(line_id: impl Into<CartLineId>, quantity: i64) -> Self {
        Self {
            line_id: line_id.into(),
            quantity,
            user_id: None,
        }
    }

    /// Restricts the command to lines owned by `user_id`.
    pub fn for_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Command to delete one cart line.
#[derive(Debug, Clone)]
pub struct RemoveFromCart {
    pub line_id: CartLineId,
    pub user_id: Option<UserId>,
}

impl RemoveFromCart {
    pub fn new(line_id: impl Into<CartLineId>) -> Self {
        Self {
            line_id: line_id.into(),
            user_id: None,
        }
    }

    pub fn for_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}
