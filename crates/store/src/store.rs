use async_trait::async_trait;
use common::OrderStatus;

use crate::{
    CartLine, CartLineId, CartUpsert, Confirmation, ConfirmedOrder, Draft, DraftId, OrderId,
    OrderUpdate, ProductId, Result, UserId,
};

/// Persistence for shopping cart lines.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds `quantity` of a product to a user's cart in one atomic step.
    ///
    /// Creates the line if the (user, product) pair has none, otherwise
    /// increments the existing line. Concurrent calls for the same pair
    /// never produce two lines. Fails with `QuantityLimitExceeded` if the
    /// merged quantity would exceed [`crate::MAX_LINE_QUANTITY`].
    async fn upsert_cart_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartUpsert>;

    /// Retrieves a single cart line.
    async fn get_cart_line(&self, id: CartLineId) -> Result<Option<CartLine>>;

    /// Overwrites the quantity of a line.
    ///
    /// When `owner` is given, a line belonging to another user is treated
    /// as absent. Returns None if nothing was updated.
    async fn set_cart_line_quantity(
        &self,
        id: CartLineId,
        owner: Option<&UserId>,
        quantity: u32,
    ) -> Result<Option<CartLine>>;

    /// Deletes a line, returning it. Same ownership rule as above.
    async fn delete_cart_line(
        &self,
        id: CartLineId,
        owner: Option<&UserId>,
    ) -> Result<Option<CartLine>>;

    /// Deletes every line of a user's cart, returning how many were removed.
    async fn clear_cart(&self, user_id: &UserId) -> Result<u64>;

    /// Lists a user's cart lines.
    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>>;
}

/// Persistence for checkout drafts and their hand-off into orders.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Stores a new draft. Fails with `Conflict` if the id is taken.
    async fn insert_draft(&self, draft: Draft) -> Result<Draft>;

    /// Retrieves a draft.
    async fn get_draft(&self, id: DraftId) -> Result<Option<Draft>>;

    /// Lists drafts, optionally restricted to one user. Oldest first.
    async fn list_drafts(&self, user_id: Option<&UserId>) -> Result<Vec<Draft>>;

    /// Deletes a draft without producing an order.
    async fn delete_draft(&self, id: DraftId) -> Result<Option<Draft>>;

    /// Consumes a draft and stores the order it becomes, atomically.
    ///
    /// Either the draft is gone and the returned order exists, or (on any
    /// error) the draft is untouched and no order was stored. Returns None
    /// if the draft does not exist; of two concurrent confirmations of the
    /// same draft, exactly one sees it.
    async fn confirm_draft(
        &self,
        id: DraftId,
        confirmation: Confirmation,
    ) -> Result<Option<ConfirmedOrder>>;
}

/// Persistence for confirmed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, id: OrderId) -> Result<Option<ConfirmedOrder>>;

    /// Lists all orders by ascending id.
    async fn list_orders(&self) -> Result<Vec<ConfirmedOrder>>;

    /// Applies an allow-listed update. Returns None if the order is absent.
    ///
    /// With `expected_status`, the update only applies while the stored
    /// status still equals it; otherwise it fails with `Conflict`.
    async fn update_order(
        &self,
        id: OrderId,
        expected_status: Option<OrderStatus>,
        update: &OrderUpdate,
    ) -> Result<Option<ConfirmedOrder>>;

    async fn delete_order(&self, id: OrderId) -> Result<Option<ConfirmedOrder>>;
}

/// A backend providing every kind of persistence the service needs.
pub trait Store: CartStore + CheckoutStore + OrderStore {}

// Blanket implementation for all complete backends
impl<T: CartStore + CheckoutStore + OrderStore + ?Sized> Store for T {}
