//! Cart service providing the add/merge, edit and clear operations.

use common::UserId;
use store::{CartLine, CartStore, UpsertOutcome};

use super::{AddToCart, RemoveFromCart, SetQuantity, validate_quantity};
use crate::error::{DomainError, ValidationError};

/// Outcome of adding a product to a cart.
#[derive(Debug, Clone)]
pub struct CartAddition {
    pub line: CartLine,
    /// True if a new line was created, false if an existing one grew.
    pub created: bool,
}

/// Service owning per-user cart contents.
///
/// Every mutating call is a single store operation, persisted immediately.
pub struct CartService<S: CartStore> {
    store: S,
}

impl<S: CartStore> CartService<S> {
    /// Creates a new cart service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds a product to a cart, merging with an existing line for the same product.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, cmd: AddToCart) -> Result<CartAddition, DomainError> {
        ensure_user(&cmd.user_id)?;
        let quantity = validate_quantity(cmd.quantity)?;

        let upsert = self
            .store
            .upsert_cart_line(&cmd.user_id, cmd.product_id, quantity)
            .await?;

        let created = upsert.outcome == UpsertOutcome::Created;
        if created {
            metrics::counter!("cart_lines_created_total").increment(1);
        } else {
            metrics::counter!("cart_lines_merged_total").increment(1);
        }
        tracing::debug!(
            line_id = %upsert.line.id,
            quantity = upsert.line.quantity,
            created,
            "cart line upserted"
        );

        Ok(CartAddition {
            line: upsert.line,
            created,
        })
    }

    /// Overwrites the quantity of a line.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(&self, cmd: SetQuantity) -> Result<CartLine, DomainError> {
        let quantity = validate_quantity(cmd.quantity)?;

        self.store
            .set_cart_line_quantity(cmd.line_id, cmd.user_id.as_ref(), quantity)
            .await?
            .ok_or_else(|| DomainError::not_found("Cart line", cmd.line_id))
    }

    /// Deletes a line, returning what was removed.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, cmd: RemoveFromCart) -> Result<CartLine, DomainError> {
        self.store
            .delete_cart_line(cmd.line_id, cmd.user_id.as_ref())
            .await?
            .ok_or_else(|| DomainError::not_found("Cart line", cmd.line_id))
    }

    /// Empties a user's cart. Clearing an empty cart succeeds.
    ///
    /// Returns the number of lines removed.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: &UserId) -> Result<u64, DomainError> {
        ensure_user(user_id)?;
        let removed = self.store.clear_cart(user_id).await?;
        tracing::debug!(removed, "cart cleared");
        Ok(removed)
    }

    /// Lists a user's cart lines.
    #[tracing::instrument(skip(self))]
    pub async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>, DomainError> {
        ensure_user(user_id)?;
        Ok(self.store.list_cart(user_id).await?)
    }
}

fn ensure_user(user_id: &UserId) -> Result<(), ValidationError> {
    if user_id.is_blank() {
        return Err(ValidationError::BlankField("userId"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CartLineId;
    use store::{InMemoryStore, MAX_LINE_QUANTITY};

    fn create_service() -> CartService<InMemoryStore> {
        CartService::new(InMemoryStore::new())
    }

    #[tokio::test]
    async fn test_add_same_product_twice_merges() {
        let service = create_service();

        let first = service.add_item(AddToCart::new("u1", 2)).await.unwrap();
        assert!(first.created);
        assert_eq!(first.line.quantity, 1);

        let second = service.add_item(AddToCart::new("u1", 2)).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.line.id, first.line.id);
        assert_eq!(second.line.quantity, 2);

        let lines = service.list_cart(&UserId::new("u1")).await.unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_add_with_explicit_quantity() {
        let service = create_service();

        let result = service
            .add_item(AddToCart::new("u1", 7).with_quantity(3))
            .await
            .unwrap();
        assert_eq!(result.line.quantity, 3);
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let service = create_service();

        let result = service
            .add_item(AddToCart::new("u1", 2).with_quantity(0))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::InvalidQuantity {
                quantity: 0
            }))
        ));
        assert_eq!(service.store().cart_line_count().await, 0);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_user() {
        let service = create_service();

        let result = service.add_item(AddToCart::new(" ", 2)).await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::BlankField(_)))
        ));
    }

    #[tokio::test]
    async fn test_merge_past_limit_is_validation_error() {
        let service = create_service();
        service
            .add_item(AddToCart::new("u1", 2).with_quantity(i64::from(MAX_LINE_QUANTITY)))
            .await
            .unwrap();

        let result = service.add_item(AddToCart::new("u1", 2)).await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::QuantityLimit { .. }))
        ));
    }

    #[tokio::test]
    async fn test_set_quantity() {
        let service = create_service();
        let line = service
            .add_item(AddToCart::new("u1", 2))
            .await
            .unwrap()
            .line;

        let updated = service
            .set_quantity(SetQuantity::new(line.id, 5))
            .await
            .unwrap();
        assert_eq!(updated.quantity, 5);
    }

    #[tokio::test]
    async fn test_set_quantity_on_missing_line_is_not_found() {
        let service = create_service();
        let line = service
            .add_item(AddToCart::new("u1", 2))
            .await
            .unwrap()
            .line;

        let result = service
            .set_quantity(SetQuantity::new(CartLineId::new(999), 5))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));

        let unchanged = service.store().get_cart_line(line.id).await.unwrap();
        assert_eq!(unchanged.map(|l| l.quantity), Some(1));
    }

    #[tokio::test]
    async fn test_set_quantity_for_other_user_is_not_found() {
        let service = create_service();
        let line = service
            .add_item(AddToCart::new("u1", 2))
            .await
            .unwrap()
            .line;

        let result = service
            .set_quantity(SetQuantity::new(line.id, 5).for_user("u2"))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_quantity_zero_rejected() {
        let service = create_service();
        let line = service
            .add_item(AddToCart::new("u1", 2))
            .await
            .unwrap()
            .line;

        let result = service.set_quantity(SetQuantity::new(line.id, 0)).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_remove_item() {
        let service = create_service();
        let line = service
            .add_item(AddToCart::new("u1", 2))
            .await
            .unwrap()
            .line;

        let removed = service
            .remove_item(RemoveFromCart::new(line.id))
            .await
            .unwrap();
        assert_eq!(removed.id, line.id);

        let again = service.remove_item(RemoveFromCart::new(line.id)).await;
        assert!(matches!(again, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_clear_cart_is_idempotent() {
        let service = create_service();
        let user = UserId::new("u1");
        service.add_item(AddToCart::new("u1", 1)).await.unwrap();
        service.add_item(AddToCart::new("u1", 2)).await.unwrap();

        assert_eq!(service.clear_cart(&user).await.unwrap(), 2);
        assert_eq!(service.clear_cart(&user).await.unwrap(), 0);
        assert!(service.list_cart(&user).await.unwrap().is_empty());
    }
}
