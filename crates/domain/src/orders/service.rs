//! Order service over confirmed orders.

use common::OrderId;
use store::{ConfirmedOrder, OrderStore};

use super::UpdateOrder;
use crate::error::{DomainError, ValidationError};

/// Service for reading and administering confirmed orders.
///
/// Orders are only ever created by checkout confirmation; there is no
/// direct order creation.
pub struct OrderService<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<ConfirmedOrder>, DomainError> {
        Ok(self.store.list_orders().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<ConfirmedOrder, DomainError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))
    }

    /// Applies a status/courier/tracking update.
    ///
    /// A status change must follow the [`common::OrderStatus`] lifecycle. The write
    /// is conditional on the status it was checked against, so a concurrent
    /// change surfaces as `Conflict`.
    #[tracing::instrument(skip(self))]
    pub async fn update_order(&self, cmd: UpdateOrder) -> Result<ConfirmedOrder, DomainError> {
        if cmd.update.is_empty() {
            return Err(ValidationError::NoChanges.into());
        }

        let expected_status = match cmd.update.status {
            Some(next) => {
                let current = self.get_order(cmd.order_id).await?.status;
                if !current.can_transition_to(next) {
                    return Err(ValidationError::InvalidStatusTransition {
                        from: current,
                        to: next,
                    }
                    .into());
                }
                Some(current)
            }
            None => None,
        };

        let order = self
            .store
            .update_order(cmd.order_id, expected_status, &cmd.update)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", cmd.order_id))?;

        tracing::info!(order_id = %order.id, status = %order.status, "order updated");
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<ConfirmedOrder, DomainError> {
        self.store
            .delete_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))
    }
}
