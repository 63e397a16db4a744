//! Checkout service driving the draft lifecycle.

use chrono::Utc;
use common::{DraftId, PaymentStatus, UserId};
use store::{CheckoutStore, Confirmation, ConfirmedOrder, Draft};

use super::validation::validate_draft;
use super::{ConfirmDraft, CreateDraft};
use crate::error::DomainError;

/// Service owning the draft → confirmed order hand-off.
///
/// Holds no state between calls; the store is the only shared resource.
pub struct CheckoutService<S: CheckoutStore> {
    store: S,
}

impl<S: CheckoutStore> CheckoutService<S> {
    /// Creates a new checkout service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates a checkout request and stores it as an unpaid draft.
    ///
    /// Nothing is stored if validation fails.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id))]
    pub async fn create_draft(&self, cmd: CreateDraft) -> Result<Draft, DomainError> {
        let valid = validate_draft(cmd)?;

        let draft = Draft {
            id: DraftId::new(),
            user_id: valid.user_id,
            name: valid.name,
            items: valid.items,
            total: valid.total,
            address: valid.address,
            payment_method: valid.payment_method,
            payment_status: PaymentStatus::Unpaid,
            created_at: Utc::now(),
        };
        let draft = self.store.insert_draft(draft).await?;

        metrics::counter!("checkout_drafts_created_total").increment(1);
        tracing::info!(draft_id = %draft.id, total = %draft.total, "draft created");

        Ok(draft)
    }

    /// Confirms payment of a draft, turning it into an order.
    ///
    /// The draft is consumed: a second confirmation of the same id, or a
    /// confirmation after abandonment, fails with `NotFound`. On a store
    /// failure the draft stays in place and no order exists.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_draft(&self, cmd: ConfirmDraft) -> Result<ConfirmedOrder, DomainError> {
        let started = std::time::Instant::now();
        let confirmation = Confirmation::new(cmd.payment_proof.unwrap_or_default());

        let order = match self.store.confirm_draft(cmd.draft_id, confirmation).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                metrics::counter!("checkout_confirm_not_found_total").increment(1);
                return Err(DomainError::not_found("Draft", cmd.draft_id));
            }
            Err(e) => {
                tracing::warn!(draft_id = %cmd.draft_id, error = %e, "draft confirmation failed");
                return Err(e.into());
            }
        };

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("checkout_confirm_duration_seconds").record(duration);
        metrics::counter!("checkout_drafts_confirmed_total").increment(1);
        tracing::info!(
            draft_id = %cmd.draft_id,
            order_id = %order.id,
            duration,
            "draft confirmed"
        );

        Ok(order)
    }

    /// Discards a draft without producing an order.
    #[tracing::instrument(skip(self))]
    pub async fn abandon_draft(&self, draft_id: DraftId) -> Result<Draft, DomainError> {
        let draft = self
            .store
            .delete_draft(draft_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Draft", draft_id))?;

        metrics::counter!("checkout_drafts_abandoned_total").increment(1);
        tracing::info!(%draft_id, "draft abandoned");

        Ok(draft)
    }

    /// Loads a draft by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_draft(&self, draft_id: DraftId) -> Result<Draft, DomainError> {
        self.store
            .get_draft(draft_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Draft", draft_id))
    }

    /// Lists open drafts, optionally for a single user.
    #[tracing::instrument(skip(self))]
    pub async fn list_drafts(&self, user_id: Option<&UserId>) -> Result<Vec<Draft>, DomainError> {
        Ok(self.store.list_drafts(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use common::{Address, LineItem, Money, OrderStatus};
    use store::InMemoryStore;

    fn create_service() -> CheckoutService<InMemoryStore> {
        CheckoutService::new(InMemoryStore::new())
    }

    fn draft_request(user: &str) -> CreateDraft {
        CreateDraft::new(user, vec![LineItem::new(2, 1, Money::from_minor(950_000))])
            .with_total(Money::from_minor(950_000))
            .with_address(Address::new("Dani", "Jl. Merdeka 1", "0812"))
            .with_payment_method("transfer")
    }

    #[tokio::test]
    async fn test_create_draft() {
        let service = create_service();

        let draft = service.create_draft(draft_request("u1")).await.unwrap();

        assert_eq!(draft.payment_status, PaymentStatus::Unpaid);
        assert_eq!(draft.user_id, UserId::new("u1"));
        assert_eq!(service.get_draft(draft.id).await.unwrap(), draft);
    }

    #[tokio::test]
    async fn test_create_draft_with_empty_items_stores_nothing() {
        let service = create_service();
        let mut request = draft_request("u1");
        request.items.clear();

        let result = service.create_draft(request).await;

        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::NoItems))
        ));
        assert_eq!(service.store().draft_count().await, 0);
    }

    #[tokio::test]
    async fn test_confirm_draft() {
        let service = create_service();
        let draft = service.create_draft(draft_request("u1")).await.unwrap();

        let order = service
            .confirm_draft(ConfirmDraft::new(draft.id).with_proof("IMG1"))
            .await
            .unwrap();

        assert_eq!(order.items, draft.items);
        assert_eq!(order.total, draft.total);
        assert_eq!(order.address, draft.address);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_proof, "IMG1");

        let result = service.get_draft(draft.id).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_confirm_without_proof_defaults_to_empty() {
        let service = create_service();
        let draft = service.create_draft(draft_request("u1")).await.unwrap();

        let order = service
            .confirm_draft(ConfirmDraft::new(draft.id))
            .await
            .unwrap();
        assert_eq!(order.payment_proof, "");
    }

    #[tokio::test]
    async fn test_confirm_twice_is_not_found() {
        let service = create_service();
        let draft = service.create_draft(draft_request("u1")).await.unwrap();

        service
            .confirm_draft(ConfirmDraft::new(draft.id).with_proof("IMG1"))
            .await
            .unwrap();
        let second = service
            .confirm_draft(ConfirmDraft::new(draft.id).with_proof("IMG1"))
            .await;

        assert!(matches!(second, Err(DomainError::NotFound { .. })));
        assert_eq!(service.store().order_count().await, 1);
    }

    #[tokio::test]
    async fn test_abandon_draft() {
        let service = create_service();
        let draft = service.create_draft(draft_request("u1")).await.unwrap();

        let abandoned = service.abandon_draft(draft.id).await.unwrap();
        assert_eq!(abandoned.id, draft.id);

        let confirm = service.confirm_draft(ConfirmDraft::new(draft.id)).await;
        assert!(matches!(confirm, Err(DomainError::NotFound { .. })));
        assert_eq!(service.store().order_count().await, 0);

        let again = service.abandon_draft(draft.id).await;
        assert!(matches!(again, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_keeps_draft() {
        let service = create_service();
        let draft = service.create_draft(draft_request("u1")).await.unwrap();
        service.store().fail_next_order_insert().await;

        let result = service.confirm_draft(ConfirmDraft::new(draft.id)).await;

        assert!(matches!(result, Err(DomainError::Store(_))));
        assert!(service.get_draft(draft.id).await.is_ok());
        assert_eq!(service.store().order_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_drafts() {
        let service = create_service();
        service.create_draft(draft_request("u1")).await.unwrap();
        service.create_draft(draft_request("u2")).await.unwrap();

        assert_eq!(service.list_drafts(None).await.unwrap().len(), 2);
        let mine = service
            .list_drafts(Some(&UserId::new("u2")))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
    }
}
