use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::OrderStatus;
use tokio::sync::RwLock;

use crate::{
    CartLine, CartLineId, CartUpsert, Confirmation, ConfirmedOrder, Draft, DraftId,
    MAX_LINE_QUANTITY, NewOrder, OrderId, OrderUpdate, ProductId, Result, StoreError,
    UpsertOutcome, UserId,
    store::{CartStore, CheckoutStore, OrderStore},
};

#[derive(Debug, Default)]
struct MemoryState {
    cart: BTreeMap<CartLineId, CartLine>,
    cart_index: HashMap<(UserId, ProductId), CartLineId>,
    drafts: HashMap<DraftId, Draft>,
    orders: BTreeMap<OrderId, ConfirmedOrder>,
    last_cart_id: i64,
    last_order_id: i64,
    fail_next_order_insert: bool,
}

fn is_owned_by(line: &CartLine, owner: Option<&UserId>) -> bool {
    owner.is_none_or(|owner| &line.user_id == owner)
}

impl MemoryState {
    fn owned_line_mut(
        &mut self,
        id: CartLineId,
        owner: Option<&UserId>,
    ) -> Option<&mut CartLine> {
        self.cart
            .get_mut(&id)
            .filter(|line| is_owned_by(line, owner))
    }
}

/// In-memory store implementation.
///
/// Every operation runs under a single write lock, which makes each
/// read-modify-write (cart merge, draft confirmation) atomic. Provides the
/// same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next order insert fail, as a database outage would.
    pub async fn fail_next_order_insert(&self) {
        self.state.write().await.fail_next_order_insert = true;
    }

    pub async fn cart_line_count(&self) -> usize {
        self.state.read().await.cart.len()
    }

    pub async fn draft_count(&self) -> usize {
        self.state.read().await.drafts.len()
    }

    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn upsert_cart_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartUpsert> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let key = (user_id.clone(), product_id);
        if let Some(&id) = state.cart_index.get(&key)
            && let Some(line) = state.cart.get_mut(&id)
        {
            let merged = line
                .quantity
                .checked_add(quantity)
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or_else(|| StoreError::QuantityLimitExceeded {
                    user_id: user_id.clone(),
                    product_id,
                    limit: MAX_LINE_QUANTITY,
                })?;
            line.quantity = merged;
            line.updated_at = now;
            return Ok(CartUpsert {
                line: line.clone(),
                outcome: UpsertOutcome::Merged,
            });
        }

        state.last_cart_id += 1;
        let id = CartLineId::new(state.last_cart_id);
        let line = CartLine {
            id,
            user_id: user_id.clone(),
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        state.cart.insert(id, line.clone());
        state.cart_index.insert(key, id);

        Ok(CartUpsert {
            line,
            outcome: UpsertOutcome::Created,
        })
    }

    async fn get_cart_line(&self, id: CartLineId) -> Result<Option<CartLine>> {
        Ok(self.state.read().await.cart.get(&id).cloned())
    }

    async fn set_cart_line_quantity(
        &self,
        id: CartLineId,
        owner: Option<&UserId>,
        quantity: u32,
    ) -> Result<Option<CartLine>> {
        let mut state = self.state.write().await;
        let Some(line) = state.owned_line_mut(id, owner) else {
            return Ok(None);
        };
        line.quantity = quantity;
        line.updated_at = Utc::now();
        Ok(Some(line.clone()))
    }

    async fn delete_cart_line(
        &self,
        id: CartLineId,
        owner: Option<&UserId>,
    ) -> Result<Option<CartLine>> {
        let mut state = self.state.write().await;
        let owned = state
            .cart
            .get(&id)
            .is_some_and(|line| is_owned_by(line, owner));
        if !owned {
            return Ok(None);
        }

        let line = state.cart.remove(&id);
        if let Some(ref line) = line {
            state
                .cart_index
                .remove(&(line.user_id.clone(), line.product_id));
        }
        Ok(line)
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.cart.len();
        state.cart.retain(|_, line| &line.user_id != user_id);
        state.cart_index.retain(|(owner, _), _| owner != user_id);
        Ok((before - state.cart.len()) as u64)
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>> {
        let state = self.state.read().await;
        Ok(state
            .cart
            .values()
            .filter(|line| &line.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CheckoutStore for InMemoryStore {
    async fn insert_draft(&self, draft: Draft) -> Result<Draft> {
        let mut state = self.state.write().await;
        if state.drafts.contains_key(&draft.id) {
            return Err(StoreError::Conflict(format!(
                "draft {} already exists",
                draft.id
            )));
        }
        state.drafts.insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn get_draft(&self, id: DraftId) -> Result<Option<Draft>> {
        Ok(self.state.read().await.drafts.get(&id).cloned())
    }

    async fn list_drafts(&self, user_id: Option<&UserId>) -> Result<Vec<Draft>> {
        let state = self.state.read().await;
        let mut drafts: Vec<_> = state
            .drafts
            .values()
            .filter(|d| user_id.is_none_or(|u| &d.user_id == u))
            .cloned()
            .collect();
        drafts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        Ok(drafts)
    }

    async fn delete_draft(&self, id: DraftId) -> Result<Option<Draft>> {
        Ok(self.state.write().await.drafts.remove(&id))
    }

    async fn confirm_draft(
        &self,
        id: DraftId,
        confirmation: Confirmation,
    ) -> Result<Option<ConfirmedOrder>> {
        let mut state = self.state.write().await;

        let Some(draft) = state.drafts.get(&id) else {
            return Ok(None);
        };
        let new_order = NewOrder::from_draft(draft, &confirmation);

        // Nothing has been mutated yet, so failing here leaves the draft in place
        if std::mem::take(&mut state.fail_next_order_insert) {
            return Err(StoreError::Unavailable(
                "order insert rejected".to_string(),
            ));
        }

        state.last_order_id += 1;
        let order = new_order.with_id(OrderId::new(state.last_order_id));
        state.orders.insert(order.id, order.clone());
        state.drafts.remove(&id);

        Ok(Some(order))
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<ConfirmedOrder>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<ConfirmedOrder>> {
        Ok(self.state.read().await.orders.values().cloned().collect())
    }

    async fn update_order(
        &self,
        id: OrderId,
        expected_status: Option<OrderStatus>,
        update: &OrderUpdate,
    ) -> Result<Option<ConfirmedOrder>> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(expected) = expected_status
            && order.status != expected
        {
            return Err(StoreError::Conflict(format!(
                "order {id} is {}, expected {expected}",
                order.status
            )));
        }
        update.apply_to(order);
        Ok(Some(order.clone()))
    }

    async fn delete_order(&self, id: OrderId) -> Result<Option<ConfirmedOrder>> {
        Ok(self.state.write().await.orders.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use common::{Address, LineItem, Money, OrderStatus, PaymentStatus};

    use super::*;

    fn create_test_draft(user: &str) -> Draft {
        Draft {
            id: DraftId::new(),
            user_id: UserId::new(user),
            name: "Dani".to_string(),
            items: vec![LineItem::new(2, 1, Money::from_minor(950_000))],
            total: Money::from_minor(950_000),
            address: Address::new("Dani", "Jl. Merdeka 1", "0812"),
            payment_method: "transfer".to_string(),
            payment_status: PaymentStatus::Unpaid,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_merges() {
        let store = InMemoryStore::new();
        let user = UserId::new("u1");

        let first = store
            .upsert_cart_line(&user, ProductId::new(2), 1)
            .await
            .unwrap();
        assert_eq!(first.outcome, UpsertOutcome::Created);
        assert_eq!(first.line.quantity, 1);

        let second = store
            .upsert_cart_line(&user, ProductId::new(2), 3)
            .await
            .unwrap();
        assert_eq!(second.outcome, UpsertOutcome::Merged);
        assert_eq!(second.line.id, first.line.id);
        assert_eq!(second.line.quantity, 4);
        assert_eq!(store.cart_line_count().await, 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_users_apart() {
        let store = InMemoryStore::new();
        store
            .upsert_cart_line(&UserId::new("u1"), ProductId::new(2), 1)
            .await
            .unwrap();
        let other = store
            .upsert_cart_line(&UserId::new("u2"), ProductId::new(2), 1)
            .await
            .unwrap();

        assert_eq!(other.outcome, UpsertOutcome::Created);
        assert_eq!(store.cart_line_count().await, 2);
    }

    #[tokio::test]
    async fn test_upsert_rejects_merge_past_limit() {
        let store = InMemoryStore::new();
        let user = UserId::new("u1");
        store
            .upsert_cart_line(&user, ProductId::new(2), MAX_LINE_QUANTITY)
            .await
            .unwrap();

        let result = store.upsert_cart_line(&user, ProductId::new(2), 1).await;
        assert!(matches!(
            result,
            Err(StoreError::QuantityLimitExceeded { .. })
        ));

        let lines = store.list_cart(&user).await.unwrap();
        assert_eq!(lines[0].quantity, MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn test_set_quantity_respects_owner() {
        let store = InMemoryStore::new();
        let line = store
            .upsert_cart_line(&UserId::new("u1"), ProductId::new(2), 1)
            .await
            .unwrap()
            .line;

        let foreign = store
            .set_cart_line_quantity(line.id, Some(&UserId::new("u2")), 5)
            .await
            .unwrap();
        assert!(foreign.is_none());

        let updated = store
            .set_cart_line_quantity(line.id, Some(&UserId::new("u1")), 5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.quantity, 5);
    }

    #[tokio::test]
    async fn test_delete_by_other_owner_keeps_line() {
        let store = InMemoryStore::new();
        let user = UserId::new("u1");
        let line = store
            .upsert_cart_line(&user, ProductId::new(2), 3)
            .await
            .unwrap()
            .line;

        let foreign = store
            .delete_cart_line(line.id, Some(&UserId::new("u2")))
            .await
            .unwrap();
        assert!(foreign.is_none());
        assert_eq!(store.get_cart_line(line.id).await.unwrap(), Some(line.clone()));

        // Still indexed, so the next add merges
        let merged = store
            .upsert_cart_line(&user, ProductId::new(2), 1)
            .await
            .unwrap();
        assert_eq!(merged.outcome, UpsertOutcome::Merged);

        let deleted = store.delete_cart_line(line.id, Some(&user)).await.unwrap();
        assert_eq!(deleted.map(|l| l.quantity), Some(4));
    }

    #[tokio::test]
    async fn test_delete_line_frees_the_pair() {
        let store = InMemoryStore::new();
        let user = UserId::new("u1");
        let line = store
            .upsert_cart_line(&user, ProductId::new(2), 2)
            .await
            .unwrap()
            .line;

        let deleted = store.delete_cart_line(line.id, None).await.unwrap();
        assert_eq!(deleted.map(|l| l.id), Some(line.id));
        assert!(store.delete_cart_line(line.id, None).await.unwrap().is_none());

        let again = store
            .upsert_cart_line(&user, ProductId::new(2), 1)
            .await
            .unwrap();
        assert_eq!(again.outcome, UpsertOutcome::Created);
        assert_eq!(again.line.quantity, 1);
    }

    #[tokio::test]
    async fn test_clear_cart_only_touches_one_user() {
        let store = InMemoryStore::new();
        let u1 = UserId::new("u1");
        let u2 = UserId::new("u2");
        store.upsert_cart_line(&u1, ProductId::new(1), 1).await.unwrap();
        store.upsert_cart_line(&u1, ProductId::new(2), 1).await.unwrap();
        store.upsert_cart_line(&u2, ProductId::new(1), 1).await.unwrap();

        assert_eq!(store.clear_cart(&u1).await.unwrap(), 2);
        assert_eq!(store.clear_cart(&u1).await.unwrap(), 0);
        assert!(store.list_cart(&u1).await.unwrap().is_empty());
        assert_eq!(store.list_cart(&u2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_draft_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        let draft = create_test_draft("u1");
        store.insert_draft(draft.clone()).await.unwrap();

        let result = store.insert_draft(draft).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_drafts_filters_by_user() {
        let store = InMemoryStore::new();
        store.insert_draft(create_test_draft("u1")).await.unwrap();
        store.insert_draft(create_test_draft("u1")).await.unwrap();
        store.insert_draft(create_test_draft("u2")).await.unwrap();

        assert_eq!(store.list_drafts(None).await.unwrap().len(), 3);
        let mine = store.list_drafts(Some(&UserId::new("u1"))).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|d| d.user_id.as_str() == "u1"));
    }

    #[tokio::test]
    async fn test_confirm_moves_draft_into_orders() {
        let store = InMemoryStore::new();
        let draft = store.insert_draft(create_test_draft("u1")).await.unwrap();

        let order = store
            .confirm_draft(draft.id, Confirmation::new("IMG1"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(order.draft_id, draft.id);
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(store.get_draft(draft.id).await.unwrap().is_none());
        assert_eq!(store.get_order(order.id).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn test_confirm_twice_yields_one_order() {
        let store = InMemoryStore::new();
        let draft = store.insert_draft(create_test_draft("u1")).await.unwrap();

        let first = store
            .confirm_draft(draft.id, Confirmation::new("IMG1"))
            .await
            .unwrap();
        let second = store
            .confirm_draft(draft.id, Confirmation::new("IMG1"))
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_confirm_leaves_draft_in_place() {
        let store = InMemoryStore::new();
        let draft = store.insert_draft(create_test_draft("u1")).await.unwrap();
        store.fail_next_order_insert().await;

        let result = store
            .confirm_draft(draft.id, Confirmation::new("IMG1"))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.draft_count().await, 1);
        assert_eq!(store.order_count().await, 0);

        // The failure is one-shot
        let order = store
            .confirm_draft(draft.id, Confirmation::new("IMG1"))
            .await
            .unwrap();
        assert!(order.is_some());
    }

    #[tokio::test]
    async fn test_order_ids_are_sequential() {
        let store = InMemoryStore::new();
        let a = store.insert_draft(create_test_draft("u1")).await.unwrap();
        let b = store.insert_draft(create_test_draft("u1")).await.unwrap();

        let first = store
            .confirm_draft(a.id, Confirmation::new(""))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .confirm_draft(b.id, Confirmation::new(""))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.id, OrderId::new(1));
        assert_eq!(second.id, OrderId::new(2));
    }

    #[tokio::test]
    async fn test_update_with_stale_status_conflicts() {
        let store = InMemoryStore::new();
        let draft = store.insert_draft(create_test_draft("u1")).await.unwrap();
        let order = store
            .confirm_draft(draft.id, Confirmation::new("IMG1"))
            .await
            .unwrap()
            .unwrap();

        let update = OrderUpdate {
            status: Some(OrderStatus::Cancelled),
            ..OrderUpdate::default()
        };
        let result = store
            .update_order(order.id, Some(OrderStatus::Shipped), &update)
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(
            store.get_order(order.id).await.unwrap().map(|o| o.status),
            Some(OrderStatus::Paid)
        );

        let updated = store
            .update_order(order.id, Some(OrderStatus::Paid), &update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_and_delete_order() {
        let store = InMemoryStore::new();
        let draft = store.insert_draft(create_test_draft("u1")).await.unwrap();
        let order = store
            .confirm_draft(draft.id, Confirmation::new("IMG1"))
            .await
            .unwrap()
            .unwrap();

        let update = OrderUpdate {
            status: Some(OrderStatus::Shipped),
            courier: None,
            tracking_number: Some("JNE123".to_string()),
        };
        let updated = store.update_order(order.id, None, &update).await.unwrap().unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.tracking_number, "JNE123");

        assert!(store.delete_order(order.id).await.unwrap().is_some());
        assert!(store.get_order(order.id).await.unwrap().is_none());
        assert!(store.update_order(order.id, None, &update).await.unwrap().is_none());
    }
}
