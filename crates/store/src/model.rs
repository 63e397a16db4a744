//! Persisted records: cart lines, checkout drafts and confirmed orders.

use chrono::{DateTime, Utc};
use common::{Address, LineItem, Money, OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};

use crate::{CartLineId, DraftId, OrderId, ProductId, UserId};

/// Upper bound on the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// One (user, product, quantity) entry of a shopping cart.
///
/// At most one line exists per (user, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether an add-to-cart created a new line or merged into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Merged,
}

/// Result of an atomic add-to-cart.
#[derive(Debug, Clone)]
pub struct CartUpsert {
    pub line: CartLine,
    pub outcome: UpsertOutcome,
}

/// An unpaid checkout awaiting payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub id: DraftId,
    pub user_id: UserId,
    /// Name the order will be filed under.
    pub name: String,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub address: Address,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Data supplied when a draft's payment is confirmed.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub payment_proof: String,
    pub confirmed_at: DateTime<Utc>,
}

impl Confirmation {
    pub fn new(payment_proof: impl Into<String>) -> Self {
        Self {
            payment_proof: payment_proof.into(),
            confirmed_at: Utc::now(),
        }
    }
}

/// A confirmed order before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub draft_id: DraftId,
    pub user_id: UserId,
    pub name: String,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub address: Address,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_proof: String,
    pub date: DateTime<Utc>,
    pub confirmed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub courier: String,
    pub tracking_number: String,
}

impl NewOrder {
    /// Builds the order a confirmed draft turns into.
    ///
    /// Fields are copied one by one; anything added to [`Draft`] later does
    /// not reach orders unless it is listed here.
    pub fn from_draft(draft: &Draft, confirmation: &Confirmation) -> Self {
        Self {
            draft_id: draft.id,
            user_id: draft.user_id.clone(),
            name: draft.name.clone(),
            items: draft.items.clone(),
            total: draft.total,
            address: draft.address.clone(),
            payment_method: draft.payment_method.clone(),
            payment_status: PaymentStatus::Paid,
            payment_proof: confirmation.payment_proof.clone(),
            date: draft.created_at,
            confirmed_at: confirmation.confirmed_at,
            status: OrderStatus::Paid,
            courier: String::new(),
            tracking_number: String::new(),
        }
    }

    /// Attaches a store-assigned id.
    pub fn with_id(self, id: OrderId) -> ConfirmedOrder {
        ConfirmedOrder {
            id,
            draft_id: self.draft_id,
            user_id: self.user_id,
            name: self.name,
            items: self.items,
            total: self.total,
            address: self.address,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            payment_proof: self.payment_proof,
            date: self.date,
            confirmed_at: self.confirmed_at,
            status: self.status,
            courier: self.courier,
            tracking_number: self.tracking_number,
        }
    }
}

/// A finalized order produced by confirming a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedOrder {
    pub id: OrderId,
    /// The draft this order was confirmed from.
    pub draft_id: DraftId,
    pub user_id: UserId,
    pub name: String,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub address: Address,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_proof: String,
    /// When the checkout was started.
    pub date: DateTime<Utc>,
    pub confirmed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub courier: String,
    pub tracking_number: String,
}

/// The fields of a confirmed order that may change after confirmation.
///
/// Identifiers, items, totals and payment data are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub courier: Option<String>,
    pub tracking_number: Option<String>,
}

impl OrderUpdate {
    /// Returns true if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.courier.is_none() && self.tracking_number.is_none()
    }

    /// Applies the update to an order in place.
    pub fn apply_to(&self, order: &mut ConfirmedOrder) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(ref courier) = self.courier {
            order.courier = courier.clone();
        }
        if let Some(ref tracking_number) = self.tracking_number {
            order.tracking_number = tracking_number.clone();
        }
    }
}
