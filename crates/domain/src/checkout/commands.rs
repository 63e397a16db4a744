//! Checkout commands.

use common::{Address, DraftId, LineItem, Money, UserId};

/// Command to open a checkout for a cart snapshot.
///
/// Everything except the user and items is optional here so that a
/// missing field surfaces as a validation error rather than a parse error.
#[derive(Debug, Clone)]
pub struct CreateDraft {
    pub user_id: UserId,
    /// Name to file the order under; defaults to the address recipient.
    pub name: Option<String>,
    pub items: Vec<LineItem>,
    /// Client-computed total; must match the items.
    pub total: Option<Money>,
    pub address: Option<Address>,
    pub payment_method: Option<String>,
}

impl CreateDraft {
    pub fn new(user_id: impl Into<UserId>, items: Vec<LineItem>) -> Self {
        Self {
            user_id: user_id.into(),
            name: None,
            items,
            total: None,
            address: None,
            payment_method: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }
}

/// Command to confirm payment of a draft.
#[derive(Debug, Clone)]
pub struct ConfirmDraft {
    pub draft_id: DraftId,
    /// Reference to the payment evidence, e.g. an uploaded transfer receipt.
    pub payment_proof: Option<String>,
}

impl ConfirmDraft {
    pub fn new(draft_id: DraftId) -> Self {
        Self {
            draft_id,
            payment_proof: None,
        }
    }

    pub fn with_proof(mut self, payment_proof: impl Into<String>) -> Self {
        self.payment_proof = Some(payment_proof.into());
        self
    }
}
