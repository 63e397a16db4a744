//! Checkout pipeline: cart snapshot → draft → confirmed order.
//!
//! ```text
//! create_draft ──► Created ──┬── confirm_draft ──► Confirmed (order stored)
//!                            └── abandon_draft ──► Abandoned (nothing stored)
//! ```
//!
//! Both terminal transitions remove the draft, so each draft is consumed at
//! most once.

mod commands;
mod service;
mod validation;

pub use commands::{ConfirmDraft, CreateDraft};
pub use service::CheckoutService;
