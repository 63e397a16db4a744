//! Domain layer for the storefront checkout backend.
//!
//! This crate provides:
//! - `CartService`, which merges repeated add-to-cart requests into one line
//! - `CheckoutService`, which turns a cart snapshot into a draft and a paid
//!   draft into a confirmed order
//! - `OrderService`, the administrative view over confirmed orders

pub mod cart;
pub mod checkout;
pub mod error;
pub mod orders;

pub use cart::{AddToCart, CartAddition, CartService, RemoveFromCart, SetQuantity};
pub use checkout::{CheckoutService, ConfirmDraft, CreateDraft};
pub use error::{DomainError, ValidationError};
pub use orders::{OrderService, UpdateOrder};
