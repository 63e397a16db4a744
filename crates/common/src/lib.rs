//! Identifiers and value objects shared by the store, domain and API crates.

pub mod money;
pub mod types;
pub mod values;

pub use money::Money;
pub use types::{CartLineId, DraftId, OrderId, ProductId, UserId};
pub use values::{Address, LineItem, OrderStatus, PaymentStatus};
