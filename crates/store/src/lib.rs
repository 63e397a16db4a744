pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{CartLineId, DraftId, OrderId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    CartLine, CartUpsert, Confirmation, ConfirmedOrder, Draft, MAX_LINE_QUANTITY, NewOrder,
    OrderUpdate, UpsertOutcome,
};
pub use postgres::PostgresStore;
pub use store::{CartStore, CheckoutStore, OrderStore, Store};
