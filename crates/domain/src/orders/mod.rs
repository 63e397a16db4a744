//! Administration of confirmed orders.

mod service;

pub use service::OrderService;

use common::OrderId;
use store::OrderUpdate;

/// Command to change the fulfillment fields of an order.
#[derive(Debug, Clone)]
pub struct UpdateOrder {
    pub order_id: OrderId,
    pub update: OrderUpdate,
}

impl UpdateOrder {
    pub fn new(order_id: impl Into<OrderId>, update: OrderUpdate) -> Self {
        Self {
            order_id: order_id.into(),
            update,
        }
    }
}
