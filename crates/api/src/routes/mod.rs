//! Route handlers and the state they share.

pub mod cart;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod orders;

use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use domain::{CartService, CheckoutService, OrderService};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub cart: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub orders: OrderService<S>,
}

/// `?user_id=` query parameter.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

impl UserQuery {
    fn required(self) -> Result<String, ApiError> {
        self.user_id
            .ok_or_else(|| ApiError::BadRequest("user_id query parameter is required".into()))
    }
}

/// Unwraps a JSON body, turning a malformed one into a 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {what} id: {raw}")))
}
