//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{CartLineId, UserId};
use domain::{AddToCart, RemoveFromCart, SetQuantity};
use serde::{Deserialize, Serialize};
use store::{CartLine, Store};

use super::{AppState, UserQuery, json_body, parse_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(alias = "product_id")]
    pub product_id: i64,
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[serde(default, alias = "quantity")]
    pub qty: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    #[serde(alias = "quantity")]
    pub qty: i64,
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub id: i64,
    pub user_id: String,
    pub product_id: i64,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id.as_i64(),
            user_id: line.user_id.to_string(),
            product_id: line.product_id.as_i64(),
            quantity: line.quantity,
            created_at: line.created_at,
            updated_at: line.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LineDeletedResponse {
    pub message: &'static str,
    pub deleted: CartLineResponse,
}

#[derive(Debug, Serialize)]
pub struct CartClearedResponse {
    pub message: &'static str,
    pub removed: u64,
}

// -- Handlers --

/// GET /cart?user_id=: list a user's cart.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<CartLineResponse>>, ApiError> {
    let user_id = UserId::new(query.required()?);
    let lines = state.cart.list_cart(&user_id).await?;
    Ok(Json(lines.into_iter().map(Into::into).collect()))
}

/// POST /cart: add a product, merging into an existing line.
///
/// Answers 201 when a line was created and 200 when one was merged.
#[tracing::instrument(skip(state, payload))]
pub async fn add<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CartLineResponse>), ApiError> {
    let req = json_body(payload)?;
    let mut cmd = AddToCart::new(req.user_id, req.product_id);
    if let Some(qty) = req.qty {
        cmd = cmd.with_quantity(qty);
    }

    let addition = state.cart.add_item(cmd).await?;
    let status = if addition.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(addition.line.into())))
}

/// PATCH /cart/{id}: overwrite a line's quantity.
#[tracing::instrument(skip(state, payload))]
pub async fn set_quantity<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<SetQuantityRequest>, JsonRejection>,
) -> Result<Json<CartLineResponse>, ApiError> {
    let line_id: i64 = parse_id(&id, "cart line")?;
    let req = json_body(payload)?;

    let mut cmd = SetQuantity::new(line_id, req.qty);
    if let Some(user_id) = req.user_id {
        cmd = cmd.for_user(user_id);
    }

    let line = state.cart.set_quantity(cmd).await?;
    Ok(Json(line.into()))
}

/// DELETE /cart/{id}[?user_id=]: remove a line.
#[tracing::instrument(skip(state))]
pub async fn remove<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<LineDeletedResponse>, ApiError> {
    let line_id = CartLineId::new(parse_id(&id, "cart line")?);

    let mut cmd = RemoveFromCart::new(line_id);
    if let Some(user_id) = query.user_id {
        cmd = cmd.for_user(user_id);
    }

    let deleted = state.cart.remove_item(cmd).await?;
    Ok(Json(LineDeletedResponse {
        message: "Item removed from cart",
        deleted: deleted.into(),
    }))
}

/// DELETE /cart?user_id=: empty a user's cart.
#[tracing::instrument(skip(state))]
pub async fn clear<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<CartClearedResponse>, ApiError> {
    let user_id = UserId::new(query.required()?);
    let removed = state.cart.clear_cart(&user_id).await?;
    Ok(Json(CartClearedResponse {
        message: "Cart cleared",
        removed,
    }))
}
