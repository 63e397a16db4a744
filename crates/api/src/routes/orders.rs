//! Confirmed order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{Address, LineItem, OrderId, OrderStatus, PaymentStatus};
use domain::UpdateOrder;
use serde::{Deserialize, Serialize};
use store::{ConfirmedOrder, OrderUpdate, Store};

use super::{AppState, json_body, parse_id};
use crate::error::ApiError;

// -- Request types --

/// Allow-listed order fields. Anything else in the body is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub courier: Option<String>,
    #[serde(alias = "tracking_number")]
    pub tracking_number: Option<String>,
}

impl TryFrom<UpdateOrderRequest> for OrderUpdate {
    type Error = ApiError;

    fn try_from(req: UpdateOrderRequest) -> Result<Self, Self::Error> {
        let status = req
            .status
            .map(|s| s.parse::<OrderStatus>())
            .transpose()
            .map_err(ApiError::BadRequest)?;
        Ok(OrderUpdate {
            status,
            courier: req.courier,
            tracking_number: req.tracking_number,
        })
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i64,
    pub draft_id: String,
    pub user_id: String,
    pub name: String,
    pub items: Vec<LineItem>,
    pub total: i64,
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

impl From<ConfirmedOrder> for OrderResponse {
    fn from(order: ConfirmedOrder) -> Self {
        Self {
            id: order.id.as_i64(),
            draft_id: order.draft_id.to_string(),
            user_id: order.user_id.to_string(),
            name: order.name,
            items: order.items,
            total: order.total.minor(),
            address: order.address,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            payment_proof: order.payment_proof,
            date: order.date,
            confirmed_at: order.confirmed_at,
            status: order.status,
            courier: order.courier,
            tracking_number: order.tracking_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderUpdatedResponse {
    pub message: &'static str,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize)]
pub struct OrderDeletedResponse {
    pub message: &'static str,
    pub deleted: OrderResponse,
}

// -- Handlers --

/// GET /orders: list confirmed orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::new(parse_id(&id, "order")?);
    let order = state.orders.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/{id}: update status, courier or tracking number.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<OrderUpdatedResponse>, ApiError> {
    let order_id = OrderId::new(parse_id(&id, "order")?);
    let update = OrderUpdate::try_from(json_body(payload)?)?;

    let order = state
        .orders
        .update_order(UpdateOrder::new(order_id, update))
        .await?;
    Ok(Json(OrderUpdatedResponse {
        message: "Order updated",
        order: order.into(),
    }))
}

/// DELETE /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderDeletedResponse>, ApiError> {
    let order_id = OrderId::new(parse_id(&id, "order")?);
    let order = state.orders.delete_order(order_id).await?;
    Ok(Json(OrderDeletedResponse {
        message: "Order deleted",
        deleted: order.into(),
    }))
}
