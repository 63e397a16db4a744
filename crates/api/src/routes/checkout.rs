//! Checkout endpoints: drafts and payment confirmation.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Address, DraftId, LineItem, Money, PaymentStatus, UserId};
use domain::{ConfirmDraft, CreateDraft};
use serde::{Deserialize, Serialize};
use store::{Draft, Store};

use super::orders::OrderResponse;
use super::{AppState, UserQuery, json_body, parse_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftRequest {
    #[serde(alias = "user_id")]
    pub user_id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub total: Option<i64>,
    pub address: Option<Address>,
    #[serde(alias = "paymentMethod", alias = "payment_method")]
    pub payment: Option<String>,
}

impl From<CreateDraftRequest> for CreateDraft {
    fn from(req: CreateDraftRequest) -> Self {
        CreateDraft {
            user_id: UserId::new(req.user_id),
            name: req.name,
            items: req.items,
            total: req.total.map(Money::from_minor),
            address: req.address,
            payment_method: req.payment,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    #[serde(alias = "payment_proof")]
    pub payment_proof: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub items: Vec<LineItem>,
    pub total: i64,
    pub address: Address,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Draft> for DraftResponse {
    fn from(draft: Draft) -> Self {
        Self {
            id: draft.id.to_string(),
            user_id: draft.user_id.to_string(),
            name: draft.name,
            items: draft.items,
            total: draft.total.minor(),
            address: draft.address,
            payment_method: draft.payment_method,
            payment_status: draft.payment_status,
            created_at: draft.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmedResponse {
    pub message: &'static str,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize)]
pub struct DraftDeletedResponse {
    pub message: &'static str,
    pub deleted: DraftResponse,
}

// -- Handlers --

/// POST /checkout/draft: validate a cart snapshot and store it as a draft.
#[tracing::instrument(skip(state, payload))]
pub async fn create_draft<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateDraftRequest>, JsonRejection>,
) -> Result<Json<DraftResponse>, ApiError> {
    let req = json_body(payload)?;
    let draft = state.checkout.create_draft(req.into()).await?;
    Ok(Json(draft.into()))
}

/// GET /checkout/draft/{id}
#[tracing::instrument(skip(state))]
pub async fn get_draft<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DraftResponse>, ApiError> {
    let draft_id: DraftId = parse_id(&id, "draft")?;
    let draft = state.checkout.get_draft(draft_id).await?;
    Ok(Json(draft.into()))
}

/// GET /checkout/drafts[?user_id=]
#[tracing::instrument(skip(state))]
pub async fn list_drafts<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<DraftResponse>>, ApiError> {
    let user_id = query.user_id.map(UserId::new);
    let drafts = state.checkout.list_drafts(user_id.as_ref()).await?;
    Ok(Json(drafts.into_iter().map(Into::into).collect()))
}

/// DELETE /checkout/draft/{id}: abandon a draft.
#[tracing::instrument(skip(state))]
pub async fn abandon_draft<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DraftDeletedResponse>, ApiError> {
    let draft_id: DraftId = parse_id(&id, "draft")?;
    let draft = state.checkout.abandon_draft(draft_id).await?;
    Ok(Json(DraftDeletedResponse {
        message: "Draft abandoned",
        deleted: draft.into(),
    }))
}

/// POST /checkout/confirm/{id}: record payment and turn the draft into an order.
///
/// The body is optional; without one the payment proof is empty.
#[tracing::instrument(skip(state, body))]
pub async fn confirm<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ConfirmedResponse>), ApiError> {
    let draft_id: DraftId = parse_id(&id, "draft")?;
    let req: ConfirmRequest = if body.is_empty() {
        ConfirmRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let mut cmd = ConfirmDraft::new(draft_id);
    if let Some(proof) = req.payment_proof {
        cmd = cmd.with_proof(proof);
    }

    let order = state.checkout.confirm_draft(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ConfirmedResponse {
            message: "Order confirmed",
            order: order.into(),
        }),
    ))
}
