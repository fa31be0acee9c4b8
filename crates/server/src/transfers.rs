//! Wallet transfer API endpoints

use api_types::transfer::{
    TransferList, TransferListResponse, TransferNew, TransferStatus as ApiStatus, TransferView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Actor, Money, Transfer, TransferListFilter, TransferRequestCmd, TransferStatus};

use crate::{ServerError, server::ServerState};

fn map_status(status: TransferStatus) -> ApiStatus {
    match status {
        TransferStatus::Pending => ApiStatus::Pending,
        TransferStatus::Approved => ApiStatus::Approved,
        TransferStatus::Rejected => ApiStatus::Rejected,
    }
}

fn map_api_status(status: ApiStatus) -> TransferStatus {
    match status {
        ApiStatus::Pending => TransferStatus::Pending,
        ApiStatus::Approved => TransferStatus::Approved,
        ApiStatus::Rejected => TransferStatus::Rejected,
    }
}

fn view(transfer: Transfer) -> TransferView {
    TransferView {
        id: transfer.id,
        idempotency_key: transfer.idempotency_key,
        from_user_id: transfer.from_user_id,
        to_manager_id: transfer.to_manager_id,
        mandal_id: transfer.scope.mandal_id,
        event_id: transfer.scope.event_id,
        amount_minor: transfer.amount.minor(),
        status: map_status(transfer.status),
        note: transfer.note,
        requested_at: transfer.requested_at,
        approved_at: transfer.approved_at,
    }
}

pub async fn transfer_new(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let mut cmd = TransferRequestCmd::new(payload.idempotency_key, Money::new(payload.amount_minor));
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    let transfer = state.engine.request_transfer(&actor, cmd).await?;

    Ok((StatusCode::CREATED, Json(view(transfer))))
}

/// Pending transfers unless another status (or `all`) is asked for.
pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<TransferList>,
) -> Result<Json<TransferListResponse>, ServerError> {
    let status = if query.all.unwrap_or(false) {
        None
    } else {
        Some(query.status.map_or(TransferStatus::Pending, map_api_status))
    };
    let transfers = state
        .engine
        .list_transfers(&actor, &TransferListFilter { status })
        .await?;

    Ok(Json(TransferListResponse {
        transfers: transfers.into_iter().map(view).collect(),
    }))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(key): Path<String>,
) -> Result<Json<TransferView>, ServerError> {
    let transfer = state.engine.transfer(&actor, &key).await?;
    Ok(Json(view(transfer)))
}

pub async fn approve(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state.engine.approve_transfer(&actor, &key).await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn reject(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state.engine.reject_transfer(&actor, &key).await?;
    Ok(Json(serde_json::json!({})))
}
