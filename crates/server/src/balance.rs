//! Balance API endpoints

use api_types::balance::{BalanceQuery, BalanceResponse, RecomputeResponse, WalletSummaryView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::Actor;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

/// Recomputed from entries and transfers on every call.
pub async fn get_balance(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let user_id = query.user_id.unwrap_or(actor.user_id);
    let amount = state
        .engine
        .balance(&actor, user_id, query.event_id)
        .await?;

    Ok(Json(BalanceResponse {
        user_id,
        amount_minor: amount.minor(),
    }))
}

pub async fn wallet_summary(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<WalletSummaryView>, ServerError> {
    let user_id = query.user_id.unwrap_or(actor.user_id);
    let summary = state
        .engine
        .wallet_summary(&actor, user_id, query.event_id)
        .await?;

    Ok(Json(WalletSummaryView {
        user_id,
        collected_minor: summary.collected.minor(),
        spent_minor: summary.spent.minor(),
        transferred_out_minor: summary.transferred_out.minor(),
        received_minor: summary.received.minor(),
        balance_minor: summary.balance.minor(),
    }))
}

pub async fn recompute(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RecomputeResponse>, ServerError> {
    let balance = state
        .engine
        .recompute_cached_balances(&actor, user_id)
        .await?;

    Ok(Json(RecomputeResponse {
        user_id,
        wallet_balance_minor: balance.minor(),
    }))
}
