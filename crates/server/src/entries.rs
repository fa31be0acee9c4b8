//! Donation and expense API endpoints

use api_types::entry::{EntryKind as ApiKind, EntryList, EntryListResponse, EntryNew, EntryView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Actor, Entry, EntryDetails, EntryKind, EntryListFilter, Money, NewEntryCmd};

use crate::{ServerError, server::ServerState};

fn map_kind(kind: EntryKind) -> ApiKind {
    match kind {
        EntryKind::Donation => ApiKind::Donation,
        EntryKind::Expense => ApiKind::Expense,
    }
}

fn view(entry: Entry) -> EntryView {
    EntryView {
        id: entry.id,
        idempotency_key: entry.idempotency_key,
        kind: map_kind(entry.kind),
        amount_minor: entry.amount.minor(),
        mandal_id: entry.scope.mandal_id,
        event_id: entry.scope.event_id,
        created_by_user_id: entry.created_by_user_id,
        created_by_name: entry.created_by_name,
        occurred_at: entry.occurred_at,
        is_deleted: entry.is_deleted,
        is_synced: entry.is_synced,
        counterparty: entry.details.counterparty,
        category: entry.details.category,
        payment_mode: entry.details.payment_mode,
        contact: entry.details.contact,
        received_by: entry.details.received_by,
        remarks: entry.details.remarks,
    }
}

fn command(payload: EntryNew) -> NewEntryCmd {
    NewEntryCmd::new(
        payload.idempotency_key,
        Money::new(payload.amount_minor),
        payload.occurred_at.with_timezone(&Utc),
    )
    .details(EntryDetails {
        counterparty: payload.counterparty,
        category: payload.category,
        payment_mode: payload.payment_mode,
        contact: payload.contact,
        received_by: payload.received_by,
        remarks: payload.remarks,
    })
}

pub async fn donation_new(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<EntryNew>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let entry = state
        .engine
        .create_donation(&actor, command(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(view(entry))))
}

pub async fn expense_new(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<EntryNew>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let entry = state
        .engine
        .create_expense(&actor, command(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(view(entry))))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<EntryList>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let filter = EntryListFilter {
        kind: query.kind.map(|kind| match kind {
            ApiKind::Donation => EntryKind::Donation,
            ApiKind::Expense => EntryKind::Expense,
        }),
        include_deleted: query.include_deleted.unwrap_or(false),
    };
    let entries = state.engine.list_entries(&actor, &filter).await?;

    Ok(Json(EntryListResponse {
        entries: entries.into_iter().map(view).collect(),
    }))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state.engine.soft_delete_entry(&actor, &key).await?;
    Ok(Json(serde_json::json!({})))
}
