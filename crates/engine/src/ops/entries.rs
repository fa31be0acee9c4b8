//! Entry store: donations and expenses.

use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Actor, EngineError, Entry, EntryDetails, EntryKind, EntryListFilter, NewEntryCmd,
    ResultEngine, Scope, entries, users,
    util::{ensure_entry_amount, normalize_idempotency_key, normalize_optional_text},
};

use super::{Engine, with_tx};

/// Generates a create method for one entry kind.
macro_rules! impl_create_entry {
    ($(#[$meta:meta])* $fn_name:ident, $kind:expr) => {
        $(#[$meta])*
        pub async fn $fn_name(&self, actor: &Actor, cmd: NewEntryCmd) -> ResultEngine<Entry> {
            self.create_entry(actor, $kind, cmd).await
        }
    };
}

impl Engine {
    impl_create_entry!(
        /// Record money collected by the actor.
        create_donation,
        EntryKind::Donation
    );

    impl_create_entry!(
        /// Record money spent by the actor.
        create_expense,
        EntryKind::Expense
    );

    async fn create_entry(
        &self,
        actor: &Actor,
        kind: EntryKind,
        cmd: NewEntryCmd,
    ) -> ResultEngine<Entry> {
        let key = normalize_idempotency_key(&cmd.idempotency_key)?;
        ensure_entry_amount(cmd.amount)?;

        let entry = with_tx!(self, |db_tx| {
            let creator = self.require_actor(&db_tx, actor).await?;
            self.require_scope(&db_tx, &actor.scope).await?;

            if let Some(existing) = find_entry_by_key(&db_tx, &key).await? {
                if existing.created_by_user_id != creator.id || existing.kind != kind.as_str() {
                    return Err(EngineError::Conflict(
                        "idempotency_key already used".to_string(),
                    ));
                }
                return Entry::try_from(existing);
            }

            let now = Utc::now();
            let entry = Entry {
                id: Uuid::new_v4(),
                idempotency_key: key,
                kind,
                amount: cmd.amount,
                scope: actor.scope,
                created_by_user_id: creator.id,
                created_by_name: creator.name.clone(),
                occurred_at: cmd.occurred_at,
                created_at: now,
                is_deleted: false,
                is_synced: true,
                deleted_at: None,
                deleted_by: None,
                details: EntryDetails {
                    counterparty: normalize_optional_text(cmd.details.counterparty.as_deref()),
                    category: normalize_optional_text(cmd.details.category.as_deref()),
                    payment_mode: normalize_optional_text(cmd.details.payment_mode.as_deref()),
                    contact: normalize_optional_text(cmd.details.contact.as_deref()),
                    received_by: normalize_optional_text(cmd.details.received_by.as_deref()),
                    remarks: normalize_optional_text(cmd.details.remarks.as_deref()),
                },
            };
            entries::ActiveModel::from(&entry).insert(&db_tx).await?;

            let counter = match kind {
                EntryKind::Donation => users::Column::DonationCount,
                EntryKind::Expense => users::Column::ExpenseCount,
            };
            users::Entity::update_many()
                .col_expr(counter, Expr::col(counter).add(1))
                .filter(users::Column::Id.eq(creator.id))
                .exec(&db_tx)
                .await?;

            Ok::<_, EngineError>(entry)
        })?;

        tracing::debug!(
            entry_id = %entry.id,
            kind = entry.kind.as_str(),
            amount_minor = entry.amount.minor(),
            "entry recorded"
        );
        Ok(entry)
    }

    /// Lists entries visible to the actor, newest first.
    ///
    /// Managers see every entry of their scope; members only their own.
    pub async fn list_entries(
        &self,
        actor: &Actor,
        filter: &EntryListFilter,
    ) -> ResultEngine<Vec<Entry>> {
        let actor_model = self.require_actor(&self.database, actor).await?;

        let mut query = entries::Entity::find()
            .filter(entries::Column::MandalId.eq(actor.scope.mandal_id))
            .order_by_desc(entries::Column::OccurredAt)
            .order_by_desc(entries::Column::CreatedAt);
        if let Some(event_id) = actor.scope.event_id {
            query = query.filter(entries::Column::EventId.eq(event_id));
        }
        if !actor_model.role()?.is_manager() {
            query = query.filter(entries::Column::CreatedByUserId.eq(actor_model.id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(entries::Column::Kind.eq(kind.as_str()));
        }
        if !filter.include_deleted {
            query = query.filter(entries::Column::IsDeleted.eq(false));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Entry::try_from)
            .collect()
    }

    /// Soft-deletes an entry: it stays in the store but no longer counts in
    /// balances. Previously approved transfers are not touched.
    pub async fn soft_delete_entry(
        &self,
        actor: &Actor,
        idempotency_key: &str,
    ) -> ResultEngine<()> {
        let deleted_at = Utc::now();
        with_tx!(self, |db_tx| {
            let actor_model = self.require_actor(&db_tx, actor).await?;
            let entry = find_entry_by_key(&db_tx, idempotency_key)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("entry not exists".to_string()))?;

            let scope = Scope {
                mandal_id: entry.mandal_id,
                event_id: entry.event_id,
            };
            if !actor.scope.covers(&scope) {
                return Err(EngineError::KeyNotFound("entry not exists".to_string()));
            }
            let is_owner = entry.created_by_user_id == actor_model.id;
            if !is_owner && !actor_model.role()?.is_manager() {
                return Err(EngineError::Forbidden(
                    "only the creator or a manager can delete an entry".to_string(),
                ));
            }

            let updated = entries::Entity::update_many()
                .col_expr(entries::Column::IsDeleted, Expr::value(true))
                .col_expr(entries::Column::DeletedAt, Expr::value(deleted_at))
                .col_expr(entries::Column::DeletedBy, Expr::value(actor_model.id))
                .filter(entries::Column::Id.eq(entry.id))
                .filter(entries::Column::IsDeleted.eq(false))
                .exec(&db_tx)
                .await?;
            if updated.rows_affected == 0 {
                return Err(EngineError::Conflict("entry already deleted".to_string()));
            }

            tracing::info!(entry_id = %entry.id, deleted_by = %actor_model.id, "entry deleted");
            Ok(())
        })
    }
}

async fn find_entry_by_key<C: ConnectionTrait>(
    db: &C,
    idempotency_key: &str,
) -> ResultEngine<Option<entries::Model>> {
    entries::Entity::find()
        .filter(entries::Column::IdempotencyKey.eq(idempotency_key.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}
