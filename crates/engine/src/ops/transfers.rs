//! Transfer ledger and approval engine.

use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};

use crate::{
    Actor, EngineError, ResultEngine, Transfer, TransferListFilter, TransferRequestCmd,
    TransferStatus, mandals, transfers, users,
    util::{normalize_idempotency_key, normalize_optional_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Opens a pending transfer from the actor to their manager.
    ///
    /// The recipient is the actor's direct manager, or the founding manager
    /// of the mandal when none is set. The amount is not checked against the
    /// current balance: a manager decides on approval.
    pub async fn request_transfer(
        &self,
        actor: &Actor,
        cmd: TransferRequestCmd,
    ) -> ResultEngine<Transfer> {
        let key = normalize_idempotency_key(&cmd.idempotency_key)?;

        let transfer = with_tx!(self, |db_tx| {
            let sender = self.require_actor(&db_tx, actor).await?;
            self.require_scope(&db_tx, &actor.scope).await?;

            if let Some(existing) = find_transfer_by_key(&db_tx, &key).await? {
                if existing.from_user_id != sender.id {
                    return Err(EngineError::Conflict(
                        "idempotency_key already used".to_string(),
                    ));
                }
                return Transfer::try_from(existing);
            }

            let to_manager_id = match sender.manager_id {
                Some(manager_id) => manager_id,
                None => {
                    mandals::Entity::find_by_id(sender.mandal_id)
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("mandal not exists".to_string()))?
                        .manager_id
                }
            };

            let transfer = Transfer::pending(
                key,
                sender.id,
                to_manager_id,
                actor.scope,
                cmd.amount,
                normalize_optional_text(cmd.note.as_deref()),
                Utc::now(),
            )?;
            transfers::ActiveModel::from(&transfer)
                .insert(&db_tx)
                .await?;
            Ok::<_, EngineError>(transfer)
        })?;

        tracing::info!(
            transfer_id = %transfer.id,
            from = %transfer.from_user_id,
            to = %transfer.to_manager_id,
            amount = %transfer.amount,
            "transfer requested"
        );
        Ok(transfer)
    }

    /// Approves a pending transfer, moving its amount from the sender's
    /// cached wallet to the approving manager's.
    ///
    /// The status flip is a conditional update on `status = 'pending'`:
    /// of two concurrent calls exactly one succeeds, the other gets
    /// [`EngineError::Conflict`] and none of its writes are committed.
    pub async fn approve_transfer(&self, actor: &Actor, idempotency_key: &str) -> ResultEngine<()> {
        let transfer = with_tx!(self, |db_tx| {
            let (transfer, manager) = self.resolvable_transfer(&db_tx, actor, idempotency_key).await?;
            let now = Utc::now();

            let flipped = transfers::Entity::update_many()
                .col_expr(
                    transfers::Column::Status,
                    Expr::value(TransferStatus::Approved.as_str()),
                )
                .col_expr(transfers::Column::ApprovedAt, Expr::value(now))
                .col_expr(transfers::Column::ToManagerId, Expr::value(manager.id))
                .filter(transfers::Column::Id.eq(transfer.id))
                .filter(transfers::Column::Status.eq(TransferStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            if flipped.rows_affected == 0 {
                return Err(already_resolved());
            }

            let amount = transfer.amount_minor;
            users::Entity::update_many()
                .col_expr(
                    users::Column::WalletBalance,
                    Expr::col(users::Column::WalletBalance).sub(amount),
                )
                .col_expr(
                    users::Column::TotalTransferred,
                    Expr::col(users::Column::TotalTransferred).add(amount),
                )
                .filter(users::Column::Id.eq(transfer.from_user_id))
                .exec(&db_tx)
                .await?;
            users::Entity::update_many()
                .col_expr(
                    users::Column::WalletBalance,
                    Expr::col(users::Column::WalletBalance).add(amount),
                )
                .col_expr(
                    users::Column::ManagerBalance,
                    Expr::col(users::Column::ManagerBalance).add(amount),
                )
                .filter(users::Column::Id.eq(manager.id))
                .exec(&db_tx)
                .await?;

            Ok::<_, EngineError>(transfer)
        })?;

        tracing::info!(
            transfer_id = %transfer.id,
            approved_by = %actor.user_id,
            amount_minor = transfer.amount_minor,
            "transfer approved"
        );
        Ok(())
    }

    /// Rejects a pending transfer. Balances are not touched.
    pub async fn reject_transfer(&self, actor: &Actor, idempotency_key: &str) -> ResultEngine<()> {
        let transfer = with_tx!(self, |db_tx| {
            let (transfer, _) = self.resolvable_transfer(&db_tx, actor, idempotency_key).await?;

            let flipped = transfers::Entity::update_many()
                .col_expr(
                    transfers::Column::Status,
                    Expr::value(TransferStatus::Rejected.as_str()),
                )
                .col_expr(transfers::Column::ApprovedAt, Expr::value(Utc::now()))
                .filter(transfers::Column::Id.eq(transfer.id))
                .filter(transfers::Column::Status.eq(TransferStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            if flipped.rows_affected == 0 {
                return Err(already_resolved());
            }
            Ok::<_, EngineError>(transfer)
        })?;

        tracing::info!(
            transfer_id = %transfer.id,
            rejected_by = %actor.user_id,
            "transfer rejected"
        );
        Ok(())
    }

    /// Lists transfers, newest first. Managers see every transfer of their
    /// scope; members only the ones they sent.
    pub async fn list_transfers(
        &self,
        actor: &Actor,
        filter: &TransferListFilter,
    ) -> ResultEngine<Vec<Transfer>> {
        let actor_model = self.require_actor(&self.database, actor).await?;

        let mut query = transfers::Entity::find()
            .filter(transfers::Column::MandalId.eq(actor.scope.mandal_id))
            .order_by_desc(transfers::Column::RequestedAt);
        if let Some(event_id) = actor.scope.event_id {
            query = query.filter(transfers::Column::EventId.eq(event_id));
        }
        if !actor_model.role()?.is_manager() {
            query = query.filter(transfers::Column::FromUserId.eq(actor_model.id));
        }
        if let Some(status) = filter.status {
            query = query.filter(transfers::Column::Status.eq(status.as_str()));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transfer::try_from)
            .collect()
    }

    /// Looks up one transfer with the same visibility rules as
    /// [`Engine::list_transfers`].
    pub async fn transfer(&self, actor: &Actor, idempotency_key: &str) -> ResultEngine<Transfer> {
        let actor_model = self.require_actor(&self.database, actor).await?;
        let model = find_transfer_by_key(&self.database, idempotency_key)
            .await?
            .filter(|model| actor.scope.covers(&model.scope()))
            .ok_or_else(transfer_not_found)?;

        let visible = actor_model.role()?.is_manager()
            || model.from_user_id == actor_model.id
            || model.to_manager_id == actor_model.id;
        if !visible {
            return Err(transfer_not_found());
        }
        Transfer::try_from(model)
    }

    /// Shared guard of approve and reject.
    ///
    /// Checks run in order: the transfer exists, it is still pending, the
    /// actor is a manager whose scope covers it and who did not send it.
    async fn resolvable_transfer<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &Actor,
        idempotency_key: &str,
    ) -> ResultEngine<(transfers::Model, users::Model)> {
        let transfer = find_transfer_by_key(db, idempotency_key)
            .await?
            .ok_or_else(transfer_not_found)?;
        if transfer.status()?.is_terminal() {
            return Err(already_resolved());
        }

        let manager = self.require_actor(db, actor).await.map_err(|err| match err {
            EngineError::Forbidden(_) => forbidden_scope(),
            other => other,
        })?;
        if !manager.role()?.is_manager() {
            return Err(EngineError::Forbidden("manager role required".to_string()));
        }
        if !actor.scope.covers(&transfer.scope()) {
            return Err(forbidden_scope());
        }
        if transfer.from_user_id == manager.id {
            return Err(EngineError::Forbidden(
                "cannot approve your own transfer".to_string(),
            ));
        }
        Ok((transfer, manager))
    }
}

async fn find_transfer_by_key<C: ConnectionTrait>(
    db: &C,
    idempotency_key: &str,
) -> ResultEngine<Option<transfers::Model>> {
    transfers::Entity::find()
        .filter(transfers::Column::IdempotencyKey.eq(idempotency_key.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

fn transfer_not_found() -> EngineError {
    EngineError::KeyNotFound("transfer not exists".to_string())
}

fn already_resolved() -> EngineError {
    EngineError::Conflict("transfer already resolved".to_string())
}

fn forbidden_scope() -> EngineError {
    EngineError::Forbidden("transfer outside of the actor's scope".to_string())
}
