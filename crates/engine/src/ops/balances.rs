//! Balance calculator.
//!
//! Every figure here is summed from `entries` and `wallet_transfers`; the
//! cached columns on `users` are never read back.

use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QuerySelect, Select, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Actor, EngineError, EntryKind, Money, ResultEngine, Role, Scope, TransferStatus, entries,
    transfers, users,
};

use super::{Engine, with_tx};

/// Breakdown of a wallet over one scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    /// Non-deleted donations recorded by the user.
    pub collected: Money,
    /// Non-deleted expenses recorded by the user.
    pub spent: Money,
    /// Approved transfers sent by the user.
    pub transferred_out: Money,
    /// Approved transfers received. Always zero for regular members.
    pub received: Money,
    /// `collected - spent - transferred_out`, plus `received` for managers.
    pub balance: Money,
}

/// Raw sums read from the ledger, before the role decides what counts.
#[derive(Clone, Copy, Debug)]
struct LedgerTotals {
    collected: Money,
    spent: Money,
    transferred_out: Money,
    received: Money,
}

impl LedgerTotals {
    fn user_balance(&self) -> ResultEngine<Money> {
        self.collected
            .checked_sub(self.spent)
            .and_then(|balance| balance.checked_sub(self.transferred_out))
            .ok_or_else(out_of_range)
    }

    fn manager_balance(&self) -> ResultEngine<Money> {
        self.user_balance()?
            .checked_add(self.received)
            .ok_or_else(out_of_range)
    }

    fn summary(self, role: Role) -> ResultEngine<WalletSummary> {
        let (received, balance) = if role.is_manager() {
            (self.received, self.manager_balance()?)
        } else {
            (Money::ZERO, self.user_balance()?)
        };
        Ok(WalletSummary {
            collected: self.collected,
            spent: self.spent,
            transferred_out: self.transferred_out,
            received,
            balance,
        })
    }
}

impl Engine {
    /// Balance of a regular member:
    /// donations − expenses − approved outgoing transfers.
    pub async fn user_balance(
        &self,
        actor: &Actor,
        user_id: Uuid,
        event_id: Option<Uuid>,
    ) -> ResultEngine<Money> {
        let scope = self.balance_scope(actor, event_id).await?;
        self.require_readable_user(&self.database, actor, user_id)
            .await?;
        totals(&self.database, user_id, &scope).await?.user_balance()
    }

    /// Balance of a manager: their own user balance plus every approved
    /// transfer they received.
    pub async fn manager_balance(
        &self,
        actor: &Actor,
        manager_id: Uuid,
        event_id: Option<Uuid>,
    ) -> ResultEngine<Money> {
        let scope = self.balance_scope(actor, event_id).await?;
        self.require_readable_user(&self.database, actor, manager_id)
            .await?;
        totals(&self.database, manager_id, &scope)
            .await?
            .manager_balance()
    }

    /// Balance of `user_id`, computed as a manager or as a member depending
    /// on the role stored for that user.
    pub async fn balance(
        &self,
        actor: &Actor,
        user_id: Uuid,
        event_id: Option<Uuid>,
    ) -> ResultEngine<Money> {
        Ok(self.wallet_summary(actor, user_id, event_id).await?.balance)
    }

    pub async fn wallet_summary(
        &self,
        actor: &Actor,
        user_id: Uuid,
        event_id: Option<Uuid>,
    ) -> ResultEngine<WalletSummary> {
        let scope = self.balance_scope(actor, event_id).await?;
        let target = self
            .require_readable_user(&self.database, actor, user_id)
            .await?;
        totals(&self.database, target.id, &scope)
            .await?
            .summary(target.role()?)
    }

    /// Rewrites the cached balance columns of `user_id` from the ledger,
    /// over the whole mandal.
    pub async fn recompute_cached_balances(
        &self,
        actor: &Actor,
        user_id: Uuid,
    ) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            let manager = self.require_manager(&db_tx, actor).await?;
            let target = self.find_user(&db_tx, user_id).await?;
            if target.mandal_id != manager.mandal_id {
                return Err(EngineError::Forbidden(
                    "member outside of the mandal".to_string(),
                ));
            }

            let scope = Scope::mandal(target.mandal_id);
            let summary = totals(&db_tx, target.id, &scope)
                .await?
                .summary(target.role()?)?;
            let balance = summary.balance;

            users::ActiveModel {
                id: ActiveValue::Set(target.id),
                wallet_balance: ActiveValue::Set(balance.minor()),
                total_collected: ActiveValue::Set(summary.collected.minor()),
                total_transferred: ActiveValue::Set(summary.transferred_out.minor()),
                manager_balance: ActiveValue::Set(summary.received.minor()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            tracing::info!(user_id = %target.id, balance = %balance, "cached balances recomputed");
            Ok(balance)
        })
    }

    /// The actor's scope narrowed to `event_id`, validated against the store.
    async fn balance_scope(&self, actor: &Actor, event_id: Option<Uuid>) -> ResultEngine<Scope> {
        let scope = actor.scope.narrow(event_id)?;
        self.require_scope(&self.database, &scope).await?;
        Ok(scope)
    }
}

async fn totals<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    scope: &Scope,
) -> ResultEngine<LedgerTotals> {
    let collected = sum_entries(db, user_id, scope, EntryKind::Donation).await?;
    let spent = sum_entries(db, user_id, scope, EntryKind::Expense).await?;
    let transferred_out = sum_approved_transfers(
        db,
        transfers::Entity::find().filter(transfers::Column::FromUserId.eq(user_id)),
        scope,
    )
    .await?;
    let received = sum_approved_transfers(
        db,
        transfers::Entity::find().filter(transfers::Column::ToManagerId.eq(user_id)),
        scope,
    )
    .await?;

    Ok(LedgerTotals {
        collected,
        spent,
        transferred_out,
        received,
    })
}

async fn sum_entries<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    scope: &Scope,
    kind: EntryKind,
) -> ResultEngine<Money> {
    let mut query = entries::Entity::find()
        .filter(entries::Column::CreatedByUserId.eq(user_id))
        .filter(entries::Column::Kind.eq(kind.as_str()))
        .filter(entries::Column::IsDeleted.eq(false))
        .filter(entries::Column::MandalId.eq(scope.mandal_id));
    if let Some(event_id) = scope.event_id {
        query = query.filter(entries::Column::EventId.eq(event_id));
    }
    sum_amount(db, query).await
}

async fn sum_approved_transfers<C: ConnectionTrait>(
    db: &C,
    query: Select<transfers::Entity>,
    scope: &Scope,
) -> ResultEngine<Money> {
    let mut query = query
        .filter(transfers::Column::Status.eq(TransferStatus::Approved.as_str()))
        .filter(transfers::Column::MandalId.eq(scope.mandal_id));
    if let Some(event_id) = scope.event_id {
        query = query.filter(transfers::Column::EventId.eq(event_id));
    }
    sum_amount(db, query).await
}

async fn sum_amount<C, E>(db: &C, query: Select<E>) -> ResultEngine<Money>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let sum: Option<i64> = query
        .select_only()
        .column_as(Expr::cust("COALESCE(SUM(amount_minor), 0)"), "sum")
        .into_tuple()
        .one(db)
        .await
        .map_err(|err| {
            // SQLite's SUM() raises instead of wrapping.
            if err.to_string().contains("integer overflow") {
                out_of_range()
            } else {
                EngineError::from(err)
            }
        })?;
    Ok(Money::new(sum.unwrap_or(0)))
}

fn out_of_range() -> EngineError {
    EngineError::InvalidAmount("balance out of range".to_string())
}
