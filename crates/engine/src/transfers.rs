//! Wallet transfer primitives.
//!
//! A `Transfer` asks to move wallet funds from a member to their manager. It
//! starts `Pending` and ends, exactly once, `Approved` or `Rejected`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Scope, util::ensure_transfer_amount};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<&str> for TransferStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::Validation(format!(
                "invalid transfer status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub idempotency_key: String,
    pub from_user_id: Uuid,
    pub to_manager_id: Uuid,
    pub scope: Scope,
    pub amount: Money,
    pub status: TransferStatus,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Transfer {
    pub(crate) fn pending(
        idempotency_key: String,
        from_user_id: Uuid,
        to_manager_id: Uuid,
        scope: Scope,
        amount: Money,
        note: Option<String>,
        requested_at: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        ensure_transfer_amount(amount)?;
        if from_user_id == to_manager_id {
            return Err(EngineError::Validation(
                "cannot transfer to yourself".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            idempotency_key,
            from_user_id,
            to_manager_id,
            scope,
            amount,
            status: TransferStatus::Pending,
            note,
            requested_at,
            approved_at: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub from_user_id: Uuid,
    pub to_manager_id: Uuid,
    pub mandal_id: Uuid,
    pub event_id: Option<Uuid>,
    pub amount_minor: i64,
    pub status: String,
    pub note: Option<String>,
    pub requested_at: DateTimeUtc,
    pub approved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FromUserId",
        to = "super::users::Column::Id"
    )]
    FromUser,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn scope(&self) -> Scope {
        Scope {
            mandal_id: self.mandal_id,
            event_id: self.event_id,
        }
    }

    pub(crate) fn status(&self) -> Result<TransferStatus, EngineError> {
        TransferStatus::try_from(self.status.as_str())
    }
}

impl From<&Transfer> for ActiveModel {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(transfer.id),
            idempotency_key: ActiveValue::Set(transfer.idempotency_key.clone()),
            from_user_id: ActiveValue::Set(transfer.from_user_id),
            to_manager_id: ActiveValue::Set(transfer.to_manager_id),
            mandal_id: ActiveValue::Set(transfer.scope.mandal_id),
            event_id: ActiveValue::Set(transfer.scope.event_id),
            amount_minor: ActiveValue::Set(transfer.amount.minor()),
            status: ActiveValue::Set(transfer.status.as_str().to_string()),
            note: ActiveValue::Set(transfer.note.clone()),
            requested_at: ActiveValue::Set(transfer.requested_at),
            approved_at: ActiveValue::Set(transfer.approved_at),
        }
    }
}

impl TryFrom<Model> for Transfer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status = model.status()?;
        let scope = model.scope();
        Ok(Self {
            id: model.id,
            idempotency_key: model.idempotency_key,
            from_user_id: model.from_user_id,
            to_manager_id: model.to_manager_id,
            scope,
            amount: Money::new(model.amount_minor),
            status,
            note: model.note,
            requested_at: model.requested_at,
            approved_at: model.approved_at,
        })
    }
}
