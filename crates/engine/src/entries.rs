//! Entry primitives.
//!
//! An `Entry` is either a donation (money collected by a member) or an
//! expense (money spent by a member). Both share one table, discriminated by
//! `kind`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Scope};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Donation,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Donation => "donation",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "donation" => Ok(Self::Donation),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

/// Free-form details carried by donations and expenses.
///
/// For donations `counterparty` is the donor and `category` the donation
/// type; for expenses they are the payee and the expense category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    pub counterparty: Option<String>,
    pub category: Option<String>,
    pub payment_mode: Option<String>,
    pub contact: Option<String>,
    pub received_by: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub idempotency_key: String,
    pub kind: EntryKind,
    pub amount: Money,
    pub scope: Scope,
    pub created_by_user_id: Uuid,
    pub created_by_name: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub is_synced: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub details: EntryDetails,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub kind: String,
    pub amount_minor: i64,
    pub mandal_id: Uuid,
    pub event_id: Option<Uuid>,
    pub created_by_user_id: Uuid,
    pub created_by_name: String,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub is_deleted: bool,
    pub is_synced: bool,
    pub deleted_at: Option<DateTimeUtc>,
    pub deleted_by: Option<Uuid>,
    pub counterparty: Option<String>,
    pub category: Option<String>,
    pub payment_mode: Option<String>,
    pub contact: Option<String>,
    pub received_by: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedByUserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Entry> for ActiveModel {
    fn from(entry: &Entry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id),
            idempotency_key: ActiveValue::Set(entry.idempotency_key.clone()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount.minor()),
            mandal_id: ActiveValue::Set(entry.scope.mandal_id),
            event_id: ActiveValue::Set(entry.scope.event_id),
            created_by_user_id: ActiveValue::Set(entry.created_by_user_id),
            created_by_name: ActiveValue::Set(entry.created_by_name.clone()),
            occurred_at: ActiveValue::Set(entry.occurred_at),
            created_at: ActiveValue::Set(entry.created_at),
            is_deleted: ActiveValue::Set(entry.is_deleted),
            is_synced: ActiveValue::Set(entry.is_synced),
            deleted_at: ActiveValue::Set(entry.deleted_at),
            deleted_by: ActiveValue::Set(entry.deleted_by),
            counterparty: ActiveValue::Set(entry.details.counterparty.clone()),
            category: ActiveValue::Set(entry.details.category.clone()),
            payment_mode: ActiveValue::Set(entry.details.payment_mode.clone()),
            contact: ActiveValue::Set(entry.details.contact.clone()),
            received_by: ActiveValue::Set(entry.details.received_by.clone()),
            remarks: ActiveValue::Set(entry.details.remarks.clone()),
        }
    }
}

impl TryFrom<Model> for Entry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            idempotency_key: model.idempotency_key,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            scope: Scope {
                mandal_id: model.mandal_id,
                event_id: model.event_id,
            },
            created_by_user_id: model.created_by_user_id,
            created_by_name: model.created_by_name,
            occurred_at: model.occurred_at,
            created_at: model.created_at,
            is_deleted: model.is_deleted,
            is_synced: model.is_synced,
            deleted_at: model.deleted_at,
            deleted_by: model.deleted_by,
            details: EntryDetails {
                counterparty: model.counterparty,
                category: model.category,
                payment_mode: model.payment_mode,
                contact: model.contact,
                received_by: model.received_by,
                remarks: model.remarks,
            },
        })
    }
}
