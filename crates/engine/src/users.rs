//! Users: the unit of wallet accounting.
//!
//! The `wallet_balance`, `total_collected`, `total_transferred` and
//! `manager_balance` columns are a denormalized cache. They are written by
//! transfer approval (and by the explicit recompute), never read back by the
//! balance calculator.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Role};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub mandal_id: Uuid,
    pub name: String,
    pub mobile: String,
    pub role: Role,
    pub manager_id: Option<Uuid>,
    pub donation_count: i64,
    pub expense_count: i64,
    pub cached: CachedBalances,
    pub created_at: DateTime<Utc>,
}

/// Last values written to the account row. May drift from the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedBalances {
    pub wallet_balance: Money,
    pub total_collected: Money,
    pub total_transferred: Money,
    pub manager_balance: Money,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub mandal_id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub mobile: String,
    pub password_hash: String,
    pub role: String,
    pub manager_id: Option<Uuid>,
    pub donation_count: i64,
    pub expense_count: i64,
    pub wallet_balance: i64,
    pub total_collected: i64,
    pub total_transferred: i64,
    pub manager_balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mandals::Entity",
        from = "Column::MandalId",
        to = "super::mandals::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Mandals,
}

impl Related<super::mandals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mandals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn role(&self) -> Result<Role, EngineError> {
        Role::try_from(self.role.as_str())
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role = model.role()?;
        Ok(Self {
            id: model.id,
            mandal_id: model.mandal_id,
            name: model.name,
            mobile: model.mobile,
            role,
            manager_id: model.manager_id,
            donation_count: model.donation_count,
            expense_count: model.expense_count,
            cached: CachedBalances {
                wallet_balance: Money::new(model.wallet_balance),
                total_collected: Money::new(model.total_collected),
                total_transferred: Money::new(model.total_transferred),
                manager_balance: Money::new(model.manager_balance),
            },
            created_at: model.created_at,
        })
    }
}
