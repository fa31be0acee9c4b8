//! Events: optional sub-scopes of a mandal (e.g. one festival year).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandalEvent {
    pub id: Uuid,
    pub mandal_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mandal_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub mandal_id: Uuid,
    pub name: String,
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

impl From<Model> for MandalEvent {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            mandal_id: model.mandal_id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}
