use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{Actor, EngineError, ResultEngine, Scope, mandal_events, users};

use super::Engine;

impl Engine {
    pub(super) async fn find_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Re-reads the acting user from the store.
    ///
    /// The actor is only trusted for its id and its (possibly narrowed) event;
    /// role and mandal are checked against the row.
    pub(super) async fn require_actor<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &Actor,
    ) -> ResultEngine<users::Model> {
        let model = self.find_user(db, actor.user_id).await?;
        if model.mandal_id != actor.scope.mandal_id {
            return Err(EngineError::Forbidden(
                "actor outside of the mandal".to_string(),
            ));
        }
        Ok(model)
    }

    pub(super) async fn require_manager<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &Actor,
    ) -> ResultEngine<users::Model> {
        let model = self.require_actor(db, actor).await?;
        if !model.role()?.is_manager() {
            return Err(EngineError::Forbidden("manager role required".to_string()));
        }
        Ok(model)
    }

    /// Ensures the event of `scope` (if any) belongs to its mandal.
    pub(super) async fn require_scope<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &Scope,
    ) -> ResultEngine<()> {
        let Some(event_id) = scope.event_id else {
            return Ok(());
        };
        let exists = mandal_events::Entity::find_by_id(event_id)
            .filter(mandal_events::Column::MandalId.eq(scope.mandal_id))
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("event not exists".to_string()));
        }
        Ok(())
    }

    /// Loads `user_id` if the actor may read their wallet.
    ///
    /// Members read their own wallet; managers read any member of a mandal
    /// their scope covers.
    pub(super) async fn require_readable_user<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &Actor,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        let actor_model = self.require_actor(db, actor).await?;
        let target = self.find_user(db, user_id).await?;
        if target.id == actor_model.id {
            return Ok(target);
        }
        if !actor_model.role()?.is_manager() {
            return Err(EngineError::Forbidden(
                "cannot read another member's wallet".to_string(),
            ));
        }
        if target.mandal_id != actor_model.mandal_id {
            return Err(EngineError::Forbidden(
                "member outside of the mandal".to_string(),
            ));
        }
        Ok(target)
    }
}
