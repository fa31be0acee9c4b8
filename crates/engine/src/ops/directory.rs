//! Mandals, events, members and authentication.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, EngineError, Mandal, MandalEvent, NewMandalCmd, NewMemberCmd, ResultEngine, Role,
    Scope, User, mandal_events, mandals, users,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a mandal together with its founding manager.
    pub async fn create_mandal(&self, cmd: NewMandalCmd) -> ResultEngine<Mandal> {
        let name = normalize_required_name(&cmd.name, "mandal name")?;
        let manager_name = normalize_required_name(&cmd.manager_name, "manager name")?;
        let mobile = normalize_required_name(&cmd.mobile, "mobile")?;
        let password_hash = self.hash_password(cmd.password).await?;

        let mandal = with_tx!(self, |db_tx| {
            self.require_mobile_free(&db_tx, &mobile).await?;

            let now = Utc::now();
            let mandal = mandals::Model {
                id: Uuid::new_v4(),
                name,
                manager_id: Uuid::new_v4(),
                created_at: now,
            };
            mandals::ActiveModel::from(mandal.clone())
                .insert(&db_tx)
                .await?;
            new_user_model(
                mandal.manager_id,
                mandal.id,
                manager_name,
                mobile,
                password_hash,
                Role::Manager,
                None,
            )
            .insert(&db_tx)
            .await?;

            Ok::<_, EngineError>(Mandal::from(mandal))
        })?;

        tracing::info!(mandal_id = %mandal.id, "mandal created");
        Ok(mandal)
    }

    /// Creates an event inside the acting manager's mandal.
    pub async fn create_event(&self, actor: &Actor, name: &str) -> ResultEngine<MandalEvent> {
        let name = normalize_required_name(name, "event name")?;
        with_tx!(self, |db_tx| {
            let manager = self.require_manager(&db_tx, actor).await?;
            let duplicate = mandal_events::Entity::find()
                .filter(mandal_events::Column::MandalId.eq(manager.mandal_id))
                .filter(mandal_events::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if duplicate {
                return Err(EngineError::ExistingKey(name));
            }

            let event = mandal_events::Model {
                id: Uuid::new_v4(),
                mandal_id: manager.mandal_id,
                name,
                created_at: Utc::now(),
            };
            mandal_events::ActiveModel::from(event.clone())
                .insert(&db_tx)
                .await?;
            Ok(MandalEvent::from(event))
        })
    }

    /// Adds a member to the acting manager's mandal, reporting to that
    /// manager.
    pub async fn add_member(&self, actor: &Actor, cmd: NewMemberCmd) -> ResultEngine<User> {
        let name = normalize_required_name(&cmd.name, "member name")?;
        let mobile = normalize_required_name(&cmd.mobile, "mobile")?;
        let password_hash = self.hash_password(cmd.password).await?;

        with_tx!(self, |db_tx| {
            let manager = self.require_manager(&db_tx, actor).await?;
            self.require_mobile_free(&db_tx, &mobile).await?;

            let model = new_user_model(
                Uuid::new_v4(),
                manager.mandal_id,
                name,
                mobile,
                password_hash,
                cmd.role,
                Some(manager.id),
            )
            .insert(&db_tx)
            .await?;
            User::try_from(model)
        })
    }

    /// Resolves credentials into an [`Actor`], optionally narrowed to one
    /// event of the user's mandal.
    pub async fn authenticate(
        &self,
        mobile: &str,
        password: &str,
        event_id: Option<Uuid>,
    ) -> ResultEngine<Actor> {
        let invalid = || EngineError::Unauthorized("invalid credentials".to_string());

        let model = users::Entity::find()
            .filter(users::Column::Mobile.eq(mobile.trim()))
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;

        let password = password.to_owned();
        let hash = model.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash))
            .await
            .map_err(|err| EngineError::Task(err.to_string()))??;
        if !valid {
            return Err(invalid());
        }

        self.actor_from_model(model, event_id).await
    }

    /// Builds an [`Actor`] for an already authenticated user id.
    pub async fn actor(&self, user_id: Uuid, event_id: Option<Uuid>) -> ResultEngine<Actor> {
        let model = self.find_user(&self.database, user_id).await?;
        self.actor_from_model(model, event_id).await
    }

    /// Returns a member, including the cached balance columns.
    pub async fn user(&self, actor: &Actor, user_id: Uuid) -> ResultEngine<User> {
        let model = self
            .require_readable_user(&self.database, actor, user_id)
            .await?;
        User::try_from(model)
    }

    /// Every user of the acting manager's mandal, ordered by name.
    pub async fn members(&self, actor: &Actor) -> ResultEngine<Vec<User>> {
        let manager = self.require_manager(&self.database, actor).await?;
        users::Entity::find()
            .filter(users::Column::MandalId.eq(manager.mandal_id))
            .order_by_asc(users::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub async fn mandal(&self, actor: &Actor) -> ResultEngine<Mandal> {
        mandals::Entity::find_by_id(actor.scope.mandal_id)
            .one(&self.database)
            .await?
            .map(Mandal::from)
            .ok_or_else(|| EngineError::KeyNotFound("mandal not exists".to_string()))
    }

    async fn actor_from_model(
        &self,
        model: users::Model,
        event_id: Option<Uuid>,
    ) -> ResultEngine<Actor> {
        let scope = Scope::mandal(model.mandal_id).narrow(event_id)?;
        self.require_scope(&self.database, &scope).await?;
        Ok(Actor {
            user_id: model.id,
            role: model.role()?,
            name: model.name,
            scope,
        })
    }

    async fn require_mobile_free(&self, db: &DatabaseTransaction, mobile: &str) -> ResultEngine<()> {
        let taken = users::Entity::find()
            .filter(users::Column::Mobile.eq(mobile))
            .one(db)
            .await?
            .is_some();
        if taken {
            return Err(EngineError::ExistingKey(mobile.to_string()));
        }
        Ok(())
    }

    async fn hash_password(&self, password: String) -> ResultEngine<String> {
        if password.is_empty() {
            return Err(EngineError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        let cost = self.password_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| EngineError::Task(err.to_string()))??;
        Ok(hash)
    }
}

fn new_user_model(
    id: Uuid,
    mandal_id: Uuid,
    name: String,
    mobile: String,
    password_hash: String,
    role: Role,
    manager_id: Option<Uuid>,
) -> users::ActiveModel {
    users::ActiveModel {
        id: ActiveValue::Set(id),
        mandal_id: ActiveValue::Set(mandal_id),
        name: ActiveValue::Set(name),
        mobile: ActiveValue::Set(mobile),
        password_hash: ActiveValue::Set(password_hash),
        role: ActiveValue::Set(role.as_str().to_string()),
        manager_id: ActiveValue::Set(manager_id),
        donation_count: ActiveValue::Set(0),
        expense_count: ActiveValue::Set(0),
        wallet_balance: ActiveValue::Set(0),
        total_collected: ActiveValue::Set(0),
        total_transferred: ActiveValue::Set(0),
        manager_balance: ActiveValue::Set(0),
        created_at: ActiveValue::Set(Utc::now()),
    }
}
