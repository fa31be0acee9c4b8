//! Organizational scope and the acting identity.
//!
//! Every entry and transfer belongs to a mandal and, optionally, to one event
//! of that mandal. A `Scope` without an event covers the whole mandal.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub mandal_id: Uuid,
    pub event_id: Option<Uuid>,
}

impl Scope {
    #[must_use]
    pub fn mandal(mandal_id: Uuid) -> Self {
        Self {
            mandal_id,
            event_id: None,
        }
    }

    #[must_use]
    pub fn event(mandal_id: Uuid, event_id: Uuid) -> Self {
        Self {
            mandal_id,
            event_id: Some(event_id),
        }
    }

    /// Returns `true` if a record tagged with `other` is visible from `self`.
    ///
    /// A mandal-wide scope covers every event of the mandal; an event scope
    /// only covers records of that same event.
    #[must_use]
    pub fn covers(&self, other: &Scope) -> bool {
        if self.mandal_id != other.mandal_id {
            return false;
        }
        match self.event_id {
            None => true,
            Some(event_id) => other.event_id == Some(event_id),
        }
    }

    /// Narrows a mandal-wide scope to `event_id`.
    ///
    /// Narrowing an event scope to a different event is rejected.
    pub fn narrow(self, event_id: Option<Uuid>) -> Result<Self, EngineError> {
        match (self.event_id, event_id) {
            (_, None) => Ok(self),
            (None, Some(event_id)) => Ok(Self::event(self.mandal_id, event_id)),
            (Some(current), Some(requested)) if current == requested => Ok(self),
            (Some(_), Some(_)) => Err(EngineError::Forbidden(
                "event outside of the actor scope".to_string(),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::User => "user",
        }
    }

    pub fn is_manager(self) -> bool {
        matches!(self, Self::Manager)
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manager" => Ok(Self::Manager),
            "user" => Ok(Self::User),
            other => Err(EngineError::InvalidRole(format!("invalid role: {other}"))),
        }
    }
}

/// The authenticated identity attached to every engine call.
///
/// Built by [`Engine::authenticate`](crate::Engine::authenticate) or
/// [`Engine::actor`](crate::Engine::actor); never from request bodies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub scope: Scope,
}

impl Actor {
    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandal_scope_covers_its_events() {
        let mandal = Uuid::new_v4();
        let event = Uuid::new_v4();
        assert!(Scope::mandal(mandal).covers(&Scope::event(mandal, event)));
        assert!(Scope::mandal(mandal).covers(&Scope::mandal(mandal)));
        assert!(!Scope::mandal(mandal).covers(&Scope::mandal(Uuid::new_v4())));
    }

    #[test]
    fn event_scope_only_covers_same_event() {
        let mandal = Uuid::new_v4();
        let event = Uuid::new_v4();
        let scope = Scope::event(mandal, event);
        assert!(scope.covers(&Scope::event(mandal, event)));
        assert!(!scope.covers(&Scope::mandal(mandal)));
        assert!(!scope.covers(&Scope::event(mandal, Uuid::new_v4())));
    }

    #[test]
    fn narrow_rejects_switching_events() {
        let mandal = Uuid::new_v4();
        let event = Uuid::new_v4();
        let narrowed = Scope::mandal(mandal).narrow(Some(event)).unwrap();
        assert_eq!(narrowed, Scope::event(mandal, event));
        assert_eq!(narrowed.narrow(None).unwrap(), narrowed);
        assert!(matches!(
            narrowed.narrow(Some(Uuid::new_v4())),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn role_round_trips_through_storage_string() {
        assert_eq!(Role::try_from("manager").unwrap(), Role::Manager);
        assert_eq!(Role::try_from(Role::User.as_str()).unwrap(), Role::User);
        assert!(Role::try_from("admin").is_err());
    }
}
