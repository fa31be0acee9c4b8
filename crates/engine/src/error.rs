//! The module contains the error the engine can throw.
//!
//! The errors callers are expected to handle are:
//!
//! - [`KeyNotFound`] thrown when an entry, transfer, user or event does not
//!   exist (or is not visible to the actor).
//! - [`Conflict`] thrown when a transfer is already resolved, an entry is
//!   already deleted or an idempotency key belongs to someone else.
//! - [`Forbidden`] thrown when the actor lacks the role or the scope.
//! - [`InvalidAmount`] / [`Validation`] thrown on malformed input.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Conflict`]: EngineError::Conflict
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`Validation`]: EngineError::Validation
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Password hashing failed: {0}")]
    Password(#[from] bcrypt::BcryptError),
    #[error("Background task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Password(a), Self::Password(b)) => a.to_string() == b.to_string(),
            (Self::Task(a), Self::Task(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
