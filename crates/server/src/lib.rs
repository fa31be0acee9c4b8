use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run_with_listener};

mod balance;
mod directory;
mod entries;
mod server;
mod transfers;

pub mod types {
    pub mod balance {
        pub use api_types::balance::{
            BalanceQuery, BalanceResponse, RecomputeResponse, WalletSummaryView,
        };
    }

    pub mod entry {
        pub use api_types::entry::{EntryKind, EntryList, EntryListResponse, EntryNew, EntryView};
    }

    pub mod transfer {
        pub use api_types::transfer::{
            TransferList, TransferListResponse, TransferNew, TransferStatus, TransferView,
        };
    }

    pub mod directory {
        pub use api_types::directory::{
            EventNew, EventView, MemberNew, MemberView, MembersResponse, Role,
        };
    }
}

pub struct ServerError(EngineError);

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidRole(_)
        | EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Database(_) | EngineError::Password(_) | EngineError::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Password(err) => {
            tracing::error!("password hashing error: {err}");
            "internal server error".to_string()
        }
        EngineError::Task(err) => {
            tracing::error!("background task error: {err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for_engine_error(&self.0);
        let error = message_for_engine_error(self.0);

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}
