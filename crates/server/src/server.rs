use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, Error as AxumError, Header, authorization::Basic},
};
use uuid::Uuid;

use std::sync::Arc;

use crate::{ServerError, balance, directory, entries, transfers};
use engine::{Engine, EngineError};

static EVENT_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-event-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` narrowing a request to one event.
///
/// When present, every engine call of the request runs in the scope of that
/// event of the user's mandal.
#[derive(Debug)]
struct EventHeader(Uuid);

impl Header for EventHeader {
    fn name() -> &'static axum::http::HeaderName {
        &EVENT_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = Uuid::parse_str(value.trim()) else {
            return Err(AxumError::invalid());
        };

        Ok(EventHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        let as_string = self.0.to_string();
        match axum::http::HeaderValue::from_str(&as_string) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-event-id header"),
        }
    }
}

/// Resolves Basic credentials (`mobile:password`) into an [`engine::Actor`]
/// stored in the request extensions.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    event_header: Option<TypedHeader<EventHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let unauthorized = || ServerError::from(EngineError::Unauthorized("missing credentials".to_string()));

    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(unauthorized());
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(unauthorized());
    }

    let event_id = event_header.map(|TypedHeader(EventHeader(id))| id);
    let actor = state
        .engine
        .authenticate(credentials.username(), credentials.password(), event_id)
        .await?;

    tracing::debug!(user_id = %actor.user_id, ?event_id, "request authenticated");
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

pub fn router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route("/balance", get(balance::get_balance))
        .route("/balance/{user_id}/recompute", post(balance::recompute))
        .route("/wallet/summary", get(balance::wallet_summary))
        .route(
            "/transfers",
            post(transfers::transfer_new).get(transfers::list),
        )
        .route("/transfers/{key}", get(transfers::get))
        .route("/transfers/{key}/approve", post(transfers::approve))
        .route("/transfers/{key}/reject", post(transfers::reject))
        .route("/donations", post(entries::donation_new))
        .route("/expenses", post(entries::expense_new))
        .route("/entries", get(entries::list))
        .route("/entries/{key}/delete", post(entries::delete))
        .route("/events", post(directory::event_new))
        .route(
            "/members",
            post(directory::member_new).get(directory::members),
        )
        .route("/members/{user_id}", get(directory::member_get))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}
