//! Events and members

use api_types::directory::{
    EventNew, EventView, MemberNew, MemberView, MembersResponse, Role as ApiRole,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Actor, NewMemberCmd, Role, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_role(role: Role) -> ApiRole {
    match role {
        Role::Manager => ApiRole::Manager,
        Role::User => ApiRole::User,
    }
}

fn member_view(user: User) -> MemberView {
    MemberView {
        id: user.id,
        mandal_id: user.mandal_id,
        name: user.name,
        mobile: user.mobile,
        role: map_role(user.role),
        manager_id: user.manager_id,
    }
}

pub async fn event_new(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<EventNew>,
) -> Result<(StatusCode, Json<EventView>), ServerError> {
    let event = state.engine.create_event(&actor, &payload.name).await?;

    Ok((
        StatusCode::CREATED,
        Json(EventView {
            id: event.id,
            mandal_id: event.mandal_id,
            name: event.name,
        }),
    ))
}

pub async fn member_new(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let role = match payload.role {
        Some(ApiRole::Manager) => Role::Manager,
        Some(ApiRole::User) | None => Role::User,
    };
    let cmd = NewMemberCmd::new(payload.name, payload.mobile, payload.password).role(role);
    let user = state.engine.add_member(&actor, cmd).await?;

    Ok((StatusCode::CREATED, Json(member_view(user))))
}

pub async fn member_get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MemberView>, ServerError> {
    let user = state.engine.user(&actor, user_id).await?;
    Ok(Json(member_view(user)))
}

pub async fn members(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state.engine.members(&actor).await?;
    Ok(Json(MembersResponse {
        members: members.into_iter().map(member_view).collect(),
    }))
}
