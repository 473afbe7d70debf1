use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use seans_types::api::InviteCodeResponse;
use seans_types::models::InviteCode;

use crate::error::ApiError;
use crate::service::Actor;
use crate::state::{AppState, blocking};

pub async fn list_invites(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<InviteCode>>, ApiError> {
    let codes = blocking(&state, move |svc| svc.list_invite_codes(&actor)).await?;
    Ok(Json(codes))
}

pub async fn create_invite(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let invite = blocking(&state, move |svc| svc.create_invite_code(&actor)).await?;
    Ok((StatusCode::CREATED, Json(InviteCodeResponse { code: invite.code })))
}

pub async fn revoke_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.revoke_invite_code(&actor, &code)).await?;
    Ok(StatusCode::NO_CONTENT)
}
