use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use seans_types::api::{BlockRequest, BlockResponse, MuteRequest, MuteResponse, ResetPasswordRequest};
use seans_types::models::UserProfile;

use crate::error::ApiError;
use crate::service::Actor;
use crate::state::{AppState, blocking};

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = blocking(&state, move |svc| svc.list_users(&actor)).await?;
    Ok(Json(users))
}

/// Body is optional; without it the default block length applies.
pub async fn block_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
    req: Option<Json<BlockRequest>>,
) -> Result<Json<BlockResponse>, ApiError> {
    let days = req.and_then(|Json(req)| req.days);
    let blocked_until =
        blocking(&state, move |svc| svc.block_user_for_days(&actor, &username, days)).await?;
    Ok(Json(BlockResponse { blocked_until }))
}

pub async fn unblock_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.unblock_user(&actor, &username)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mute_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
    req: Option<Json<MuteRequest>>,
) -> Result<Json<MuteResponse>, ApiError> {
    let hours = req.and_then(|Json(req)| req.hours);
    let muted_until =
        blocking(&state, move |svc| svc.mute_user_for_hours(&actor, &username, hours)).await?;
    Ok(Json(MuteResponse { muted_until }))
}

pub async fn unmute_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.clear_user_mute(&actor, &username)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| {
        svc.admin_reset_password(&actor, &username, &req.new_password)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.remove_user_account(&actor, &username)).await?;
    Ok(StatusCode::NO_CONTENT)
}
