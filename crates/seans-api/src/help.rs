use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use seans_types::api::{SubmitHelpRequest, UpdateHelpStatusRequest};
use seans_types::models::HelpMessage;

use crate::error::ApiError;
use crate::service::Actor;
use crate::state::{AppState, blocking};

pub async fn list_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<HelpMessage>>, ApiError> {
    let messages = blocking(&state, move |svc| svc.help_messages(&actor)).await?;
    Ok(Json(messages))
}

pub async fn submit_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<SubmitHelpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |svc| svc.submit_help_message(&actor, &req.text)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdateHelpStatusRequest>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.update_help_message_status(&actor, id, req.status)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.remove_help_message(&actor, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
