use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use seans_types::api::{SendChatMessageRequest, UnreadResponse};
use seans_types::models::ChatMessage;

use crate::error::ApiError;
use crate::service::Actor;
use crate::state::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    /// Newest `limit` messages, still oldest first.
    pub limit: Option<u32>,
}

pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let messages = blocking(&state, move |svc| svc.chat_messages(query.limit)).await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<SendChatMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |svc| svc.add_chat_message(&actor, &req.text)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.remove_chat_message(&actor, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.mark_chat_as_read(&actor)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unread(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<UnreadResponse>, ApiError> {
    let unread = blocking(&state, move |svc| svc.has_unread_messages(&actor)).await?;
    Ok(Json(UnreadResponse { unread }))
}
