use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use seans_types::api::SaveStreamingLoginRequest;
use seans_types::models::StreamingLogin;

use crate::error::ApiError;
use crate::service::Actor;
use crate::state::{AppState, blocking};

pub async fn list_logins(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<BTreeMap<String, StreamingLogin>>, ApiError> {
    let logins = blocking(&state, move |svc| svc.streaming_logins(&actor)).await?;
    Ok(Json(logins))
}

pub async fn save_login(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<SaveStreamingLoginRequest>,
) -> Result<Json<StreamingLogin>, ApiError> {
    let login = blocking(&state, move |svc| {
        svc.save_streaming_login(
            &actor,
            &service_id,
            req.mode,
            req.username.as_deref(),
            req.password.as_deref(),
        )
    })
    .await?;
    Ok(Json(login))
}

pub async fn delete_login(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.remove_streaming_login(&actor, &service_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
