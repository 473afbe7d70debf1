use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};

use seans_types::api::{ChangePasswordRequest, Claims, LoginRequest, LoginResponse, RegisterRequest};
use seans_types::models::UserProfile;

use crate::error::ApiError;
use crate::service::{Actor, LoginOutcome};
use crate::state::{AppState, blocking};

const TOKEN_TTL_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |svc| {
        svc.register(&req.username, &req.email, &req.password, &req.invite_code)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = blocking(&state, move |svc| svc.login(&req.username, &req.password)).await?;
    let token = create_token(&state.jwt_secret, &outcome)?;

    Ok(Json(LoginResponse {
        user: outcome.user,
        token,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| svc.logout(&actor)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = blocking(&state, move |svc| svc.current_user(&actor)).await?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |svc| {
        svc.change_password(&actor, &req.username, &req.current_password, &req.new_password)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn create_token(secret: &str, outcome: &LoginOutcome) -> anyhow::Result<String> {
    let claims = Claims {
        sub: outcome.user.id,
        sid: outcome.session_id,
        username: outcome.user.username.clone(),
        role: outcome.user.role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
