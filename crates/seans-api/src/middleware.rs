use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use seans_types::api::Claims;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

const MISSING_TOKEN: ApiError = ApiError::Unauthorized("Zaloguj się, aby kontynuować.");

/// Extract and validate the JWT from the Authorization header, then check
/// its session is still live. Inserts the resolved `Actor`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(MISSING_TOKEN)?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        MISSING_TOKEN
    })?
    .claims;

    let actor = blocking(&state, move |svc| svc.authenticate(claims.sid)).await?;

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
