use axum::{
    Json, Router, middleware,
    routing::{delete, get, patch, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{admin, auth, catalog, chat, help, invites, streaming};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().timestamp(),
    })
}

/// The full HTTP surface. CORS and request tracing are layered on by the
/// binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", post(auth::change_password))
        .route("/chat/messages", get(chat::get_messages).post(chat::send_message))
        .route("/chat/messages/{id}", delete(chat::delete_message))
        .route("/chat/read", post(chat::mark_read))
        .route("/chat/unread", get(chat::unread))
        .route("/help", get(help::list_requests).post(help::submit_request))
        .route("/help/{id}", patch(help::update_status).delete(help::delete_request))
        .route("/streaming-logins", get(streaming::list_logins))
        .route(
            "/streaming-logins/{service_id}",
            put(streaming::save_login).delete(streaming::delete_login),
        )
        .route("/invites", get(invites::list_invites).post(invites::create_invite))
        .route("/invites/{code}", delete(invites::revoke_invite))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{username}", delete(admin::remove_user))
        .route("/admin/users/{username}/block", post(admin::block_user))
        .route("/admin/users/{username}/unblock", post(admin::unblock_user))
        .route("/admin/users/{username}/mute", post(admin::mute_user))
        .route("/admin/users/{username}/unmute", post(admin::unmute_user))
        .route("/admin/users/{username}/password", post(admin::reset_password))
        .route("/catalog/configuration", get(catalog::configuration))
        .route("/catalog/popular", get(catalog::popular))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
