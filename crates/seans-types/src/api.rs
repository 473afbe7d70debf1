use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{HelpStatus, LoginMode, Role, UserProfile};

// -- JWT Claims --

/// JWT claims issued at login. `sid` points at a row in the session table
/// so tokens can be revoked (logout, block, account removal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub invite_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub username: String,
    pub current_password: String,
    pub new_password: String,
}

// -- Admin --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockRequest {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockResponse {
    pub blocked_until: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MuteRequest {
    pub hours: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MuteResponse {
    pub muted_until: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InviteCodeResponse {
    pub code: String,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendChatMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadResponse {
    pub unread: bool,
}

// -- Help desk --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitHelpRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateHelpStatusRequest {
    pub status: HelpStatus,
}

// -- Streaming logins --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveStreamingLoginRequest {
    pub mode: Option<LoginMode>,
    pub username: Option<String>,
    pub password: Option<String>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
