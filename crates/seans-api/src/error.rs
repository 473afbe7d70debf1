use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::error;

use seans_catalog::CatalogError;
use seans_types::api::ErrorBody;

/// Every failure a caller can see. Display strings are the user-facing
/// (Polish) messages sent back as `{"error": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Konto zablokowane do {}.", format_pl(.until))]
    Blocked { until: DateTime<Utc> },

    #[error("Jesteś wyciszony. Spróbuj ponownie później.")]
    Muted { until: DateTime<Utc> },

    #[error("Nieprawidłowy lub wykorzystany kod rejestracyjny.")]
    InvalidInvite,

    #[error("Nie udało się pobrać danych z katalogu.")]
    Catalog(#[from] CatalogError),

    #[error("Wystąpił błąd serwera.")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidInvite => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::Blocked { .. } | Self::Muted { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Catalog(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => error!("Internal error: {:#}", e),
            Self::Catalog(e) => error!("Catalog error: {}", e),
            _ => {}
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Date and time the way the pl-PL locale prints it, in UTC.
pub fn format_pl(ts: &DateTime<Utc>) -> String {
    ts.format("%d.%m.%Y, %H:%M:%S").to_string()
}
