use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use seans_catalog::TmdbClient;

use crate::error::ApiError;
use crate::service::Service;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: Service,
    pub jwt_secret: String,
    pub catalog: TmdbClient,
}

/// Runs a service call on the blocking pool; every store access takes the
/// connection mutex.
pub async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Service) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.service))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow!("Blocking task failed: {}", e)
        })?
}
