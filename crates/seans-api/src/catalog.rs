use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use seans_catalog::{ApiConfiguration, MediaItem, Page, PagingOptions, PopularMovies, collect_page};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    #[serde(default = "first_page")]
    pub page: u32,
    pub genre: Option<u32>,
}

fn first_page() -> u32 {
    1
}

pub async fn configuration(State(state): State<AppState>) -> Json<ApiConfiguration> {
    Json(state.catalog.configuration().await)
}

/// Popular movies, or shows and movies of one genre merged by popularity.
pub async fn popular(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Page<MediaItem>>, ApiError> {
    let page = match query.genre {
        Some(genre) => state.catalog.merged_by_genre(genre, query.page).await?,
        None => {
            collect_page(&PopularMovies(&state.catalog), query.page, &PagingOptions::default())
                .await?
        }
    };
    Ok(Json(page))
}
