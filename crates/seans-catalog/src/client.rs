use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::filter::{clean_results, merge_by_popularity};
use crate::models::{ApiConfiguration, Genre, MediaItem, MediaType, Page};
use crate::paging::PageSource;
use crate::CatalogError;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const LANGUAGE: &str = "pl-PL";

#[derive(serde::Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(serde::Deserialize)]
struct StatusBody {
    #[serde(default)]
    status_message: String,
}

/// Thin client for the movie metadata API.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StatusBody>()
                .await
                .map(|body| body.status_message)
                .unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Image configuration. Never fails: upstream errors fall back to the
    /// static configuration.
    pub async fn configuration(&self) -> ApiConfiguration {
        match self.get("/configuration", &[]).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Using fallback catalog configuration: {}", e);
                ApiConfiguration::fallback()
            }
        }
    }

    pub async fn genres(&self, media: MediaType) -> Result<Vec<Genre>, CatalogError> {
        let list: GenreList = self.get(&format!("/genre/{}/list", media.as_str()), &[]).await?;
        Ok(list.genres)
    }

    /// Popular titles with adult and unrated past titles removed.
    pub async fn popular(&self, media: MediaType, page: u32) -> Result<Page<MediaItem>, CatalogError> {
        let mut page: Page<MediaItem> = self
            .get(&format!("/{}/popular", media.as_str()), &[("page", page.max(1).to_string())])
            .await?;
        page.results = clean_results(page.results, Utc::now().date_naive());
        Ok(page)
    }

    pub async fn discover_by_genre(
        &self,
        media: MediaType,
        genre: u32,
        page: u32,
    ) -> Result<Page<MediaItem>, CatalogError> {
        let query = [
            ("with_genres", genre.to_string()),
            ("sort_by", "popularity.desc".to_string()),
            ("page", page.max(1).to_string()),
        ];
        let mut page: Page<MediaItem> =
            self.get(&format!("/discover/{}", media.as_str()), &query).await?;
        page.results = clean_results(page.results, Utc::now().date_naive());
        Ok(page)
    }

    /// Shows and movies of one genre fetched together and ordered by
    /// popularity.
    pub async fn merged_by_genre(&self, genre: u32, page: u32) -> Result<Page<MediaItem>, CatalogError> {
        let (tv, movies) = futures_util::try_join!(
            self.discover_by_genre(MediaType::Tv, genre, page),
            self.discover_by_genre(MediaType::Movie, genre, page),
        )?;

        Ok(Page {
            page: page.max(1),
            total_pages: crate::paging::capped_total_pages(tv.total_pages.max(movies.total_pages)),
            total_results: tv.total_results + movies.total_results,
            results: merge_by_popularity(tv.results, movies.results, Some(genre)),
        })
    }
}

/// Popular movies as a page source for `collect_page`.
pub struct PopularMovies<'a>(pub &'a TmdbClient);

impl PageSource for PopularMovies<'_> {
    async fn fetch_page(&self, page: u32) -> Result<Page<MediaItem>, CatalogError> {
        self.0.popular(MediaType::Movie, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = TmdbClient::new("https://api.example.org/3/", "key").unwrap();
        assert_eq!(client.base_url, "https://api.example.org/3");
    }

    #[tokio::test]
    async fn configuration_falls_back_when_unreachable() {
        let client = TmdbClient::new("http://127.0.0.1:1", "key").unwrap();
        let config = client.configuration().await;
        assert_eq!(config.images.secure_base_url, "https://image.tmdb.org/t/p/");

        let err = client.popular(MediaType::Movie, 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::Http(_)));
    }
}
