//! Catalog side of the app: the metadata API's data model and the helpers
//! that clean, page and merge its results.

pub mod client;
pub mod filter;
pub mod images;
pub mod models;
pub mod paging;
pub mod providers;

use thiserror::Error;

pub use client::{PopularMovies, TmdbClient};
pub use models::{ApiConfiguration, Genre, ImagesConfig, MediaItem, MediaType, Page};
pub use paging::{PageSource, PagingOptions, collect_page};

/// Upstream never serves pages past this one.
pub const MAX_TOTAL_PAGES: u32 = 500;

/// Items per explore page.
pub const ITEMS_PER_PAGE: usize = 20;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned status {status}: {message}")]
    Status { status: u16, message: String },
}
