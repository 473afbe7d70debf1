use std::collections::HashSet;
use std::future::Future;

use tracing::debug;

use crate::models::{MediaItem, Page};
use crate::{CatalogError, ITEMS_PER_PAGE, MAX_TOTAL_PAGES};

/// Anything that serves numbered pages of catalog items (1-based).
pub trait PageSource {
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<Page<MediaItem>, CatalogError>> + Send;
}

pub struct PagingOptions {
    pub per_page: usize,
    /// How many upstream pages past `target_page` may be read to make up
    /// for filtered-out items.
    pub safety_extra_pages: u32,
    pub filter: Option<fn(&MediaItem) -> bool>,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            per_page: ITEMS_PER_PAGE,
            safety_extra_pages: 6,
            filter: None,
        }
    }
}

/// Upstream total clamped to `1..=MAX_TOTAL_PAGES`.
pub fn capped_total_pages(total: u32) -> u32 {
    total.clamp(1, MAX_TOTAL_PAGES)
}

/// Builds page `target_page` of a filtered, de-duplicated listing.
///
/// Upstream pages are read from the first one until enough distinct,
/// non-adult items passing the filter are collected to fill the requested
/// page, the last upstream page is reached, or the read budget
/// (`target_page + safety_extra_pages`, at most 500) runs out. A short or
/// empty `results` means upstream ran dry.
pub async fn collect_page<S: PageSource>(
    source: &S,
    target_page: u32,
    options: &PagingOptions,
) -> Result<Page<MediaItem>, CatalogError> {
    let target_page = target_page.max(1);
    let required = target_page as usize * options.per_page;
    let max_api_page = MAX_TOTAL_PAGES.min(target_page.saturating_add(options.safety_extra_pages));

    // Grows with what upstream returns; `required` can be far beyond the read budget.
    let mut collected: Vec<MediaItem> = Vec::new();
    let mut seen = HashSet::new();
    let mut api_page = 1;
    let mut total_pages = 1;

    while api_page <= max_api_page && collected.len() < required {
        let page = source.fetch_page(api_page).await?;
        if page.total_pages > 0 {
            total_pages = page.total_pages;
        }

        for item in page.results {
            if item.adult || seen.contains(&item.id) {
                continue;
            }
            if options.filter.is_some_and(|keep| !keep(&item)) {
                continue;
            }
            seen.insert(item.id);
            collected.push(item);
            if collected.len() >= required {
                break;
            }
        }

        api_page += 1;
        if api_page > total_pages {
            break;
        }
    }

    debug!(
        "Collected {} items from {} upstream pages for page {}",
        collected.len(),
        api_page - 1,
        target_page
    );

    let start = (target_page as usize - 1) * options.per_page;
    let results = collected
        .into_iter()
        .skip(start)
        .take(options.per_page)
        .collect();

    Ok(Page {
        page: target_page,
        results,
        total_pages: capped_total_pages(total_pages),
        total_results: 0,
    })
}
