use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

/// One entry of a list endpoint. Movies carry `title`/`release_date`,
/// TV shows `name`/`first_air_date`; everything is optional upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

impl MediaItem {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    pub fn popularity(&self) -> f64 {
        self.popularity.unwrap_or(0.0)
    }

    /// Release date for movies, first air date for shows. Empty and
    /// malformed strings count as no date.
    pub fn premiere(&self) -> Option<NaiveDate> {
        fn non_empty(date: &Option<String>) -> Option<&str> {
            date.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }

        non_empty(&self.release_date)
            .or_else(|| non_empty(&self.first_air_date))
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    pub fn has_rating(&self) -> bool {
        self.vote_average.is_some_and(|avg| avg > 0.0) && self.vote_count.is_none_or(|n| n > 0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfiguration {
    pub images: ImagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default)]
    pub base_url: String,
    pub secure_base_url: String,
    #[serde(default)]
    pub backdrop_sizes: Vec<String>,
    #[serde(default)]
    pub poster_sizes: Vec<String>,
    #[serde(default)]
    pub profile_sizes: Vec<String>,
}

impl ApiConfiguration {
    /// Static configuration served when the upstream call fails.
    pub fn fallback() -> Self {
        fn sizes(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        Self {
            images: ImagesConfig {
                base_url: "http://image.tmdb.org/t/p/".into(),
                secure_base_url: "https://image.tmdb.org/t/p/".into(),
                backdrop_sizes: sizes(&["w300", "w780", "w1280", "original"]),
                poster_sizes: sizes(&["w92", "w154", "w185", "w342", "w500", "w780", "original"]),
                profile_sizes: sizes(&["w45", "w185", "h632", "original"]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sparse_upstream_items() {
        let item: MediaItem = serde_json::from_str(
            r#"{"id": 7, "name": "Show", "first_air_date": "", "vote_average": 7.5, "genre_ids": [18]}"#,
        )
        .unwrap();
        assert_eq!(item.display_title(), "Show");
        assert!(item.premiere().is_none());
        assert!(item.has_rating());
        assert!(!item.adult);
    }

    #[test]
    fn premiere_skips_blank_release_date() {
        let item = MediaItem {
            release_date: Some("  ".into()),
            first_air_date: Some(" 2021-03-04 ".into()),
            ..Default::default()
        };
        assert_eq!(item.premiere(), NaiveDate::from_ymd_opt(2021, 3, 4));
    }

    #[test]
    fn rating_needs_votes_when_count_is_known() {
        let item = MediaItem {
            vote_average: Some(6.0),
            vote_count: Some(0),
            ..Default::default()
        };
        assert!(!item.has_rating());
    }
}
