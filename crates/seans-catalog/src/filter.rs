use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::ITEMS_PER_PAGE;
use crate::models::{MediaItem, MediaType};

/// Drops adult titles and unrated titles, except unrated ones that premiere
/// after `today`.
pub fn clean_results(items: Vec<MediaItem>, today: NaiveDate) -> Vec<MediaItem> {
    items
        .into_iter()
        .filter(|item| {
            if item.adult {
                return false;
            }
            item.has_rating() || item.premiere().is_some_and(|date| date > today)
        })
        .collect()
}

/// Keeps items tagged with `genre` (all items when `None`), at most one
/// explore page worth.
pub fn filter_by_genre(items: Vec<MediaItem>, genre: Option<u32>) -> Vec<MediaItem> {
    items
        .into_iter()
        .filter(|item| genre.is_none_or(|id| item.genre_ids.contains(&id)))
        .take(ITEMS_PER_PAGE)
        .collect()
}

pub fn sort_by_popularity(items: &mut [MediaItem]) {
    items.sort_by(|a, b| b.popularity().total_cmp(&a.popularity()));
}

/// Soonest premiere first, undated titles last, ties broken by popularity.
pub fn sort_upcoming(items: &mut [MediaItem]) {
    items.sort_by(|a, b| match (a.premiere(), b.premiere()) {
        (Some(da), Some(db)) if da != db => da.cmp(&db),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        _ => b.popularity().total_cmp(&a.popularity()),
    });
}

/// Keeps only titles premiering on or after `today`.
pub fn future_only(items: Vec<MediaItem>, today: NaiveDate) -> Vec<MediaItem> {
    items
        .into_iter()
        .filter(|item| item.premiere().is_some_and(|date| date >= today))
        .collect()
}

/// Tags both lists with their media type, keeps `genre`, and orders the
/// union by popularity.
pub fn merge_by_popularity(
    tv: Vec<MediaItem>,
    movies: Vec<MediaItem>,
    genre: Option<u32>,
) -> Vec<MediaItem> {
    let tagged = tag(tv, MediaType::Tv).chain(tag(movies, MediaType::Movie)).collect();
    let mut merged = filter_by_genre(tagged, genre);
    sort_by_popularity(&mut merged);
    merged
}

fn tag(items: Vec<MediaItem>, media_type: MediaType) -> impl Iterator<Item = MediaItem> {
    items.into_iter().map(move |mut item| {
        item.media_type = Some(media_type);
        item
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64) -> MediaItem {
        MediaItem {
            id,
            vote_average: Some(7.0),
            vote_count: Some(100),
            ..Default::default()
        }
    }

    fn ids(items: &[MediaItem]) -> Vec<u64> {
        items.iter().map(|i| i.id).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn clean_drops_adult_and_past_unrated() {
        let adult = MediaItem { adult: true, ..item(1) };
        let rated = item(2);
        let unrated_future = MediaItem {
            vote_average: Some(0.0),
            release_date: Some("2026-12-01".into()),
            ..item(3)
        };
        let unrated_today = MediaItem {
            vote_average: None,
            first_air_date: Some("2026-10-18".into()),
            ..item(4)
        };
        let unrated_undated = MediaItem { vote_average: None, ..item(5) };

        let kept = clean_results(
            vec![adult, rated, unrated_future, unrated_today, unrated_undated],
            today(),
        );
        assert_eq!(ids(&kept), [2, 3]);
    }

    #[test]
    fn genre_filter_caps_page_size() {
        let items: Vec<_> = (0..30)
            .map(|id| MediaItem {
                genre_ids: if id % 2 == 0 { vec![16] } else { vec![28] },
                ..item(id)
            })
            .collect();

        assert_eq!(filter_by_genre(items.clone(), None).len(), 20);
        let animated = filter_by_genre(items, Some(16));
        assert_eq!(animated.len(), 15);
        assert!(animated.iter().all(|i| i.genre_ids.contains(&16)));
    }

    #[test]
    fn upcoming_order() {
        let mut items = vec![
            MediaItem { release_date: None, popularity: Some(99.0), ..item(1) },
            MediaItem { release_date: Some("2026-11-02".into()), ..item(2) },
            MediaItem { release_date: Some("2026-11-01".into()), popularity: Some(1.0), ..item(3) },
            MediaItem { release_date: Some("2026-11-01".into()), popularity: Some(5.0), ..item(4) },
        ];
        sort_upcoming(&mut items);
        assert_eq!(ids(&items), [4, 3, 2, 1]);

        let future = future_only(items, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        assert_eq!(ids(&future), [2]);
    }

    #[test]
    fn merge_tags_and_sorts() {
        let tv = vec![MediaItem { popularity: Some(3.0), genre_ids: vec![16], ..item(1) }];
        let movies = vec![
            MediaItem { popularity: Some(10.0), genre_ids: vec![16], ..item(2) },
            MediaItem { popularity: Some(50.0), genre_ids: vec![35], ..item(3) },
        ];

        let merged = merge_by_popularity(tv, movies, Some(16));
        assert_eq!(ids(&merged), [2, 1]);
        assert_eq!(merged[0].media_type, Some(MediaType::Movie));
        assert_eq!(merged[1].media_type, Some(MediaType::Tv));
    }
}
