//! Request-scoped shaping of library data: tallies, filters, sorting and
//! playback progress.
//!
//! Everything in here is a single synchronous pass over collections the
//! route handlers already fetched from the media server. Nothing does I/O.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::constants::{
    NOT_APPLICABLE, UNKNOWN_CONTENT, UNKNOWN_PLAYER, UNKNOWN_SHOW_TITLE, UNKNOWN_USER,
    WATCH_TALLY_LIMIT,
};
use crate::models::{
    FilterOptions, GenreCount, MediaItem, MediaKind, PlaybackSession, SessionView, WatchCount,
};

pub fn count<T>(items: &[T]) -> usize {
    items.len()
}

/// Count genre occurrences across items, most frequent first.
///
/// Ties keep the order in which genres were first seen.
pub fn genre_tally(items: &[MediaItem]) -> Vec<GenreCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tally: Vec<GenreCount> = Vec::new();

    for genre in items.iter().flat_map(|item| item.genres.iter()) {
        match index.get(genre.as_str()) {
            Some(&i) => tally[i].count += 1,
            None => {
                index.insert(genre.as_str(), tally.len());
                tally.push(GenreCount {
                    genre: genre.clone(),
                    count: 1,
                });
            }
        }
    }

    tally.sort_by(|a, b| b.count.cmp(&a.count));
    tally
}

/// Optional predicates for the content listing. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub genre: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
}

impl ContentFilter {
    pub fn new(genre: Option<String>, year: Option<String>, rating: Option<String>) -> Self {
        Self {
            genre: non_empty(genre),
            year: non_empty(year),
            rating: non_empty(rating),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genre.is_none() && self.year.is_none() && self.rating.is_none()
    }

    /// An item missing the attribute an active predicate looks at never matches.
    pub fn matches(&self, item: &MediaItem) -> bool {
        if let Some(genre) = &self.genre {
            if !item.genres.iter().any(|g| g == genre) {
                return false;
            }
        }

        if let Some(year) = &self.year {
            match item.year {
                Some(y) if y.to_string() == *year => {}
                _ => return false,
            }
        }

        if let Some(rating) = &self.rating {
            if item.content_rating.as_deref() != Some(rating.as_str()) {
                return false;
            }
        }

        true
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn filter_items(items: Vec<MediaItem>, filter: &ContentFilter) -> Vec<MediaItem> {
    if filter.is_empty() {
        return items;
    }
    items.into_iter().filter(|item| filter.matches(item)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Year,
    ContentRating,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(SortKey::Title),
            "year" => Some(SortKey::Year),
            "content_rating" => Some(SortKey::ContentRating),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Year => "year",
            SortKey::ContentRating => "content_rating",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything but `desc` sorts ascending.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Stable sort on a single key. Missing values order below every present one.
pub fn sort_items(items: &mut [MediaItem], key: SortKey, order: SortOrder) {
    items.sort_by(|a, b| {
        let ord = compare_by(a, b, key);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

fn compare_by(a: &MediaItem, b: &MediaItem, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => a.title.as_deref().cmp(&b.title.as_deref()),
        SortKey::Year => a.year.cmp(&b.year),
        SortKey::ContentRating => a.content_rating.as_deref().cmp(&b.content_rating.as_deref()),
    }
}

/// Case-insensitive title order used for search results
pub fn sort_by_title_ci(items: &mut [MediaItem]) {
    items.sort_by_cached_key(|item| item.title.as_deref().unwrap_or_default().to_lowercase());
}

pub fn filter_options(items: &[MediaItem]) -> FilterOptions {
    let genres: BTreeSet<&str> = items
        .iter()
        .flat_map(|item| item.genres.iter().map(String::as_str))
        .collect();
    let years: BTreeSet<i32> = items.iter().filter_map(|item| item.year).collect();
    let ratings: BTreeSet<&str> = items
        .iter()
        .filter_map(|item| item.content_rating.as_deref())
        .filter(|r| !r.is_empty())
        .collect();

    FilterOptions {
        genres: genres.into_iter().map(str::to_string).collect(),
        years: years.into_iter().collect(),
        ratings: ratings.into_iter().map(str::to_string).collect(),
    }
}

/// Sum view counts per title, collapsing episodes into their parent show.
///
/// Only titled items with a positive view count contribute. The result is
/// cut to the top [`WATCH_TALLY_LIMIT`] entries once every count is summed.
pub fn watch_tally(items: &[MediaItem]) -> Vec<WatchCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut tally: Vec<WatchCount> = Vec::new();

    for item in items {
        let Some(title) = item.title.as_deref() else {
            continue;
        };
        let views = match item.view_count {
            Some(n) if n > 0 => n,
            _ => continue,
        };

        let show = if item.kind == MediaKind::Episode {
            item.show_title.as_deref().unwrap_or(UNKNOWN_SHOW_TITLE)
        } else {
            title
        };

        match index.get(show) {
            Some(&i) => tally[i].watch_count += views,
            None => {
                index.insert(show.to_string(), tally.len());
                tally.push(WatchCount {
                    show: show.to_string(),
                    watch_count: views,
                });
            }
        }
    }

    tally.sort_by(|a, b| b.watch_count.cmp(&a.watch_count));
    tally.truncate(WATCH_TALLY_LIMIT);
    tally
}

/// Percentage watched, or `None` when the duration is unknown or zero.
pub fn playback_progress(session: &PlaybackSession) -> Option<f64> {
    let elapsed = session.view_offset_ms.unwrap_or(0) as f64 / 1000.0;
    let duration = session.duration_ms.unwrap_or(0) as f64 / 1000.0;

    (duration > 0.0).then(|| elapsed / duration * 100.0)
}

pub fn session_view(session: &PlaybackSession) -> SessionView {
    let progress = match playback_progress(session) {
        Some(percent) => format!("{:.0}%", percent),
        None => NOT_APPLICABLE.to_string(),
    };

    SessionView {
        user: text_or(&session.user, UNKNOWN_USER),
        player: text_or(&session.player, UNKNOWN_PLAYER),
        content: text_or(&session.title, UNKNOWN_CONTENT),
        kind: text_or(&session.kind, NOT_APPLICABLE),
        progress,
        state: text_or(&session.state, NOT_APPLICABLE),
    }
}

fn text_or(value: &Option<String>, fallback: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
