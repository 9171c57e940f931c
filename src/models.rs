//! Shared data models used across modules
//!
//! Everything here is request-scoped: built from media server responses,
//! shaped by [`crate::aggregate`], rendered, then dropped.

use serde::{Deserialize, Serialize};

/// Kind of a library item as reported by the media server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MediaKind {
    Movie,
    Show,
    Season,
    Episode,
    Other,
}

impl From<String> for MediaKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "movie" => MediaKind::Movie,
            "show" => MediaKind::Show,
            "season" => MediaKind::Season,
            "episode" => MediaKind::Episode,
            _ => MediaKind::Other,
        }
    }
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
            MediaKind::Season => "season",
            MediaKind::Episode => "episode",
            MediaKind::Other => "other",
        }
    }
}

/// A movie, show or episode from a library section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub summary: Option<String>,
    pub content_rating: Option<String>,
    pub genres: Vec<String>,
    pub view_count: Option<i64>,
    /// Parent show title, only set on episodes
    pub show_title: Option<String>,
}

impl MediaItem {
    pub fn new(kind: MediaKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: Some(title.into()),
            year: None,
            summary: None,
            content_rating: None,
            genres: Vec::new(),
            view_count: None,
            show_title: None,
        }
    }
}

/// A live playback on the media server. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSession {
    pub user: Option<String>,
    pub player: Option<String>,
    pub title: Option<String>,
    /// Media type exactly as the server reports it ("episode", "track", ...)
    pub kind: Option<String>,
    pub view_offset_ms: Option<i64>,
    pub duration_ms: Option<i64>,
    pub state: Option<String>,
}

/// Now-playing record served to the polling page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub user: String,
    pub player: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub progress: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchCount {
    pub show: String,
    pub watch_count: i64,
}

/// Values offered by the content page filter dropdowns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub genres: Vec<String>,
    pub years: Vec<i32>,
    pub ratings: Vec<String>,
}

/// Headline numbers on the dashboard; each defaults to zero on failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub users: i64,
    pub movies: usize,
    pub tv_shows: usize,
    pub active_sessions: usize,
}
