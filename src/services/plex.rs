//! Plex Media Server client
//!
//! A [`PlexClient`] is built per request from the signed-in user's stored
//! server URL and token (see [`build_client`]). Every fetch is its own
//! fallible call so one failing metric never takes down the rest of a page.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::domain::users::User;
use crate::models::{MediaItem, MediaKind, PlaybackSession};

#[derive(Debug, thiserror::Error)]
pub enum PlexError {
    #[error("Plex credentials not found for your account.")]
    NotConfigured,
    #[error("Plex rejected the access token")]
    Unauthorized,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Plex API error ({status}): {body}")]
    Api { status: StatusCode, body: String },
    #[error("library section '{0}' not found")]
    SectionNotFound(String),
}

#[derive(Clone)]
pub struct PlexClient {
    base_url: String,
    token: String,
    http: Client,
}

impl std::fmt::Debug for PlexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlexClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// A library section as listed by `/library/sections`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibrarySection {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub friendly_name: Option<String>,
    pub version: Option<String>,
}

/// Resolve the endpoint and token for `user` and open a client.
///
/// The user's own values win; the configured defaults only fill in what the
/// user left blank. When either is still missing this returns
/// [`PlexError::NotConfigured`] without touching the network.
pub async fn build_client(
    http: &Client,
    config: &Config,
    user: &User,
) -> Result<PlexClient, PlexError> {
    let base_url = first_non_empty(&user.plex_base_url, &config.default_plex_base_url)
        .ok_or(PlexError::NotConfigured)?;
    let token = first_non_empty(&user.plex_token, &config.default_plex_token)
        .ok_or(PlexError::NotConfigured)?;

    PlexClient::connect(http.clone(), base_url, token).await
}

fn first_non_empty<'a>(own: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    [own, fallback]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .find(|v| !v.is_empty())
}

impl PlexClient {
    /// Client without a connectivity check.
    pub fn new(http: Client, base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        }
    }

    /// Build a client and confirm the server answers with this token.
    pub async fn connect(http: Client, base_url: &str, token: &str) -> Result<Self, PlexError> {
        let client = Self::new(http, base_url, token);
        let info = client.server_info().await?;
        tracing::debug!(
            server = info.friendly_name.as_deref().unwrap_or("unnamed"),
            "connected to Plex server"
        );
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PlexError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .http
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PlexError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlexError::Api { status, body });
        }

        let envelope: Envelope<T> = resp.json().await?;
        Ok(envelope.container)
    }

    pub async fn server_info(&self) -> Result<ServerInfo, PlexError> {
        self.get("/", &[]).await
    }

    pub async fn sections(&self) -> Result<Vec<LibrarySection>, PlexError> {
        let container: DirectoryContainer = self.get("/library/sections", &[]).await?;
        Ok(container.directories)
    }

    /// Look up a section by its display title, e.g. "Movies".
    pub async fn section(&self, title: &str) -> Result<LibrarySection, PlexError> {
        self.sections()
            .await?
            .into_iter()
            .find(|s| s.title == title)
            .ok_or_else(|| PlexError::SectionNotFound(title.to_string()))
    }

    pub async fn section_items(
        &self,
        section: &LibrarySection,
    ) -> Result<Vec<MediaItem>, PlexError> {
        let path = format!("/library/sections/{}/all", section.key);
        let container: MetadataContainer = self.get(&path, &[]).await?;
        Ok(container.metadata.into_iter().map(MediaItem::from).collect())
    }

    /// Items of the section titled `title`
    pub async fn section_items_by_title(&self, title: &str) -> Result<Vec<MediaItem>, PlexError> {
        let section = self.section(title).await?;
        self.section_items(&section).await
    }

    /// Title search within one section.
    pub async fn search_section(
        &self,
        section: &LibrarySection,
        term: &str,
    ) -> Result<Vec<MediaItem>, PlexError> {
        let path = format!("/library/sections/{}/all", section.key);
        let container: MetadataContainer = self.get(&path, &[("title", term)]).await?;
        Ok(container.metadata.into_iter().map(MediaItem::from).collect())
    }

    /// Every item of every movie and show section.
    pub async fn library_items(&self) -> Result<Vec<MediaItem>, PlexError> {
        let mut items = Vec::new();
        for section in self.sections().await? {
            if matches!(section.kind.as_str(), "movie" | "show") {
                items.extend(self.section_items(&section).await?);
            }
        }
        Ok(items)
    }

    pub async fn sessions(&self) -> Result<Vec<PlaybackSession>, PlexError> {
        let container: MetadataContainer = self.get("/status/sessions", &[]).await?;
        Ok(container
            .metadata
            .into_iter()
            .map(PlaybackSession::from)
            .collect())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    container: T,
}

#[derive(Deserialize)]
struct DirectoryContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<LibrarySection>,
}

#[derive(Deserialize)]
struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<Metadata>,
}

#[derive(Deserialize)]
struct Tag {
    tag: String,
}

#[derive(Deserialize)]
struct Titled {
    title: Option<String>,
}

#[derive(Deserialize)]
struct Player {
    title: Option<String>,
    state: Option<String>,
}

/// One `Metadata` entry; library items and sessions share the shape.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    year: Option<i32>,
    summary: Option<String>,
    content_rating: Option<String>,
    #[serde(rename = "Genre", default)]
    genres: Vec<Tag>,
    view_count: Option<i64>,
    grandparent_title: Option<String>,
    view_offset: Option<i64>,
    duration: Option<i64>,
    #[serde(rename = "User")]
    user: Option<Titled>,
    #[serde(rename = "Player")]
    player: Option<Player>,
}

impl From<Metadata> for MediaItem {
    fn from(m: Metadata) -> Self {
        let kind = m.kind.map(MediaKind::from).unwrap_or(MediaKind::Other);
        Self {
            kind,
            title: m.title,
            year: m.year,
            summary: m.summary,
            content_rating: m.content_rating,
            genres: m.genres.into_iter().map(|g| g.tag).collect(),
            view_count: m.view_count,
            show_title: if kind == MediaKind::Episode {
                m.grandparent_title
            } else {
                None
            },
        }
    }
}

impl From<Metadata> for PlaybackSession {
    fn from(m: Metadata) -> Self {
        let (player, state) = match m.player {
            Some(p) => (p.title, p.state),
            None => (None, None),
        };
        Self {
            user: m.user.and_then(|u| u.title),
            player,
            title: m.title,
            kind: m.kind,
            view_offset_ms: m.view_offset,
            duration_ms: m.duration,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_metadata_keeps_show_title() {
        let json = r#"{
            "type": "episode",
            "title": "Pilot",
            "grandparentTitle": "Lost",
            "viewCount": 3,
            "Genre": [{"tag": "Drama"}]
        }"#;
        let item = MediaItem::from(serde_json::from_str::<Metadata>(json).unwrap());

        assert_eq!(item.kind, MediaKind::Episode);
        assert_eq!(item.show_title.as_deref(), Some("Lost"));
        assert_eq!(item.view_count, Some(3));
        assert_eq!(item.genres, vec!["Drama"]);
    }

    #[test]
    fn test_unknown_type_maps_to_other() {
        let json = r#"{"type": "clip", "title": "Trailer"}"#;
        let item = MediaItem::from(serde_json::from_str::<Metadata>(json).unwrap());
        assert_eq!(item.kind, MediaKind::Other);
        assert!(item.genres.is_empty());
    }

    #[test]
    fn test_first_non_empty_prefers_own_value() {
        let own = Some("http://mine".to_string());
        let blank = Some("  ".to_string());
        let fallback = Some("http://default".to_string());

        assert_eq!(first_non_empty(&own, &fallback), Some("http://mine"));
        assert_eq!(first_non_empty(&blank, &fallback), Some("http://default"));
        assert_eq!(first_non_empty(&blank, &None), None);
    }

    #[test]
    fn test_session_keeps_raw_type() {
        let json = r#"{
            "type": "track",
            "title": "Song",
            "User": {"title": "sam"},
            "Player": {"title": "Phone", "state": "playing"}
        }"#;
        let session = PlaybackSession::from(serde_json::from_str::<Metadata>(json).unwrap());

        assert_eq!(session.kind.as_deref(), Some("track"));
        assert_eq!(crate::aggregate::session_view(&session).kind, "track");
    }
}
