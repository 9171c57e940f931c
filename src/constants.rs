//! Application constants

/// Plex library section holding movies
pub const MOVIES_SECTION: &str = "Movies";

/// Plex library section holding TV shows
pub const TV_SHOWS_SECTION: &str = "TV Shows";

/// Number of entries kept in the playtime trends tally
pub const WATCH_TALLY_LIMIT: usize = 20;

/// Session lifetime in hours (JWT `exp` and cookie max-age)
pub const SESSION_EXPIRY_HOURS: i64 = 24;

/// Default timeout for calls against a user's media server
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Attribution for episodes whose parent show cannot be resolved
pub const UNKNOWN_SHOW_TITLE: &str = "N/A Show Title";

pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_PLAYER: &str = "Unknown Player";
pub const UNKNOWN_CONTENT: &str = "Unknown Content";

/// Placeholder for absent session attributes and undefined progress
pub const NOT_APPLICABLE: &str = "N/A";
