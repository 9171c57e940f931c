pub mod auth;
pub mod cookies;
pub mod db;
pub mod error;
pub mod flash;
pub mod plex;
pub mod session;
