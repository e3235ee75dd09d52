pub mod config;
pub mod error;
pub mod oauth_client;
pub mod session_log;
pub mod session_store;
pub mod spotify_client;
