use crate::infrastructure::error::AppError;
use crate::infrastructure::session_log::SESSION_LOG_FILE;
use chrono_tz::Tz;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5000/api/spotify/callback";

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub spotify: SpotifyConfig,
    pub timezone: Tz,
    pub session_log_path: PathBuf,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::load_from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through a key lookup so tests can supply their
    /// own environment. `STUDYBEATS_`-prefixed keys win over the bare
    /// Spotify names.
    pub fn load_from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let get_either = |preferred: &str, fallback: &str| get(preferred).or_else(|| get(fallback));

        let client_id = get_either("STUDYBEATS_SPOTIFY_CLIENT_ID", "SPOTIFY_CLIENT_ID")
            .ok_or_else(|| AppError::Internal("SPOTIFY_CLIENT_ID is not set".to_string()))?;
        let client_secret = get_either("STUDYBEATS_SPOTIFY_CLIENT_SECRET", "SPOTIFY_CLIENT_SECRET")
            .ok_or_else(|| AppError::Internal("SPOTIFY_CLIENT_SECRET is not set".to_string()))?;
        let redirect_uri = get_either("STUDYBEATS_SPOTIFY_REDIRECT_URI", "SPOTIFY_REDIRECT_URI")
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

        let host = get("STUDYBEATS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("STUDYBEATS_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Internal(format!("invalid STUDYBEATS_PORT: {raw}")))?,
            None => DEFAULT_PORT,
        };

        let timezone = match get("STUDYBEATS_TIMEZONE") {
            Some(raw) => raw
                .parse::<Tz>()
                .map_err(|_| AppError::Internal(format!("invalid STUDYBEATS_TIMEZONE: {raw}")))?,
            None => chrono_tz::UTC,
        };

        let session_log_path = get("STUDYBEATS_SESSION_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SESSION_LOG_FILE));

        Ok(Self {
            host,
            port,
            spotify: SpotifyConfig {
                client_id,
                client_secret,
                redirect_uri,
            },
            timezone,
            session_log_path,
        })
    }
}
