use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated with Spotify")]
    Unauthenticated,
    #[error("Spotify token expired; re-authentication required")]
    TokenExpired,
    #[error("Spotify authorization failed: {0}")]
    AuthExchange(String),
    #[error("Spotify request failed: {0}")]
    Upstream(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
