pub mod settings;
pub mod spotify;
pub mod timer;

use crate::application::engine::TimerEngine;
use crate::application::spotify::SpotifySessionService;
use crate::domain::models::SpotifyToken;
use crate::infrastructure::error::AppError;
use crate::infrastructure::session_store::{SESSION_COOKIE, SessionStore};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub engine: TimerEngine,
    pub sessions: Arc<SessionStore>,
    pub spotify: Arc<SpotifySessionService>,
    pub timezone: Tz,
}

impl AppState {
    /// Resolves the caller's Spotify token or fails with the 401 the client
    /// keys its login prompt off.
    fn require_token(&self, session: &SessionId) -> Result<SpotifyToken, AppError> {
        let session_id = session.0.as_deref().ok_or(AppError::Unauthenticated)?;
        self.sessions
            .token(session_id)?
            .ok_or(AppError::Unauthenticated)
    }
}

/// Session id pulled from the request cookie, when present. Missing or
/// malformed cookies are not an error here; token-gated handlers decide.
#[derive(Debug, Clone)]
pub struct SessionId(pub Option<String>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session_id = parts
            .headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|cookies| {
                cookies.split(';').find_map(|pair| {
                    let (name, value) = pair.trim().split_once('=')?;
                    (name == SESSION_COOKIE).then(|| value.to_string())
                })
            })
            .filter(|value| !value.is_empty());
        Ok(Self(session_id))
    }
}

/// JSON body extractor that reports malformed or missing bodies as
/// validation failures, so every client-caused error shares the same 400
/// `{"message"}` shape. Content-Type is not required.
pub struct BodyJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for BodyJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|error| AppError::Validation(format!("unreadable request body: {error}")))?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|error| AppError::Validation(format!("invalid request body: {error}")))?;
        Ok(Self(value))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Not authenticated with Spotify".to_string(),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "Spotify session expired".to_string(),
            ),
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::AuthExchange(ref detail) => {
                tracing::error!("authorization exchange failed: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to authenticate with Spotify".to_string(),
                )
            }
            AppError::Upstream(ref detail) => {
                tracing::error!("spotify upstream failure: {detail}");
                (StatusCode::BAD_GATEWAY, "Spotify request failed".to_string())
            }
            AppError::Internal(ref detail) => {
                tracing::error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Io(ref error) => {
                tracing::error!("io error: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Json(ref error) => {
                tracing::error!("json error: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/spotify/status", get(spotify::status))
        .route("/api/spotify/auth-url", get(spotify::auth_url))
        .route("/api/spotify/callback", get(spotify::callback))
        .route("/api/spotify/playlists", get(spotify::playlists))
        .route(
            "/api/spotify/currently-playing",
            get(spotify::currently_playing),
        )
        .route("/api/spotify/play", post(spotify::play))
        .route("/api/spotify/disconnect", post(spotify::disconnect))
        .route("/api/timer", get(timer::snapshot))
        .route("/api/timer/start", post(timer::start))
        .route("/api/timer/pause", post(timer::pause))
        .route("/api/timer/reset", post(timer::reset))
        .route("/api/timer/skip", post(timer::skip))
        .route(
            "/api/sessions",
            get(timer::sessions).delete(timer::clear_sessions),
        )
        .route("/api/reports", get(timer::reports))
        .route("/api/reports/:date/sessions", get(timer::report_sessions))
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
