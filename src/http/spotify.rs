use crate::http::{AppState, BodyJson, SessionId};
use crate::infrastructure::error::AppError;
use crate::infrastructure::session_store::SESSION_COOKIE;
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse},
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use serde_json::{Value, json};

const OAUTH_STATE_LENGTH: usize = 16;
const SESSION_COOKIE_MAX_AGE_SECONDS: u64 = 7 * 24 * 60 * 60;

pub async fn status(State(state): State<AppState>, session: SessionId) -> Json<Value> {
    let connected = state.require_token(&session).is_ok();
    Json(json!({ "connected": connected }))
}

pub async fn auth_url(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let oauth_state: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OAUTH_STATE_LENGTH)
        .map(char::from)
        .collect();
    let url = state.spotify.authorization_url(&oauth_state)?;
    Ok(Json(json!({ "url": url })))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    #[allow(dead_code)]
    state: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    session: SessionId,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let code = query
        .code
        .as_deref()
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| AppError::Validation("missing authorization code".to_string()))?;

    let token = state.spotify.exchange_code(code).await?;
    let session_id = state.sessions.store_token(session.0.as_deref(), token)?;
    tracing::info!("spotify authorization completed");

    let cookie = format!(
        "{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; Max-Age={SESSION_COOKIE_MAX_AGE_SECONDS}"
    );
    // Plain 302 back to the app root with the session cookie attached.
    Ok((
        StatusCode::FOUND,
        AppendHeaders([
            (header::SET_COOKIE, cookie),
            (header::LOCATION, "/".to_string()),
        ]),
    ))
}

pub async fn playlists(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<Value>, AppError> {
    let token = state.require_token(&session)?;
    let playlists = state.spotify.list_playlists(&token).await?;
    Ok(Json(json!({ "playlists": playlists })))
}

pub async fn currently_playing(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<Value>, AppError> {
    let token = state.require_token(&session)?;
    let track = state.spotify.currently_playing(&token).await?;
    Ok(Json(json!({ "track": track })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    playlist_id: String,
}

pub async fn play(
    State(state): State<AppState>,
    session: SessionId,
    BodyJson(request): BodyJson<PlayRequest>,
) -> Result<Json<Value>, AppError> {
    let token = state.require_token(&session)?;
    let selection = state
        .spotify
        .play_from_playlist(&token, &request.playlist_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "track": selection.track,
        "playlist": selection.playlist,
    })))
}

/// Forgets the caller's session so the next status poll reports
/// disconnected. Always succeeds, even without a session.
pub async fn disconnect(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<Value>, AppError> {
    if let Some(session_id) = session.0.as_deref() {
        state.sessions.remove(session_id)?;
        tracing::info!("spotify session disconnected");
    }
    Ok(Json(json!({ "success": true })))
}
