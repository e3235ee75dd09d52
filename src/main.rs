use std::sync::Arc;

use studybeats::application::engine::TimerEngine;
use studybeats::application::recorder::SessionRecorder;
use studybeats::application::spotify::SpotifySessionService;
use studybeats::domain::models::TimerSettings;
use studybeats::http::{AppState, router};
use studybeats::infrastructure::config::ServerConfig;
use studybeats::infrastructure::oauth_client::ReqwestSpotifyAuthClient;
use studybeats::infrastructure::session_log::JsonFileSessionLog;
use studybeats::infrastructure::session_store::SessionStore;
use studybeats::infrastructure::spotify_client::ReqwestSpotifyApiClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studybeats=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let session_log = Arc::new(JsonFileSessionLog::new(&config.session_log_path));
    let recorder = Arc::new(SessionRecorder::new(session_log));
    let defaults = TimerSettings::default();
    let engine = TimerEngine::new(defaults.study_duration, defaults.break_duration, recorder);

    let spotify = Arc::new(SpotifySessionService::new(
        config.spotify.clone(),
        Arc::new(ReqwestSpotifyAuthClient::new()),
        Arc::new(ReqwestSpotifyApiClient::new()),
    ));

    let state = AppState {
        engine,
        sessions: Arc::new(SessionStore::new()),
        spotify,
        timezone: config.timezone,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
