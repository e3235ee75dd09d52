use crate::domain::models::{Playlist, SpotifyToken, Track};
use crate::infrastructure::config::SpotifyConfig;
use crate::infrastructure::error::AppError;
use crate::infrastructure::oauth_client::{
    CodeExchangeRequest, SPOTIFY_TOKEN_ENDPOINT, SpotifyAuthClient,
};
use crate::infrastructure::spotify_client::SpotifyApiClient;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use url::Url;

const SPOTIFY_AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";

/// Scopes requested from Spotify. Playback control is included so a future
/// player surface can reuse the same grant without re-consenting everyone.
pub const SPOTIFY_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "user-read-playback-state",
    "user-modify-playback-state",
    "playlist-read-private",
    "playlist-read-collaborative",
    "streaming",
];

const PLAYLIST_PAGE_LIMIT: u32 = 50;
const CANDIDATE_TRACK_LIMIT: u32 = 10;

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;
type IndexPicker = Arc<dyn Fn(usize) -> usize + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSelection {
    pub track: Track,
    pub playlist: Playlist,
}

/// Talks to Spotify on behalf of a browser session: builds the consent URL,
/// exchanges authorization codes, and wraps the token-gated API calls.
pub struct SpotifySessionService {
    config: SpotifyConfig,
    auth_client: Arc<dyn SpotifyAuthClient>,
    api_client: Arc<dyn SpotifyApiClient>,
    now_provider: NowProvider,
    index_picker: IndexPicker,
}

impl SpotifySessionService {
    pub fn new(
        config: SpotifyConfig,
        auth_client: Arc<dyn SpotifyAuthClient>,
        api_client: Arc<dyn SpotifyApiClient>,
    ) -> Self {
        Self {
            config,
            auth_client,
            api_client,
            now_provider: Arc::new(Utc::now),
            index_picker: Arc::new(|upper| rand::thread_rng().gen_range(0..upper)),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn with_index_picker(mut self, index_picker: IndexPicker) -> Self {
        self.index_picker = index_picker;
        self
    }

    fn validate_non_empty(value: &str, field: &str) -> Result<(), AppError> {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
        Ok(())
    }

    pub fn authorization_url(&self, state: &str) -> Result<String, AppError> {
        Self::validate_non_empty(state, "state")?;

        let mut url = Url::parse(SPOTIFY_AUTHORIZE_ENDPOINT)
            .map_err(|error| AppError::Internal(format!("invalid authorize endpoint: {error}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &SPOTIFY_SCOPES.join(" "))
            .append_pair("state", state);
        Ok(url.to_string())
    }

    pub async fn exchange_code(&self, authorization_code: &str) -> Result<SpotifyToken, AppError> {
        Self::validate_non_empty(authorization_code, "authorization code")?;

        let response = self
            .auth_client
            .exchange_authorization_code(CodeExchangeRequest {
                token_endpoint: SPOTIFY_TOKEN_ENDPOINT.to_string(),
                client_id: self.config.client_id.clone(),
                client_secret: self.config.client_secret.clone(),
                redirect_uri: self.config.redirect_uri.clone(),
                authorization_code: authorization_code.to_string(),
            })
            .await?;

        let now = (self.now_provider)();
        Ok(SpotifyToken {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: now + Duration::seconds(response.expires_in),
        })
    }

    fn require_fresh<'t>(&self, token: &'t SpotifyToken) -> Result<&'t str, AppError> {
        let now = (self.now_provider)();
        if !token.is_valid_at(now) {
            return Err(AppError::TokenExpired);
        }
        Ok(&token.access_token)
    }

    pub async fn list_playlists(&self, token: &SpotifyToken) -> Result<Vec<Playlist>, AppError> {
        let access_token = self.require_fresh(token)?;
        self.api_client
            .list_playlists(access_token, PLAYLIST_PAGE_LIMIT)
            .await
    }

    pub async fn currently_playing(&self, token: &SpotifyToken) -> Result<Option<Track>, AppError> {
        let access_token = self.require_fresh(token)?;
        self.api_client.currently_playing(access_token).await
    }

    /// Picks a candidate track from the head of a playlist. No playback
    /// command is sent; the caller surfaces the pick to the client.
    pub async fn play_from_playlist(
        &self,
        token: &SpotifyToken,
        playlist_id: &str,
    ) -> Result<PlaybackSelection, AppError> {
        let access_token = self.require_fresh(token)?;
        Self::validate_non_empty(playlist_id, "playlist id")?;

        let tracks = self
            .api_client
            .playlist_tracks(access_token, playlist_id, CANDIDATE_TRACK_LIMIT)
            .await?;
        if tracks.is_empty() {
            return Err(AppError::NotFound(format!(
                "no playable tracks in playlist {playlist_id}"
            )));
        }

        let upper = tracks.len().min(CANDIDATE_TRACK_LIMIT as usize);
        let index = (self.index_picker)(upper).min(upper - 1);
        let track = tracks[index].clone();

        let playlist = self.api_client.get_playlist(access_token, playlist_id).await?;
        tracing::info!(
            playlist = %playlist.name,
            track = %track.name,
            "selected candidate track"
        );
        Ok(PlaybackSelection { track, playlist })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::oauth_client::TokenExchangeResponse;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn sample_config() -> SpotifyConfig {
        SpotifyConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://127.0.0.1:5000/api/spotify/callback".to_string(),
        }
    }

    fn sample_track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Track {id}"),
            artists: vec!["Artist".to_string()],
            album_art: "https://example.com/art.jpg".to_string(),
            uri: format!("spotify:track:{id}"),
        }
    }

    fn valid_token() -> SpotifyToken {
        SpotifyToken {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: fixed_time("2026-02-16T10:00:00Z"),
        }
    }

    #[derive(Default)]
    struct FakeAuthClient {
        response: Mutex<Option<Result<TokenExchangeResponse, String>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpotifyAuthClient for FakeAuthClient {
        async fn exchange_authorization_code(
            &self,
            _request: CodeExchangeRequest,
        ) -> Result<TokenExchangeResponse, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self
                .response
                .lock()
                .expect("fake lock")
                .take()
                .expect("fake response configured");
            response.map_err(AppError::AuthExchange)
        }
    }

    #[derive(Default)]
    struct FakeApiClient {
        playlists: Vec<Playlist>,
        tracks: Vec<Track>,
        playing: Option<Track>,
    }

    #[async_trait]
    impl SpotifyApiClient for FakeApiClient {
        async fn list_playlists(
            &self,
            _access_token: &str,
            _limit: u32,
        ) -> Result<Vec<Playlist>, AppError> {
            Ok(self.playlists.clone())
        }

        async fn currently_playing(&self, _access_token: &str) -> Result<Option<Track>, AppError> {
            Ok(self.playing.clone())
        }

        async fn playlist_tracks(
            &self,
            _access_token: &str,
            _playlist_id: &str,
            limit: u32,
        ) -> Result<Vec<Track>, AppError> {
            Ok(self.tracks.iter().take(limit as usize).cloned().collect())
        }

        async fn get_playlist(
            &self,
            _access_token: &str,
            playlist_id: &str,
        ) -> Result<Playlist, AppError> {
            Ok(Playlist {
                id: playlist_id.to_string(),
                name: "Study Beats".to_string(),
            })
        }
    }

    fn service_with(api: FakeApiClient) -> SpotifySessionService {
        let now = fixed_time("2026-02-16T09:00:00Z");
        SpotifySessionService::new(
            sample_config(),
            Arc::new(FakeAuthClient::default()),
            Arc::new(api),
        )
        .with_now_provider(Arc::new(move || now))
    }

    #[test]
    fn authorization_url_carries_all_oauth_parameters() {
        let service = service_with(FakeApiClient::default());
        let url = service.authorization_url("opaque-state").expect("url");
        let parsed = Url::parse(&url).expect("parse url");

        assert_eq!(parsed.host_str(), Some("accounts.spotify.com"));
        assert_eq!(parsed.path(), "/authorize");

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(pairs.contains(&("client_id".to_string(), "client-id".to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("state".to_string(), "opaque-state".to_string())));

        let scope = pairs
            .iter()
            .find(|(k, _)| k == "scope")
            .map(|(_, v)| v.clone())
            .expect("scope present");
        for required in SPOTIFY_SCOPES {
            assert!(scope.contains(required), "missing scope {required}");
        }
    }

    #[test]
    fn authorization_url_rejects_blank_state() {
        let service = service_with(FakeApiClient::default());
        assert!(matches!(
            service.authorization_url("  "),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn exchange_code_derives_expiry_from_the_clock() {
        let auth = FakeAuthClient::default();
        *auth.response.lock().expect("fake lock") = Some(Ok(TokenExchangeResponse {
            access_token: "fresh-access".to_string(),
            refresh_token: Some("fresh-refresh".to_string()),
            expires_in: 3600,
        }));

        let now = fixed_time("2026-02-16T09:00:00Z");
        let service = SpotifySessionService::new(
            sample_config(),
            Arc::new(auth),
            Arc::new(FakeApiClient::default()),
        )
        .with_now_provider(Arc::new(move || now));

        let token = service.exchange_code("auth-code").await.expect("token");
        assert_eq!(token.access_token, "fresh-access");
        assert_eq!(token.expires_at, fixed_time("2026-02-16T10:00:00Z"));
    }

    #[tokio::test]
    async fn exchange_code_rejects_blank_code_without_calling_upstream() {
        let auth = Arc::new(FakeAuthClient::default());
        let service = SpotifySessionService::new(
            sample_config(),
            auth.clone(),
            Arc::new(FakeApiClient::default()),
        );

        let result = service.exchange_code("   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(auth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_before_any_api_call() {
        let api = FakeApiClient {
            tracks: vec![sample_track("a")],
            ..FakeApiClient::default()
        };
        let service = service_with(api);

        let stale = SpotifyToken {
            expires_at: fixed_time("2026-02-16T08:59:59Z"),
            ..valid_token()
        };
        assert!(matches!(
            service.list_playlists(&stale).await,
            Err(AppError::TokenExpired)
        ));
        assert!(matches!(
            service.currently_playing(&stale).await,
            Err(AppError::TokenExpired)
        ));
        assert!(matches!(
            service.play_from_playlist(&stale, "playlist1").await,
            Err(AppError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn play_from_playlist_picks_via_the_injected_index() {
        let api = FakeApiClient {
            tracks: vec![sample_track("a"), sample_track("b"), sample_track("c")],
            ..FakeApiClient::default()
        };
        let service = service_with(api).with_index_picker(Arc::new(|_| 1));

        let selection = service
            .play_from_playlist(&valid_token(), "playlist1")
            .await
            .expect("selection");
        assert_eq!(selection.track.id, "b");
        assert_eq!(selection.playlist.name, "Study Beats");
    }

    #[tokio::test]
    async fn empty_playlist_is_not_found() {
        let service = service_with(FakeApiClient::default());
        assert!(matches!(
            service.play_from_playlist(&valid_token(), "playlist1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn currently_playing_passes_through_idle_player() {
        let service = service_with(FakeApiClient::default());
        let playing = service
            .currently_playing(&valid_token())
            .await
            .expect("playing");
        assert_eq!(playing, None);
    }

    // A token whose expiry is not strictly after the clock is always
    // rejected; one strictly after is always accepted.
    proptest! {
        #[test]
        fn token_freshness_matches_expiry_ordering(offset_seconds in -86_400i64..86_400) {
            let now = fixed_time("2026-02-16T09:00:00Z");
            let token = SpotifyToken {
                access_token: "access".to_string(),
                refresh_token: None,
                expires_at: now + Duration::seconds(offset_seconds),
            };
            prop_assert_eq!(token.is_valid_at(now), offset_seconds > 0);
        }
    }
}
