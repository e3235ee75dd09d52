use crate::domain::models::{Playlist, Track};
use crate::infrastructure::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1/";

#[async_trait]
pub trait SpotifyApiClient: Send + Sync {
    async fn list_playlists(&self, access_token: &str, limit: u32)
    -> Result<Vec<Playlist>, AppError>;

    async fn currently_playing(&self, access_token: &str) -> Result<Option<Track>, AppError>;

    async fn playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        limit: u32,
    ) -> Result<Vec<Track>, AppError>;

    async fn get_playlist(&self, access_token: &str, playlist_id: &str)
    -> Result<Playlist, AppError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestSpotifyApiClient {
    client: Client,
}

impl ReqwestSpotifyApiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), AppError> {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn upstream_http_error(status: reqwest::StatusCode, body: &str) -> AppError {
        let message = if body.trim().is_empty() {
            format!("spotify api error: http {}", status.as_u16())
        } else {
            format!("spotify api error: http {}; body={body}", status.as_u16())
        };
        AppError::Upstream(message)
    }

    fn endpoint(segments: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(SPOTIFY_API_BASE)
            .map_err(|error| AppError::Internal(format!("invalid spotify api base url: {error}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::Internal("spotify api base URL cannot be a base".to_string()))?;
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_body(
        &self,
        url: Url,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<(reqwest::StatusCode, String), AppError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| AppError::Upstream(format!("network error: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| AppError::Upstream(format!("failed reading spotify response: {error}")))?;
        Ok((status, body))
    }
}

#[derive(Debug, serde::Deserialize)]
struct PlaylistPagePayload {
    items: Option<Vec<PlaylistItemPayload>>,
}

#[derive(Debug, serde::Deserialize)]
struct PlaylistItemPayload {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CurrentlyPlayingPayload {
    item: Option<TrackPayload>,
}

#[derive(Debug, serde::Deserialize)]
struct PlaylistTracksPayload {
    items: Option<Vec<PlaylistTrackEntryPayload>>,
}

#[derive(Debug, serde::Deserialize)]
struct PlaylistTrackEntryPayload {
    track: Option<TrackPayload>,
}

#[derive(Debug, serde::Deserialize)]
struct TrackPayload {
    id: Option<String>,
    name: Option<String>,
    uri: Option<String>,
    artists: Option<Vec<ArtistPayload>>,
    album: Option<AlbumPayload>,
}

#[derive(Debug, serde::Deserialize)]
struct ArtistPayload {
    name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct AlbumPayload {
    images: Option<Vec<ImagePayload>>,
}

#[derive(Debug, serde::Deserialize)]
struct ImagePayload {
    url: Option<String>,
}

impl TrackPayload {
    // Local tracks and removed episodes come back without an id; skip those.
    fn into_track(self) -> Option<Track> {
        let id = self.id.filter(|value| !value.trim().is_empty())?;
        let album_art = self
            .album
            .and_then(|album| album.images)
            .and_then(|images| images.into_iter().next())
            .and_then(|image| image.url)
            .unwrap_or_default();
        Some(Track {
            name: self.name.unwrap_or_else(|| id.clone()),
            uri: self.uri.unwrap_or_else(|| format!("spotify:track:{id}")),
            artists: self
                .artists
                .unwrap_or_default()
                .into_iter()
                .filter_map(|artist| artist.name)
                .collect(),
            album_art,
            id,
        })
    }
}

#[async_trait]
impl SpotifyApiClient for ReqwestSpotifyApiClient {
    async fn list_playlists(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<Playlist>, AppError> {
        Self::ensure_non_empty(access_token, "access token")?;

        let url = Self::endpoint(&["me", "playlists"])?;
        let (status, body) = self
            .get_body(url, access_token, &[("limit", limit.to_string())])
            .await?;
        if !status.is_success() {
            return Err(Self::upstream_http_error(status, &body));
        }

        let parsed: PlaylistPagePayload = serde_json::from_str(&body).map_err(|error| {
            AppError::Upstream(format!("invalid playlist payload: {error}; body={body}"))
        })?;

        Ok(parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let id = item.id.filter(|value| !value.trim().is_empty())?;
                Some(Playlist {
                    name: item.name.unwrap_or_else(|| id.clone()),
                    id,
                })
            })
            .collect())
    }

    async fn currently_playing(&self, access_token: &str) -> Result<Option<Track>, AppError> {
        Self::ensure_non_empty(access_token, "access token")?;

        let url = Self::endpoint(&["me", "player", "currently-playing"])?;
        let (status, body) = self.get_body(url, access_token, &[]).await?;

        // Spotify reports an idle player as 204 with an empty body.
        if status == reqwest::StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::upstream_http_error(status, &body));
        }

        let parsed: CurrentlyPlayingPayload = serde_json::from_str(&body).map_err(|error| {
            AppError::Upstream(format!("invalid playback payload: {error}; body={body}"))
        })?;
        Ok(parsed.item.and_then(TrackPayload::into_track))
    }

    async fn playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        limit: u32,
    ) -> Result<Vec<Track>, AppError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(playlist_id, "playlist id")?;

        let url = Self::endpoint(&["playlists", playlist_id, "tracks"])?;
        let (status, body) = self
            .get_body(url, access_token, &[("limit", limit.to_string())])
            .await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("playlist {playlist_id}")));
        }
        if !status.is_success() {
            return Err(Self::upstream_http_error(status, &body));
        }

        let parsed: PlaylistTracksPayload = serde_json::from_str(&body).map_err(|error| {
            AppError::Upstream(format!("invalid playlist tracks payload: {error}; body={body}"))
        })?;

        Ok(parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.track.and_then(TrackPayload::into_track))
            .collect())
    }

    async fn get_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<Playlist, AppError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(playlist_id, "playlist id")?;

        let url = Self::endpoint(&["playlists", playlist_id])?;
        let (status, body) = self.get_body(url, access_token, &[]).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("playlist {playlist_id}")));
        }
        if !status.is_success() {
            return Err(Self::upstream_http_error(status, &body));
        }

        let parsed: PlaylistItemPayload = serde_json::from_str(&body).map_err(|error| {
            AppError::Upstream(format!("invalid playlist payload: {error}; body={body}"))
        })?;

        let id = parsed
            .id
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| playlist_id.to_string());
        Ok(Playlist {
            name: parsed.name.unwrap_or_else(|| id.clone()),
            id,
        })
    }
}
