use crate::infrastructure::error::AppError;
use async_trait::async_trait;
use reqwest::Client;

pub const SPOTIFY_TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";

#[derive(Debug, Clone)]
pub struct CodeExchangeRequest {
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorization_code: String,
}

#[derive(Debug, Clone)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[async_trait]
pub trait SpotifyAuthClient: Send + Sync {
    async fn exchange_authorization_code(
        &self,
        request: CodeExchangeRequest,
    ) -> Result<TokenExchangeResponse, AppError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestSpotifyAuthClient {
    client: Client,
}

#[derive(Debug, serde::Deserialize)]
struct SpotifyTokenResponsePayload {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl ReqwestSpotifyAuthClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpotifyAuthClient for ReqwestSpotifyAuthClient {
    async fn exchange_authorization_code(
        &self,
        request: CodeExchangeRequest,
    ) -> Result<TokenExchangeResponse, AppError> {
        // Spotify wants client credentials in a Basic header, not the form.
        let response = self
            .client
            .post(&request.token_endpoint)
            .basic_auth(&request.client_id, Some(&request.client_secret))
            .form(&[
                ("grant_type", "authorization_code".to_string()),
                ("code", request.authorization_code),
                ("redirect_uri", request.redirect_uri),
            ])
            .send()
            .await
            .map_err(|error| AppError::AuthExchange(format!("request failed: {error}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            AppError::AuthExchange(format!("failed reading token response: {error}"))
        })?;

        let parsed =
            serde_json::from_str::<SpotifyTokenResponsePayload>(&body).map_err(|error| {
                AppError::AuthExchange(format!("invalid token response payload: {error}; body={body}"))
            })?;

        if !status.is_success() || parsed.error.is_some() {
            let code = parsed
                .error
                .unwrap_or_else(|| format!("http_{}", status.as_u16()));
            let detail = parsed.error_description.unwrap_or_else(|| body.clone());
            return Err(AppError::AuthExchange(format!(
                "token endpoint error: {code}; {detail}"
            )));
        }

        let access_token = parsed.access_token.ok_or_else(|| {
            AppError::AuthExchange("token endpoint omitted access_token".to_string())
        })?;

        Ok(TokenExchangeResponse {
            access_token,
            refresh_token: parsed.refresh_token,
            expires_in: parsed.expires_in.unwrap_or(0).max(0),
        })
    }
}
