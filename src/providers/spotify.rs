use crate::constants::{CACHE_KEY_DELIMITER, HTTP_TIMEOUT_SECS, SPOTIFY_PROVIDER};
use crate::error::{EnrichError, Result};
use crate::providers::LookupProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SEARCH_URL: &str = "https://api.spotify.com/v1/search";

/// Refresh the bearer token this long before its advertised expiry.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 300;

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Spotify Web API via the client-credentials flow. The bearer token is
/// held in memory for the process lifetime only and re-requested when
/// absent or expired.
pub struct SpotifyProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyProvider {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let body: Value = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let value = body["access_token"]
            .as_str()
            .ok_or_else(|| EnrichError::MissingField("access_token".into()))?
            .to_string();
        let expires_in = body["expires_in"].as_u64().unwrap_or(3600);
        let expires_at =
            Instant::now() + Duration::from_secs(expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS));

        *guard = Some(CachedToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }
}

#[async_trait]
impl LookupProvider for SpotifyProvider {
    type Value = Vec<String>;

    fn name(&self) -> &'static str {
        SPOTIFY_PROVIDER
    }

    fn cache_key(&self, subject: &str) -> String {
        format!(
            "{}{}{}",
            subject.to_lowercase(),
            CACHE_KEY_DELIMITER,
            self.name()
        )
    }

    async fn fetch(&self, artist: &str) -> Result<Option<Vec<String>>> {
        let token = self.access_token().await?;

        let body: Value = self
            .client
            .get(SEARCH_URL)
            .bearer_auth(token)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .query(&[("q", artist), ("type", "artist"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let genres: Vec<String> = body["artists"]["items"][0]["genres"]
            .as_array()
            .map(|genres| {
                genres
                    .iter()
                    .filter_map(|genre| genre.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(if genres.is_empty() { None } else { Some(genres) })
    }
}
