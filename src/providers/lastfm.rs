use crate::constants::{CACHE_KEY_DELIMITER, HTTP_TIMEOUT_SECS, LASTFM_PROVIDER, MAX_GENRE_TAGS};
use crate::error::Result;
use crate::providers::LookupProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const API_URL: &str = "http://ws.audioscrobbler.com/2.0/";

/// Last.fm artist.getinfo. Community tags double as genres.
pub struct LastFmProvider {
    client: reqwest::Client,
    api_key: String,
}

impl LastFmProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl LookupProvider for LastFmProvider {
    type Value = Vec<String>;

    fn name(&self) -> &'static str {
        LASTFM_PROVIDER
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
        let body: Value = self
            .client
            .get(API_URL)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .query(&[
                ("method", "artist.getinfo"),
                ("artist", artist),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let genres: Vec<String> = body["artist"]["tags"]["tag"]
            .as_array()
            .map(|tags| {
                tags.iter()
                    .take(MAX_GENRE_TAGS)
                    .filter_map(|tag| tag["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(if genres.is_empty() { None } else { Some(genres) })
    }
}
