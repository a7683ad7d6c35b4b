use crate::constants::{
    CACHE_KEY_DELIMITER, HTTP_TIMEOUT_SECS, MAX_GENRE_TAGS, MUSICBRAINZ_PROVIDER,
    RATE_LIMIT_PACING_SECS, USER_AGENT,
};
use crate::error::Result;
use crate::providers::LookupProvider;
use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const ARTIST_URL: &str = "https://musicbrainz.org/ws/2/artist/";

/// Open music encyclopedia. Free, no key, but asks for one request per
/// second. Tags live on the artist resource, so each lookup costs two
/// paced round trips: search for the artist id, then fetch its tags.
pub struct MusicBrainzProvider {
    client: reqwest::Client,
}

impl Default for MusicBrainzProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicBrainzProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LookupProvider for MusicBrainzProvider {
    type Value = Vec<String>;

    fn name(&self) -> &'static str {
        MUSICBRAINZ_PROVIDER
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
        tokio::time::sleep(Duration::from_secs(RATE_LIMIT_PACING_SECS)).await;

        let search: Value = self
            .client
            .get(ARTIST_URL)
            .header(header::USER_AGENT, USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .query(&[("query", artist), ("fmt", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let artist_id = match search["artists"][0]["id"].as_str() {
            Some(id) => id.to_string(),
            None => {
                debug!("no MusicBrainz match for '{}'", artist);
                return Ok(None);
            }
        };

        tokio::time::sleep(Duration::from_secs(RATE_LIMIT_PACING_SECS)).await;

        let detail: Value = self
            .client
            .get(format!("{ARTIST_URL}{artist_id}"))
            .header(header::USER_AGENT, USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .query(&[("inc", "tags"), ("fmt", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let genres: Vec<String> = detail["tags"]
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
