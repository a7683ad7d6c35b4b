use crate::constants::{
    CACHE_KEY_DELIMITER, HTTP_TIMEOUT_SECS, NOMINATIM_PROVIDER, RATE_LIMIT_PACING_SECS,
    USER_AGENT, US_COUNTRY,
};
use crate::error::Result;
use crate::providers::LookupProvider;
use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// OpenStreetMap Nominatim. Free, no key, but asks for one request per
/// second and a descriptive User-Agent.
pub struct NominatimProvider {
    client: reqwest::Client,
    country: String,
}

impl Default for NominatimProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NominatimProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            country: US_COUNTRY.to_string(),
        }
    }
}

#[async_trait]
impl LookupProvider for NominatimProvider {
    type Value = String;

    fn name(&self) -> &'static str {
        NOMINATIM_PROVIDER
    }

    fn cache_key(&self, subject: &str) -> String {
        format!(
            "{}{}{}{}{}",
            subject.to_lowercase(),
            CACHE_KEY_DELIMITER,
            self.name(),
            CACHE_KEY_DELIMITER,
            self.country.to_lowercase()
        )
    }

    async fn fetch(&self, city: &str) -> Result<Option<String>> {
        tokio::time::sleep(Duration::from_secs(RATE_LIMIT_PACING_SECS)).await;

        let query = format!("{}, {}", city, self.country);
        let body: Value = self
            .client
            .get(SEARCH_URL)
            .header(header::USER_AGENT, USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let state = body[0]["address"]["state"].as_str().map(str::to_string);
        if state.is_none() {
            debug!("no Nominatim state for '{}'", city);
        }
        Ok(state)
    }
}
