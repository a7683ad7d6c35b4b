use crate::constants::{CACHE_KEY_DELIMITER, HTTP_TIMEOUT_SECS, MAPBOX_PROVIDER};
use crate::error::Result;
use crate::providers::LookupProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const PLACES_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Mapbox places geocoding. The state is the text of the first context
/// entry whose id starts with "region".
pub struct MapboxProvider {
    client: reqwest::Client,
    access_token: String,
    country: String,
}

impl MapboxProvider {
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
            country: "us".to_string(),
        }
    }
}

#[async_trait]
impl LookupProvider for MapboxProvider {
    type Value = String;

    fn name(&self) -> &'static str {
        MAPBOX_PROVIDER
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
        let url = format!("{}/{}.json", PLACES_URL, urlencoding::encode(city));
        let body: Value = self
            .client
            .get(url)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("country", self.country.as_str()),
                ("types", "place"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(context) = body["features"][0]["context"].as_array() {
            for item in context {
                let is_region = item["id"]
                    .as_str()
                    .map(|id| id.starts_with("region"))
                    .unwrap_or(false);
                if is_region {
                    return Ok(item["text"].as_str().map(str::to_string));
                }
            }
        }
        Ok(None)
    }
}
