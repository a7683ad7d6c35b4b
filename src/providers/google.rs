use crate::constants::{CACHE_KEY_DELIMITER, GOOGLE_PROVIDER, HTTP_TIMEOUT_SECS};
use crate::error::Result;
use crate::providers::LookupProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Google Geocoding API. The state is the long name of the first
/// administrative_area_level_1 address component.
pub struct GoogleProvider {
    client: reqwest::Client,
    api_key: String,
    country: String,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            country: "US".to_string(),
        }
    }
}

#[async_trait]
impl LookupProvider for GoogleProvider {
    type Value = String;

    fn name(&self) -> &'static str {
        GOOGLE_PROVIDER
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
        let address = format!("{}, {}", city, self.country);
        let body: Value = self
            .client
            .get(GEOCODE_URL)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .query(&[("address", address.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body["status"].as_str() != Some("OK") {
            return Ok(None);
        }

        if let Some(components) = body["results"][0]["address_components"].as_array() {
            for component in components {
                let is_state = component["types"]
                    .as_array()
                    .map(|types| {
                        types
                            .iter()
                            .any(|t| t.as_str() == Some("administrative_area_level_1"))
                    })
                    .unwrap_or(false);
                if is_state {
                    return Ok(component["long_name"].as_str().map(str::to_string));
                }
            }
        }
        Ok(None)
    }
}
