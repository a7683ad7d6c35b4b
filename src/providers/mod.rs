pub mod google;
pub mod lastfm;
pub mod mapbox;
pub mod musicbrainz;
pub mod nominatim;
pub mod spotify;

use crate::error::{EnrichError, Result};
use crate::mapping::MappingValue;
use async_trait::async_trait;
use clap::ValueEnum;

pub use google::GoogleProvider;
pub use lastfm::LastFmProvider;
pub use mapbox::MapboxProvider;
pub use musicbrainz::MusicBrainzProvider;
pub use nominatim::NominatimProvider;
pub use spotify::SpotifyProvider;

/// Capability shared by every external lookup service: translate a
/// subject into a provider-specific request and parse the response.
/// The fetch path is network-only; the cache consult and write-through
/// live in the lookup service.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    type Value: MappingValue;

    fn name(&self) -> &'static str;

    /// Key under which this provider's result for `subject` is cached.
    fn cache_key(&self, subject: &str) -> String;

    /// Resolves `subject` against the external service. `Ok(None)` means
    /// the service answered but had no match.
    async fn fetch(&self, subject: &str) -> Result<Option<Self::Value>>;
}

/// Music metadata providers for artist-to-genre lookups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GenreProviderId {
    Musicbrainz,
    Spotify,
    Lastfm,
}

/// Geocoding providers for city-to-state lookups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GeoProviderId {
    Nominatim,
    Google,
    Mapbox,
}

/// Credentials collected from CLI flags and environment variables.
/// Each provider takes what it needs at construction time.
#[derive(Debug, Default, Clone)]
pub struct Credentials {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub lastfm_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub mapbox_access_token: Option<String>,
}

fn require(value: Option<&String>, provider: &str, flag: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(EnrichError::Config(format!(
            "{provider} provider requires {flag}"
        ))),
    }
}

/// Builds the genre provider for `id`. Missing credentials fail here,
/// before any lookup is attempted.
pub fn genre_provider(
    id: GenreProviderId,
    credentials: &Credentials,
) -> Result<Box<dyn LookupProvider<Value = Vec<String>>>> {
    match id {
        GenreProviderId::Musicbrainz => Ok(Box::new(MusicBrainzProvider::new())),
        GenreProviderId::Spotify => {
            let client_id =
                require(credentials.spotify_client_id.as_ref(), "spotify", "--client-id")?;
            let client_secret = require(
                credentials.spotify_client_secret.as_ref(),
                "spotify",
                "--client-secret",
            )?;
            Ok(Box::new(SpotifyProvider::new(client_id, client_secret)))
        }
        GenreProviderId::Lastfm => {
            let api_key = require(credentials.lastfm_api_key.as_ref(), "lastfm", "--api-key")?;
            Ok(Box::new(LastFmProvider::new(api_key)))
        }
    }
}

/// Builds the geocoding provider for `id`. Missing credentials fail
/// here, before any lookup is attempted.
pub fn geo_provider(
    id: GeoProviderId,
    credentials: &Credentials,
) -> Result<Box<dyn LookupProvider<Value = String>>> {
    match id {
        GeoProviderId::Nominatim => Ok(Box::new(NominatimProvider::new())),
        GeoProviderId::Google => {
            let api_key = require(credentials.google_api_key.as_ref(), "google", "--api-key")?;
            Ok(Box::new(GoogleProvider::new(api_key)))
        }
        GeoProviderId::Mapbox => {
            let access_token = require(
                credentials.mapbox_access_token.as_ref(),
                "mapbox",
                "--access-token",
            )?;
            Ok(Box::new(MapboxProvider::new(access_token)))
        }
    }
}
