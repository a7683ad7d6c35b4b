//! Provider names, cache-key format, dataset column names, and default
//! file locations shared across the crate.

// Music metadata providers
pub const MUSICBRAINZ_PROVIDER: &str = "musicbrainz";
pub const SPOTIFY_PROVIDER: &str = "spotify";
pub const LASTFM_PROVIDER: &str = "lastfm";

// Geocoding providers
pub const NOMINATIM_PROVIDER: &str = "nominatim";
pub const GOOGLE_PROVIDER: &str = "google";
pub const MAPBOX_PROVIDER: &str = "mapbox";

/// Delimiter joining the segments of a cache key:
/// `<lowercased subject>|<provider>[|<country>]`.
pub const CACHE_KEY_DELIMITER: char = '|';

/// User-Agent sent to providers that require one (MusicBrainz, Nominatim).
pub const USER_AGENT: &str = "concert-enricher/0.1 (concert data enrichment)";

/// Per-request timeout for all provider calls.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// MusicBrainz and Nominatim ask for at most one request per second.
pub const RATE_LIMIT_PACING_SECS: u64 = 1;

/// At most this many genre tags are kept from a provider response.
pub const MAX_GENRE_TAGS: usize = 5;

/// Only rows from this country qualify for city-to-state enrichment.
pub const US_COUNTRY: &str = "United States";

// Default file locations
pub const DEFAULT_ARTIST_MAPPING_FILE: &str = "artist_genre_mapping.json";
pub const DEFAULT_ARTIST_CACHE_FILE: &str = "artist_genre_cache.json";
pub const DEFAULT_CITY_MAPPING_FILE: &str = "city_state_mapping.json";
pub const DEFAULT_CITY_CACHE_FILE: &str = "city_state_cache.json";

// Dataset column names
pub const ARTIST_COLUMN: &str = "Artist";
pub const CITY_COLUMN: &str = "City";
pub const COUNTRY_COLUMN: &str = "Country";
pub const GENRE_COLUMN: &str = "Genre";
pub const ALL_GENRES_COLUMN: &str = "All_Genres";
pub const STATE_COLUMN: &str = "State";
