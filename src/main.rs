use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use concert_enricher::cache::{CacheStats, ResponseCache};
use concert_enricher::constants::{
    DEFAULT_ARTIST_CACHE_FILE, DEFAULT_ARTIST_MAPPING_FILE, DEFAULT_CITY_CACHE_FILE,
    DEFAULT_CITY_MAPPING_FILE,
};
use concert_enricher::error::Result;
use concert_enricher::logging;
use concert_enricher::lookup::LookupService;
use concert_enricher::providers::{self, Credentials, GenreProviderId, GeoProviderId};
use concert_enricher::reconcile::{reconcile, ArtistGenres, CityStates, ReconcileOutcome};

#[derive(Parser)]
#[command(name = "concert-enricher")]
#[command(about = "Enriches concert event data via external lookup APIs")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add artist genres to a concert CSV
    Genres {
        /// Path to CSV file with concert data
        csv_file: PathBuf,
        /// Path to the artist-genre mapping JSON file
        #[arg(long, default_value = DEFAULT_ARTIST_MAPPING_FILE)]
        mapping_file: PathBuf,
        /// Path to the lookup response cache
        #[arg(long, default_value = DEFAULT_ARTIST_CACHE_FILE)]
        cache_file: PathBuf,
        /// Path for the enriched CSV (default: <input>_with_genres.csv)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Music metadata provider
        #[arg(long, value_enum, default_value_t = GenreProviderId::Musicbrainz)]
        provider: GenreProviderId,
        /// Spotify client ID
        #[arg(long, env = "SPOTIFY_CLIENT_ID")]
        client_id: Option<String>,
        /// Spotify client secret
        #[arg(long, env = "SPOTIFY_CLIENT_SECRET")]
        client_secret: Option<String>,
        /// Last.fm API key
        #[arg(long, env = "LASTFM_API_KEY")]
        api_key: Option<String>,
        /// Preview changes without writing the mapping or the output CSV
        #[arg(long)]
        dry_run: bool,
    },
    /// Add US states to a concert CSV by city
    States {
        /// Path to CSV file with concert data
        csv_file: PathBuf,
        /// Path to the city-state mapping JSON file
        #[arg(long, default_value = DEFAULT_CITY_MAPPING_FILE)]
        mapping_file: PathBuf,
        /// Path to the lookup response cache
        #[arg(long, default_value = DEFAULT_CITY_CACHE_FILE)]
        cache_file: PathBuf,
        /// Path for the enriched CSV (default: <input>_with_states.csv)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Geocoding provider
        #[arg(long, value_enum, default_value_t = GeoProviderId::Nominatim)]
        provider: GeoProviderId,
        /// Google Geocoding API key
        #[arg(long, env = "GOOGLE_API_KEY")]
        api_key: Option<String>,
        /// Mapbox access token
        #[arg(long, env = "MAPBOX_ACCESS_TOKEN")]
        access_token: Option<String>,
        /// Preview changes without writing the mapping or the output CSV
        #[arg(long)]
        dry_run: bool,
    },
    /// Print statistics for a lookup response cache
    CacheStats {
        /// Path to a cache JSON file
        cache_file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("run failed: {}", e);
        eprintln!("✗ Error: {e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("   caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Genres {
            csv_file,
            mapping_file,
            cache_file,
            output,
            provider,
            client_id,
            client_secret,
            api_key,
            dry_run,
        } => {
            let credentials = Credentials {
                spotify_client_id: client_id,
                spotify_client_secret: client_secret,
                lastfm_api_key: api_key,
                ..Credentials::default()
            };
            let provider = providers::genre_provider(provider, &credentials)?;
            let cache = ResponseCache::load(&cache_file)?;
            let mut service = LookupService::new(provider, cache);

            let outcome = reconcile(
                &ArtistGenres,
                &mut service,
                &csv_file,
                &mapping_file,
                output.as_deref(),
                dry_run,
            )
            .await?;
            print_summary(&outcome, service.cache_stats(), dry_run);
        }
        Commands::States {
            csv_file,
            mapping_file,
            cache_file,
            output,
            provider,
            api_key,
            access_token,
            dry_run,
        } => {
            let credentials = Credentials {
                google_api_key: api_key,
                mapbox_access_token: access_token,
                ..Credentials::default()
            };
            let provider = providers::geo_provider(provider, &credentials)?;
            let cache = ResponseCache::load(&cache_file)?;
            let mut service = LookupService::new(provider, cache);

            let outcome = reconcile(
                &CityStates,
                &mut service,
                &csv_file,
                &mapping_file,
                output.as_deref(),
                dry_run,
            )
            .await?;
            print_summary(&outcome, service.cache_stats(), dry_run);
        }
        Commands::CacheStats { cache_file } => {
            let cache = ResponseCache::load(&cache_file)?;
            let stats = cache.stats();
            println!("📊 Cache statistics for {}:", cache_file.display());
            println!("   Total entries: {}", stats.total_entries);
            println!("   Distinct subjects: {}", stats.distinct_subjects);
        }
    }
    Ok(())
}

fn print_summary(outcome: &ReconcileOutcome, stats: CacheStats, dry_run: bool) {
    println!("\n📊 Run summary:");
    println!("   Rows processed: {}", outcome.rows);
    println!("   New lookups: {}", outcome.unmapped_subjects);
    println!("   Added to mapping: {}", outcome.added);
    if !outcome.failed.is_empty() {
        println!("   Not found: {}", outcome.failed.len());
    }
    println!(
        "   Cache: {} entries across {} subjects",
        stats.total_entries, stats.distinct_subjects
    );
    if dry_run {
        println!("\nThis was a dry run. Run without --dry-run to save changes.");
    } else {
        println!("\n✅ Complete");
    }
}
