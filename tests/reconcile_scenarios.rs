use async_trait::async_trait;
use concert_enricher::cache::ResponseCache;
use concert_enricher::error::Result;
use concert_enricher::lookup::LookupService;
use concert_enricher::providers::LookupProvider;
use concert_enricher::reconcile::{reconcile, ArtistGenres, CityStates};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Genre stub answering from a fixed table.
struct GenreStub {
    answers: Vec<(&'static str, Vec<String>)>,
}

#[async_trait]
impl LookupProvider for GenreStub {
    type Value = Vec<String>;

    fn name(&self) -> &'static str {
        "stub"
    }

    fn cache_key(&self, subject: &str) -> String {
        format!("{}|{}", subject.to_lowercase(), self.name())
    }

    async fn fetch(&self, subject: &str) -> Result<Option<Vec<String>>> {
        Ok(self
            .answers
            .iter()
            .find(|(name, _)| *name == subject)
            .map(|(_, genres)| genres.clone()))
    }
}

/// State stub answering from a fixed table.
struct StateStub {
    answers: Vec<(&'static str, &'static str)>,
}

#[async_trait]
impl LookupProvider for StateStub {
    type Value = String;

    fn name(&self) -> &'static str {
        "stub"
    }

    fn cache_key(&self, subject: &str) -> String {
        format!("{}|{}|united states", subject.to_lowercase(), self.name())
    }

    async fn fetch(&self, subject: &str) -> Result<Option<String>> {
        Ok(self
            .answers
            .iter()
            .find(|(name, _)| *name == subject)
            .map(|(_, state)| state.to_string()))
    }
}

/// Panics on any fetch; used to prove mapped subjects never hit the wire.
struct NoNetworkGenreStub;

#[async_trait]
impl LookupProvider for NoNetworkGenreStub {
    type Value = Vec<String>;

    fn name(&self) -> &'static str {
        "stub"
    }

    fn cache_key(&self, subject: &str) -> String {
        format!("{}|{}", subject.to_lowercase(), self.name())
    }

    async fn fetch(&self, subject: &str) -> Result<Option<Vec<String>>> {
        panic!("unexpected network call for '{subject}'");
    }
}

fn genre_service(dir: &TempDir, answers: Vec<(&'static str, Vec<String>)>) -> LookupService<Vec<String>> {
    let cache = ResponseCache::load(dir.path().join("cache.json")).unwrap();
    LookupService::new(Box::new(GenreStub { answers }), cache)
}

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn new_artist_lands_in_mapping_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "concerts.csv", "Artist,Venue\nColdplay,Neumos\n");
    let mapping_file = dir.path().join("mapping.json");

    let mut service = genre_service(
        &dir,
        vec![("Coldplay", vec!["pop".to_string(), "rock".to_string()])],
    );
    let outcome = reconcile(&ArtistGenres, &mut service, &csv, &mapping_file, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.added, 1);
    assert!(outcome.mapping_written);

    let mapping: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&mapping_file).unwrap()).unwrap();
    assert_eq!(mapping, json!({"Coldplay": ["pop", "rock"]}));

    let output = fs::read_to_string(outcome.output_path.unwrap()).unwrap();
    assert!(output.starts_with("Artist,Venue,Genre,All_Genres\n"));
    assert!(output.contains("Coldplay,Neumos,\"pop, rock\",\"pop, rock\""));
}

#[tokio::test]
async fn failed_city_lookups_are_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        &dir,
        "concerts.csv",
        "City,Country\nBoise,United States\nReno,United States\n",
    );
    let mapping_file = dir.path().join("mapping.json");
    fs::write(&mapping_file, r#"{"Boise": "Idaho"}"#).unwrap();

    // Reno resolves to nothing; Boise is already mapped so the stub only
    // ever sees Reno.
    let cache = ResponseCache::load(dir.path().join("cache.json")).unwrap();
    let mut service = LookupService::new(Box::new(StateStub { answers: vec![] }), cache);

    let outcome = reconcile(&CityStates, &mut service, &csv, &mapping_file, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.failed, vec!["Reno".to_string()]);
    assert!(!outcome.mapping_written);

    let mapping: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&mapping_file).unwrap()).unwrap();
    assert_eq!(mapping, json!({"Boise": "Idaho"}));

    let output = fs::read_to_string(outcome.output_path.unwrap()).unwrap();
    assert!(output.contains("Boise,United States,Idaho"));
    assert!(output.contains("Reno,United States,\n"));
}

#[tokio::test]
async fn reconcile_twice_is_idempotent_and_offline_second_time() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "concerts.csv", "Artist\nColdplay\nBeyoncé\n");
    let mapping_file = dir.path().join("mapping.json");

    let mut service = genre_service(
        &dir,
        vec![
            ("Coldplay", vec!["pop".to_string()]),
            ("Beyoncé", vec!["r&b".to_string()]),
        ],
    );
    reconcile(&ArtistGenres, &mut service, &csv, &mapping_file, None, false)
        .await
        .unwrap();
    let after_first = fs::read_to_string(&mapping_file).unwrap();

    // Everything is mapped now, so the second run must not fetch at all.
    let cache = ResponseCache::load(dir.path().join("cache.json")).unwrap();
    let mut offline = LookupService::new(Box::new(NoNetworkGenreStub), cache);
    let outcome = reconcile(&ArtistGenres, &mut offline, &csv, &mapping_file, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.unmapped_subjects, 0);
    assert_eq!(outcome.added, 0);
    assert!(!outcome.mapping_written);
    assert_eq!(fs::read_to_string(&mapping_file).unwrap(), after_first);
}

#[tokio::test]
async fn dry_run_never_writes_mapping_or_output() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "concerts.csv", "Artist\nColdplay\n");
    let mapping_file = dir.path().join("mapping.json");

    let mut service = genre_service(&dir, vec![("Coldplay", vec!["pop".to_string()])]);
    let outcome = reconcile(&ArtistGenres, &mut service, &csv, &mapping_file, None, true)
        .await
        .unwrap();

    assert_eq!(outcome.added, 1);
    assert!(!outcome.mapping_written);
    assert!(outcome.output_path.is_none());
    assert!(!mapping_file.exists());
    assert!(!dir.path().join("concerts_with_genres.csv").exists());
}

#[tokio::test]
async fn existing_mapping_values_survive_differently_cased_rows() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "concerts.csv", "Artist\ncoldplay\n");
    let mapping_file = dir.path().join("mapping.json");
    fs::write(&mapping_file, r#"{"Coldplay": ["pop"]}"#).unwrap();

    let cache = ResponseCache::load(dir.path().join("cache.json")).unwrap();
    let mut offline = LookupService::new(Box::new(NoNetworkGenreStub), cache);
    let outcome = reconcile(&ArtistGenres, &mut offline, &csv, &mapping_file, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.unmapped_subjects, 0);
    let output = fs::read_to_string(outcome.output_path.unwrap()).unwrap();
    assert!(output.contains("coldplay,pop,pop"));
}

#[tokio::test]
async fn missing_dataset_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "concerts.csv", "Venue\nNeumos\n");
    let mapping_file = dir.path().join("mapping.json");

    let mut service = genre_service(&dir, vec![]);
    let result = reconcile(&ArtistGenres, &mut service, &csv, &mapping_file, None, false).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn second_domain_run_reuses_cache_not_provider() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "concerts.csv", "City,Country\nBoise,United States\n");
    let mapping_file = dir.path().join("mapping.json");

    let cache = ResponseCache::load(dir.path().join("cache.json")).unwrap();
    let mut service = LookupService::new(
        Box::new(StateStub {
            answers: vec![("Boise", "Idaho")],
        }),
        cache,
    );
    reconcile(&CityStates, &mut service, &csv, &mapping_file, None, false)
        .await
        .unwrap();

    // Drop the mapping but keep the cache: the lookup must be served from
    // disk without a fetch.
    fs::remove_file(&mapping_file).unwrap();
    let cache = ResponseCache::load(dir.path().join("cache.json")).unwrap();

    struct NoNetworkStateStub;

    #[async_trait]
    impl LookupProvider for NoNetworkStateStub {
        type Value = String;

        fn name(&self) -> &'static str {
            "stub"
        }

        fn cache_key(&self, subject: &str) -> String {
            format!("{}|{}|united states", subject.to_lowercase(), self.name())
        }

        async fn fetch(&self, subject: &str) -> Result<Option<String>> {
            panic!("unexpected network call for '{subject}'");
        }
    }

    let mut offline = LookupService::new(Box::new(NoNetworkStateStub), cache);
    let outcome = reconcile(&CityStates, &mut offline, &csv, &mapping_file, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.added, 1);
    let mapping: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&mapping_file).unwrap()).unwrap();
    assert_eq!(mapping, json!({"Boise": "Idaho"}));
}

#[test]
fn path_helpers_accept_relative_inputs() {
    // Dataset paths flow straight into csv::Reader; a relative path that
    // does not exist must surface as an error, not a panic.
    let missing = Path::new("definitely_missing.csv");
    assert!(concert_enricher::dataset::Dataset::read(missing).is_err());
}
