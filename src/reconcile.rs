use crate::constants::{
    ALL_GENRES_COLUMN, ARTIST_COLUMN, CITY_COLUMN, COUNTRY_COLUMN, GENRE_COLUMN, STATE_COLUMN,
    US_COUNTRY,
};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::lookup::LookupService;
use crate::mapping::{Mapping, MappingValue};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// One side of the enrichment: how subjects are pulled out of rows and
/// how mapped values turn into derived columns.
pub trait EnrichmentDomain {
    type Value: MappingValue;

    /// Human label for progress output, e.g. "artists".
    fn subject_label(&self) -> &'static str;

    /// Columns the input dataset must carry.
    fn required_columns(&self) -> &'static [&'static str];

    /// The qualifying subject of a row, if any.
    fn subject(&self, dataset: &Dataset, row: usize) -> Option<String>;

    /// Derived column names, in output order.
    fn derived_columns(&self) -> &'static [&'static str];

    /// Derived cell values for one row, one per derived column. Rows
    /// whose subject is unmapped get empty cells.
    fn derive(&self, dataset: &Dataset, row: usize, mapping: &Mapping<Self::Value>)
        -> Vec<String>;

    /// Suffix for the default output path, e.g. "_with_genres".
    fn output_suffix(&self) -> &'static str;
}

/// Artist → genre list. Derives `Genre` (the single genre, or the first
/// three joined) and `All_Genres`.
pub struct ArtistGenres;

impl EnrichmentDomain for ArtistGenres {
    type Value = Vec<String>;

    fn subject_label(&self) -> &'static str {
        "artists"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[ARTIST_COLUMN]
    }

    fn subject(&self, dataset: &Dataset, row: usize) -> Option<String> {
        dataset.value(row, ARTIST_COLUMN).map(str::to_string)
    }

    fn derived_columns(&self) -> &'static [&'static str] {
        &[GENRE_COLUMN, ALL_GENRES_COLUMN]
    }

    fn derive(&self, dataset: &Dataset, row: usize, mapping: &Mapping<Vec<String>>) -> Vec<String> {
        let genres = dataset
            .value(row, ARTIST_COLUMN)
            .and_then(|artist| mapping.get(artist));
        match genres {
            Some(genres) => {
                let primary = if genres.len() == 1 {
                    genres[0].clone()
                } else {
                    genres.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
                };
                vec![primary, genres.join(", ")]
            }
            None => vec![String::new(), String::new()],
        }
    }

    fn output_suffix(&self) -> &'static str {
        "_with_genres"
    }
}

/// US city → state. Only rows whose Country is "United States" qualify;
/// derives `State`.
pub struct CityStates;

impl EnrichmentDomain for CityStates {
    type Value = String;

    fn subject_label(&self) -> &'static str {
        "cities"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[CITY_COLUMN, COUNTRY_COLUMN]
    }

    fn subject(&self, dataset: &Dataset, row: usize) -> Option<String> {
        if dataset.value(row, COUNTRY_COLUMN) != Some(US_COUNTRY) {
            return None;
        }
        dataset.value(row, CITY_COLUMN).map(str::to_string)
    }

    fn derived_columns(&self) -> &'static [&'static str] {
        &[STATE_COLUMN]
    }

    fn derive(&self, dataset: &Dataset, row: usize, mapping: &Mapping<String>) -> Vec<String> {
        let state = self
            .subject(dataset, row)
            .and_then(|city| mapping.get(&city).cloned())
            .unwrap_or_default();
        vec![state]
    }

    fn output_suffix(&self) -> &'static str {
        "_with_states"
    }
}

/// What a reconcile run did, for the CLI summary.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub rows: usize,
    pub unmapped_subjects: usize,
    pub added: usize,
    pub failed: Vec<String>,
    pub mapping_written: bool,
    pub output_path: Option<PathBuf>,
}

fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("enriched");
    input.with_file_name(format!("{stem}{suffix}.csv"))
}

/// Reconciles the persisted mapping with the subjects found in `csv_file`
/// and applies it back as derived columns: load, diff, look up missing
/// subjects, merge successes, persist (unless dry-run), enrich, write.
pub async fn reconcile<D: EnrichmentDomain>(
    domain: &D,
    service: &mut LookupService<D::Value>,
    csv_file: &Path,
    mapping_file: &Path,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<ReconcileOutcome> {
    println!("Processing: {}", csv_file.display());

    let mut dataset = Dataset::read(csv_file)?;
    for column in domain.required_columns() {
        dataset.require_column(column)?;
    }
    println!("   Loaded {} rows", dataset.row_count());

    let mut mapping: Mapping<D::Value> = Mapping::load(mapping_file)?;
    println!(
        "   Current mapping has {} {}",
        mapping.len(),
        domain.subject_label()
    );

    // Distinct qualifying subjects not yet mapped, compared case-insensitively.
    let mut seen = HashSet::new();
    let mut unmapped = Vec::new();
    for row in 0..dataset.row_count() {
        if let Some(subject) = domain.subject(&dataset, row) {
            if seen.insert(subject.to_lowercase()) && !mapping.contains(&subject) {
                unmapped.push(subject);
            }
        }
    }
    unmapped.sort();

    let mut added = 0;
    let mut failed = Vec::new();
    let mut mapping_written = false;

    if unmapped.is_empty() {
        println!("   ✓ All {} already mapped", domain.subject_label());
    } else {
        println!(
            "   Found {} unmapped {}:",
            unmapped.len(),
            domain.subject_label()
        );
        for subject in unmapped.iter().take(10) {
            println!("      - {subject}");
        }
        if unmapped.len() > 10 {
            println!("      ... and {} more", unmapped.len() - 10);
        }

        println!(
            "   Looking up {} {} via {}...",
            unmapped.len(),
            domain.subject_label(),
            service.provider_name()
        );
        let results = service.batch_lookup(&unmapped).await;

        for (subject, value) in results {
            match value {
                Some(value) => {
                    if mapping.insert(subject, value) {
                        added += 1;
                    }
                }
                None => failed.push(subject),
            }
        }

        info!(
            added,
            failed = failed.len(),
            provider = service.provider_name(),
            "batch lookup finished"
        );
        println!("   Successfully mapped: {added}");
        if !failed.is_empty() {
            println!("   ✗ Not found: {}", failed.join(", "));
        }

        if dry_run {
            println!("   DRY RUN - not saving mapping ({added} would be added)");
        } else if added > 0 {
            mapping.save()?;
            mapping_written = true;
            println!("   ✓ Saved updated mapping to {}", mapping_file.display());
        }
    }

    // Apply the (possibly updated) mapping to every row.
    let columns = domain.derived_columns();
    let mut derived: Vec<Vec<String>> = vec![Vec::with_capacity(dataset.row_count()); columns.len()];
    for row in 0..dataset.row_count() {
        for (idx, value) in domain.derive(&dataset, row, &mapping).into_iter().enumerate() {
            derived[idx].push(value);
        }
    }
    let enriched_rows = derived
        .first()
        .map(|values| values.iter().filter(|v| !v.is_empty()).count())
        .unwrap_or(0);
    for (name, values) in columns.iter().zip(derived) {
        dataset.add_column(name, values);
    }
    println!(
        "   Rows with {}: {} of {}",
        columns[0],
        enriched_rows,
        dataset.row_count()
    );

    let output_path = if dry_run {
        None
    } else {
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(csv_file, domain.output_suffix()));
        dataset.write(&path)?;
        println!("   ✓ Saved enriched data to {}", path.display());
        Some(path)
    };

    Ok(ReconcileOutcome {
        rows: dataset.row_count(),
        unmapped_subjects: unmapped.len(),
        added,
        failed,
        mapping_written,
        output_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn default_output_path_appends_suffix() {
        assert_eq!(
            default_output_path(Path::new("data/concerts.csv"), "_with_genres"),
            PathBuf::from("data/concerts_with_genres.csv")
        );
    }

    #[test]
    fn artist_domain_derives_primary_and_all_genres() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("concerts.csv");
        fs::write(&input, "Artist\nColdplay\nUnknown\n").unwrap();
        let dataset = Dataset::read(&input).unwrap();

        let mut mapping: Mapping<Vec<String>> =
            Mapping::load(dir.path().join("mapping.json")).unwrap();
        mapping.insert(
            "Coldplay".into(),
            vec!["pop".into(), "rock".into(), "alternative rock".into(), "britpop".into()],
        );

        let domain = ArtistGenres;
        assert_eq!(
            domain.derive(&dataset, 0, &mapping),
            vec![
                "pop, rock, alternative rock".to_string(),
                "pop, rock, alternative rock, britpop".to_string()
            ]
        );
        assert_eq!(
            domain.derive(&dataset, 1, &mapping),
            vec![String::new(), String::new()]
        );
    }

    #[test]
    fn single_genre_stands_alone() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("concerts.csv");
        fs::write(&input, "Artist\nDaft Punk\n").unwrap();
        let dataset = Dataset::read(&input).unwrap();

        let mut mapping: Mapping<Vec<String>> =
            Mapping::load(dir.path().join("mapping.json")).unwrap();
        mapping.insert("Daft Punk".into(), vec!["electronic".into()]);

        assert_eq!(
            ArtistGenres.derive(&dataset, 0, &mapping),
            vec!["electronic".to_string(), "electronic".to_string()]
        );
    }

    #[test]
    fn city_domain_only_qualifies_us_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("concerts.csv");
        fs::write(
            &input,
            "City,Country\nBoise,United States\nToronto,Canada\n",
        )
        .unwrap();
        let dataset = Dataset::read(&input).unwrap();

        let domain = CityStates;
        assert_eq!(domain.subject(&dataset, 0), Some("Boise".to_string()));
        assert_eq!(domain.subject(&dataset, 1), None);

        let mut mapping: Mapping<String> =
            Mapping::load(dir.path().join("mapping.json")).unwrap();
        mapping.insert("Boise".into(), "Idaho".into());
        assert_eq!(domain.derive(&dataset, 0, &mapping), vec!["Idaho".to_string()]);
        assert_eq!(domain.derive(&dataset, 1, &mapping), vec![String::new()]);
    }
}
