use crate::error::{EnrichError, Result};
use std::path::Path;

/// A CSV dataset held in memory: a header row plus string records.
/// Enrichment appends derived columns; source columns are never mutated.
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Requires `name` to be a column of this dataset.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| EnrichError::MissingField(format!("column '{name}'")))
    }

    /// The trimmed value at (`row`, `column`), or None when the column is
    /// absent or the cell is empty.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        let cell = self.rows.get(row)?.get(idx)?.trim();
        if cell.is_empty() {
            None
        } else {
            Some(cell)
        }
    }

    /// Appends a derived column. Rows beyond `values` get an empty cell.
    pub fn add_column(&mut self, name: &str, values: Vec<String>) {
        self.headers.push(name.to_string());
        for (idx, row) in self.rows.iter_mut().enumerate() {
            row.push(values.get(idx).cloned().unwrap_or_default());
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn read_add_column_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("concerts.csv");
        fs::write(&input, "Artist,Venue\nColdplay,Climate Pledge Arena\nReal Estate,Neumos\n")
            .unwrap();

        let mut dataset = Dataset::read(&input).unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.value(0, "Artist"), Some("Coldplay"));
        assert_eq!(dataset.value(1, "Venue"), Some("Neumos"));

        dataset.add_column("Genre", vec!["pop, rock".into(), String::new()]);
        let output = dir.path().join("concerts_with_genres.csv");
        dataset.write(&output).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("Artist,Venue,Genre\n"));
        assert!(written.contains("Coldplay,Climate Pledge Arena,\"pop, rock\""));
        assert!(written.contains("Real Estate,Neumos,\n"));
    }

    #[test]
    fn empty_cells_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("concerts.csv");
        fs::write(&input, "Artist,City\n,Seattle\n").unwrap();

        let dataset = Dataset::read(&input).unwrap();
        assert_eq!(dataset.value(0, "Artist"), None);
        assert_eq!(dataset.value(0, "City"), Some("Seattle"));
        assert_eq!(dataset.value(0, "State"), None);
    }

    #[test]
    fn require_column_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("concerts.csv");
        fs::write(&input, "Venue\nNeumos\n").unwrap();

        let dataset = Dataset::read(&input).unwrap();
        assert!(dataset.require_column("Artist").is_err());
        assert!(dataset.require_column("Venue").is_ok());
    }
}
