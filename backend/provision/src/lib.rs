//! # Provisioning
//!
//! Pushes device readings into the record store. The web dashboard only ever
//! reads these samples; registration writes a single placeholder.
//!
//! ## Import Files
//! - One sample per line: `prn,date,spo2,heart_rate[,weight]`
//! - Blank lines and lines starting with `#` are skipped
//! - `Unknown`, `-` or an empty field marks a missing reading
//! - Malformed lines are reported and skipped, they never abort the import
//!
//! ## Commands
//!
//! Write one sample.
//! ```sh
//! provision sample --prn 123456789012 --date 2025-04-26 --spo2 98 --heart-rate 72
//! ```
//!
//! Import a file.
//! ```sh
//! RECORDS_ENDPOINT=https://example-rtdb.firebaseio.com provision import samples.csv
//! ```
use std::{fs, path::Path};

use anyhow::{Context, Error};
use indicatif::{ProgressBar, ProgressStyle};
use records::RecordStore;

pub mod models;
pub mod utils;

use models::SampleRow;
use utils::{data_lines, parse_row};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub async fn write_sample(store: &dyn RecordStore, row: &SampleRow) -> Result<(), Error> {
    store
        .write_sample(&row.prn, &row.date, &row.sample)
        .await
        .with_context(|| format!("Failed to write sample {} for PRN {}", row.date, row.prn))
}

pub async fn import_file(store: &dyn RecordStore, path: &Path) -> Result<ImportSummary, Error> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    import_samples(store, &contents).await
}

pub async fn import_samples(
    store: &dyn RecordStore,
    contents: &str,
) -> Result<ImportSummary, Error> {
    let lines: Vec<(usize, &str)> = data_lines(contents).collect();
    let mut summary = ImportSummary::default();

    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    for (line_number, line) in lines {
        let row = match parse_row(line) {
            Ok(row) => row,
            Err(e) => {
                pb.println(format!("Line {line_number}: {e}"));
                summary.skipped += 1;
                pb.inc(1);
                continue;
            }
        };

        pb.set_message(format!("{} {}", row.prn, row.date));

        match write_sample(store, &row).await {
            Ok(()) => summary.written += 1,
            Err(e) => {
                pb.println(format!("Line {line_number}: {e:#}"));
                summary.failed += 1;
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use records::{Reading, memory::MemoryStore};

    use super::*;

    #[tokio::test]
    async fn test_import_counts() {
        let store = MemoryStore::new();
        let contents = "\
# prn,date,spo2,heart_rate,weight
123456789012,2025-04-25,97,70
123456789012,2025-04-26,98,72,68
123456789012,yesterday,98,72
../etc,2025-04-26,98,72
";

        let summary = import_samples(&store, contents).await.unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                written: 2,
                skipped: 2,
                failed: 0,
            }
        );

        let record = store.get("123456789012").unwrap();
        assert_eq!(record.health_data.len(), 2);
        assert_eq!(
            record.latest_sample().unwrap().1.weight,
            Some(Reading::Known(68.0))
        );
    }

    #[tokio::test]
    async fn test_import_file() {
        let store = MemoryStore::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "42,2025-04-26,Unknown,-").unwrap();

        let summary = import_file(&store, file.path()).await.unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(
            store.get("42").unwrap().health_data["2025-04-26"].heart_rate,
            Reading::Unknown
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = MemoryStore::new();

        assert!(
            import_file(&store, Path::new("/definitely/not/here.csv"))
                .await
                .is_err()
        );
    }
}
