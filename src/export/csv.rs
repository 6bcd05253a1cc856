//! CSV export for analysis results
//!
//! Writes the two-column spreadsheet consumers read: a fixed header followed
//! by one row per analyzed file, in batch order. The file is overwritten
//! unconditionally. A write failure here propagates - a partially written
//! results file is not a useful partial success.

use crate::error::{BpmsheetError, Result};
use crate::types::ResultRow;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Fixed header of the exported spreadsheet
pub const HEADER: [&str; 2] = ["File Name", "BPM"];

/// Write result rows to a CSV file at `output_path`
///
/// The sentinel BPM `0.0` is written verbatim; it signals "undetermined" to
/// the spreadsheet's consumer.
pub fn write_csv(rows: &[ResultRow], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .map_err(|e| BpmsheetError::export_error(output_path, e))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bpm_output.csv");

        let rows = vec![
            ResultRow::new("a.wav", 120.0),
            ResultRow::new("b.mp3", 0.0),
        ];
        write_csv(&rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "File Name,BPM");
        assert!(lines[1].starts_with("a.wav,"));
        assert!(lines[2].starts_with("b.mp3,"));

        // BPM column round-trips exactly
        let bpm_a: f64 = lines[1].rsplit(',').next().unwrap().parse().unwrap();
        let bpm_b: f64 = lines[2].rsplit(',').next().unwrap().parse().unwrap();
        assert_eq!(bpm_a, 120.0);
        assert_eq!(bpm_b, 0.0);
    }

    #[test]
    fn test_rows_preserve_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bpm_output.csv");

        let rows: Vec<ResultRow> = (0..5)
            .map(|i| ResultRow::new(format!("{}.wav", i), 100.0 + i as f64))
            .collect();
        write_csv(&rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let names: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(names, vec!["0.wav", "1.wav", "2.wav", "3.wav", "4.wav"]);
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bpm_output.csv");
        fs::write(&path, "stale content\nmore stale\nlines\nhere\n").unwrap();

        write_csv(&[ResultRow::new("only.wav", 99.5)], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("stale"));
    }

    #[test]
    fn test_empty_rows_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bpm_output.csv");

        write_csv(&[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "File Name,BPM");
    }

    #[test]
    fn test_unwritable_path_propagates() {
        let err = write_csv(&[], Path::new("/no/such/dir/bpm_output.csv")).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
