//! Streams input files line by line into a shared [`Accumulator`].
//!
//! Malformed lines are skipped and a file that cannot be read is reported
//! back to the caller; neither stops the run.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use tracing::{debug, error, info};

use crate::accumulator::Accumulator;
use crate::parser::Observation;

/// Record counts for one processed input. Blank lines are not records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileSummary {
    pub records: u64,
    pub parsed: u64,
    pub skipped: u64,
}

/// An input that could not be opened or read.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Outcome of a multi-file run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files: Vec<(PathBuf, FileSummary)>,
    pub failures: Vec<FileFailure>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn total_parsed(&self) -> u64 {
        self.files.iter().map(|(_, s)| s.parsed).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.files.iter().map(|(_, s)| s.skipped).sum()
    }
}

/// Reads `reader` to exhaustion, merging every well-formed line into `acc`.
///
/// # Errors
///
/// Only I/O errors from the underlying reader are returned; observations
/// merged before the error stay in `acc`.
pub fn process<R: Read>(reader: R, acc: &mut Accumulator) -> Result<FileSummary> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut summary = FileSummary::default();

    for result in rdr.records() {
        summary.records += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                summary.skipped += 1;
                let line = e.position().map(|p| p.line());
                debug!(?line, error = %e, "Skipping unreadable line");
                continue;
            }
        };

        match Observation::from_record(&record) {
            Ok(obs) => {
                acc.merge(&obs);
                summary.parsed += 1;
            }
            Err(e) => {
                summary.skipped += 1;
                let line = record.position().map(|p| p.line());
                debug!(?line, error = %e, "Skipping malformed line");
            }
        }
    }

    Ok(summary)
}

/// Opens `path` for reading, decompressing `.gz` files on the fly.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let is_gzip = path.extension().and_then(|e| e.to_str()) == Some("gz");
    if is_gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Processes a single file. The file is closed before returning on every path.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn process_path(path: &Path, acc: &mut Accumulator) -> Result<FileSummary> {
    info!("Opening file");
    let input = open_input(path)?;

    let summary =
        process(input, acc).with_context(|| format!("Failed to read file: {}", path.display()))?;

    info!(
        records = summary.records,
        parsed = summary.parsed,
        skipped = summary.skipped,
        "File processed"
    );
    Ok(summary)
}

/// Processes every path in order against the same accumulator.
///
/// A failing file is logged and recorded in the returned [`RunSummary`];
/// the remaining files are still processed.
pub fn process_paths<P: AsRef<Path>>(paths: &[P], acc: &mut Accumulator) -> RunSummary {
    let mut run = RunSummary::default();

    for path in paths {
        let path = path.as_ref();
        match process_path(path, acc) {
            Ok(summary) => run.files.push((path.to_path_buf(), summary)),
            Err(e) => {
                error!(path = %path.display(), error = %format!("{e:#}"), "Failed to process file");
                run.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error: e,
                });
            }
        }
    }

    info!(
        files = run.files.len(),
        failed = run.failures.len(),
        parsed = run.total_parsed(),
        skipped = run.total_skipped(),
        states = acc.len(),
        "Run complete"
    );
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CA_LINES: &str = "\
CA\t1428300000000\t9prcjqk3yc80\t93.0\t0.0\t100.0\t0.0\t95644.0\t277.58716
CA\t1430308800000\t9prc9sgwvw80\t4.0\t0.0\t100.0\t0.0\t99226.0\t282.63037
";

    #[test]
    fn test_process_counts_records() {
        let mut acc = Accumulator::new();
        let summary = process(Cursor::new(CA_LINES), &mut acc).unwrap();

        assert_eq!(
            summary,
            FileSummary {
                records: 2,
                parsed: 2,
                skipped: 0
            }
        );
        assert_eq!(acc.get("CA").unwrap().record_count, 2);
    }

    #[test]
    fn test_short_line_skipped_without_error() {
        let input = format!("CA\t1\tgh\t2\t3\n{CA_LINES}");
        let mut acc = Accumulator::new();
        let summary = process(Cursor::new(input), &mut acc).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.parsed, 2);
        assert_eq!(acc.get("CA").unwrap().record_count, 2);
    }

    #[test]
    fn test_only_malformed_lines_leave_accumulator_unchanged() {
        let input = "CA\t1\tgh\t2\t3\nTX\tnot-a-time\tgh\t1\t0\t1\t0\t1\t280\n";
        let mut acc = Accumulator::new();
        let summary = process(Cursor::new(input), &mut acc).unwrap();

        assert_eq!(summary.skipped, 2);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_blank_lines_are_not_records() {
        let input = format!("\n{CA_LINES}\n\n");
        let mut acc = Accumulator::new();
        let summary = process(Cursor::new(input), &mut acc).unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn test_nan_line_does_not_poison_extrema() {
        let input = "\
CA\t100000\tgh\t50.0\t0.0\t10.0\t0.0\t100000.0\tNaN
CA\t200000\tgh\tinf\t0.0\t10.0\t0.0\t100000.0\t300.0
CA\t300000\tgh\t50.0\t0.0\t10.0\t0.0\t100000.0\t308.15
CA\t400000\tgh\t70.0\t0.0\t10.0\t0.0\t100000.0\t277.594444444444
";
        let mut acc = Accumulator::new();
        let summary = process(Cursor::new(input), &mut acc).unwrap();

        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.skipped, 2);

        let ca = acc.get("CA").unwrap();
        assert_eq!(ca.record_count, 2);
        assert!((ca.max_temperature_f - 95.0).abs() < 1e-6);
        assert_eq!(ca.max_temperature_at, 300);
        assert!((ca.min_temperature_f - 40.0).abs() < 1e-6);
        assert_eq!(ca.min_temperature_at, 400);
        assert!((ca.avg_temperature_f() - 67.5).abs() < 1e-6);
        assert_eq!(ca.avg_humidity(), 60.0);
    }

    #[test]
    fn test_unterminated_last_line_is_parsed() {
        let input = CA_LINES.trim_end();
        let mut acc = Accumulator::new();
        let summary = process(Cursor::new(input), &mut acc).unwrap();

        assert_eq!(summary.parsed, 2);
    }

    #[test]
    fn test_truncated_tail_is_skipped() {
        let input = format!("{CA_LINES}CA\t14283000");
        let mut acc = Accumulator::new();
        let summary = process(Cursor::new(input), &mut acc).unwrap();

        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_invalid_utf8_line_skipped() {
        let mut input = b"C\xff\t1\tgh\t1\t0\t1\t0\t1\t280\n".to_vec();
        input.extend_from_slice(CA_LINES.as_bytes());
        let mut acc = Accumulator::new();
        let summary = process(Cursor::new(input), &mut acc).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.parsed, 2);
    }

    #[test]
    fn test_missing_file_is_reported_and_run_continues() {
        let missing = std::env::temp_dir().join("climate_stats_driver_missing.tdv");
        let _ = std::fs::remove_file(&missing);
        let present = std::env::temp_dir().join("climate_stats_driver_present.tdv");
        std::fs::write(&present, CA_LINES).unwrap();

        let mut acc = Accumulator::new();
        let run = process_paths(&[&missing, &present], &mut acc);

        assert!(run.has_failures());
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].path, missing);
        assert!(run.failures[0].error.to_string().contains("Failed to open file"));
        assert_eq!(run.total_parsed(), 2);
        assert_eq!(acc.get("CA").unwrap().record_count, 2);

        std::fs::remove_file(&present).unwrap();
    }
}
