//! Report rendering for accumulated state statistics.
//!
//! Supports the plain-text summary, JSON, and CSV.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use clap::ValueEnum;
use csv::WriterBuilder;
use serde::Serialize;

use crate::accumulator::Accumulator;
use crate::stats::StateStats;

/// `ctime(3)` layout, e.g. `Mon Aug  3 11:00:00 2015`.
pub const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// One flattened report row, used for the JSON and CSV formats.
#[derive(Debug, Serialize)]
pub struct StateSummary {
    pub code: String,
    pub records: u64,
    pub avg_humidity: f64,
    pub avg_temperature_f: f64,
    pub max_temperature_f: f64,
    pub max_temperature_at: Option<DateTime<Utc>>,
    pub min_temperature_f: f64,
    pub min_temperature_at: Option<DateTime<Utc>>,
    pub lightning_strikes: u64,
    pub snow_cover_records: u64,
    pub avg_cloud_cover: f64,
}

impl From<&StateStats> for StateSummary {
    fn from(s: &StateStats) -> Self {
        StateSummary {
            code: s.code.clone(),
            records: s.record_count,
            avg_humidity: s.avg_humidity(),
            avg_temperature_f: s.avg_temperature_f(),
            max_temperature_f: s.max_temperature_f,
            max_temperature_at: s.max_temperature_time(),
            min_temperature_f: s.min_temperature_f,
            min_temperature_at: s.min_temperature_time(),
            lightning_strikes: s.lightning_count,
            snow_cover_records: s.snow_count,
            avg_cloud_cover: s.avg_cloud_cover(),
        }
    }
}

/// Formats epoch seconds in `tz` using [`CTIME_FORMAT`].
pub fn format_timestamp<Tz>(secs: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.with_timezone(tz).format(CTIME_FORMAT).to_string(),
        None => format!("@{secs}"),
    }
}

/// Writes the human-readable summary with timestamps rendered in `tz`.
pub fn write_text<W, Tz>(out: &mut W, acc: &Accumulator, tz: &Tz) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let codes: Vec<&str> = acc.codes().collect();
    writeln!(out, "States found: {}", codes.join(" "))?;

    for s in acc {
        writeln!(out, "-- State: {} --", s.code)?;
        writeln!(out, "Number of Records: {}", s.record_count)?;
        writeln!(out, "Average Humidity: {:.1}%", s.avg_humidity())?;
        writeln!(out, "Average Temperature: {:.1}F", s.avg_temperature_f())?;
        writeln!(
            out,
            "Max Temperature: {:.1}F on {}",
            s.max_temperature_f,
            format_timestamp(s.max_temperature_at, tz)
        )?;
        writeln!(
            out,
            "Min Temperature: {:.1}F on {}",
            s.min_temperature_f,
            format_timestamp(s.min_temperature_at, tz)
        )?;
        writeln!(out, "Lightning Strikes: {}", s.lightning_count)?;
        writeln!(out, "Records with Snow Cover: {}", s.snow_count)?;
        writeln!(out, "Average Cloud Cover: {:.1}%", s.avg_cloud_cover())?;
    }

    Ok(())
}

/// Writes the report as a pretty-printed JSON array.
pub fn write_json<W: Write>(out: &mut W, acc: &Accumulator) -> Result<()> {
    let rows: Vec<StateSummary> = acc.iter().map(StateSummary::from).collect();
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)?;
    Ok(())
}

/// Writes the report as CSV, one header row then one row per state.
pub fn write_csv<W: Write>(out: W, acc: &Accumulator) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(out);

    for s in acc {
        writer.serialize(StateSummary::from(s))?;
    }
    writer.flush()?;

    Ok(())
}

/// Renders `acc` in the requested format.
pub fn write_report<W, Tz>(
    out: &mut W,
    acc: &Accumulator,
    format: ReportFormat,
    tz: &Tz,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match format {
        ReportFormat::Text => write_text(out, acc, tz),
        ReportFormat::Json => write_json(out, acc),
        ReportFormat::Csv => write_csv(out, acc),
    }
}
