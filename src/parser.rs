//! Line parser for tab-delimited climate observation files.
//!
//! Each line carries nine fields:
//! state code, timestamp (ms), geohash, humidity, snow flag, cloud cover,
//! lightning flag, pressure (Pa) and surface temperature (Kelvin).

use std::str::FromStr;

use csv::StringRecord;
use thiserror::Error;

/// Number of fields in a well-formed line.
pub const FIELD_COUNT: usize = 9;

/// A single parsed observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub state_code: String,
    /// Seconds since the UNIX epoch.
    pub timestamp: i64,
    pub humidity: f64,
    pub has_snow: bool,
    pub cloud_cover: f64,
    pub has_lightning: bool,
    pub temperature_f: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected 9 fields, found {found}")]
    MissingFields { found: usize },
    #[error("invalid number in field `{field}`: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("non-finite value in field `{field}`: {value:?}")]
    NonFinite { field: &'static str, value: String },
    #[error("empty state code")]
    EmptyStateCode,
}

/// Converts a Kelvin temperature to Fahrenheit.
pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    kelvin * 9.0 / 5.0 - 459.67
}

/// Parses one raw input line. Trailing `\r` and surrounding blanks are ignored.
pub fn parse_line(line: &str) -> Result<Observation, ParseError> {
    Observation::from_fields(line.split('\t'))
}

impl Observation {
    /// Builds an observation from a tab-delimited `csv` record.
    pub fn from_record(record: &StringRecord) -> Result<Self, ParseError> {
        Self::from_fields(record.iter())
    }

    fn from_fields<'a>(fields: impl Iterator<Item = &'a str>) -> Result<Self, ParseError> {
        let mut tok = [""; FIELD_COUNT];
        let mut found = 0;
        for field in fields.take(FIELD_COUNT) {
            tok[found] = field.trim();
            found += 1;
        }
        if found < FIELD_COUNT {
            return Err(ParseError::MissingFields { found });
        }

        let state_code = tok[0];
        if state_code.is_empty() {
            return Err(ParseError::EmptyStateCode);
        }

        let timestamp_ms: i64 = number("timestamp", tok[1])?;
        // tok[2] is the geohash, not needed for aggregation
        let humidity: f64 = measurement("humidity", tok[3])?;
        let snow: f64 = measurement("snow", tok[4])?;
        let cloud_cover: f64 = measurement("cloud_cover", tok[5])?;
        let lightning: f64 = measurement("lightning", tok[6])?;
        let _pressure: f64 = measurement("pressure", tok[7])?;
        let kelvin: f64 = measurement("temperature", tok[8])?;

        Ok(Self {
            state_code: state_code.to_string(),
            timestamp: timestamp_ms / 1000,
            humidity,
            has_snow: snow != 0.0,
            cloud_cover,
            has_lightning: lightning != 0.0,
            temperature_f: kelvin_to_fahrenheit(kelvin),
        })
    }
}

impl FromStr for Observation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_line(s)
    }
}

fn number<T: FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Like [`number`], but `NaN` and infinities are rejected.
fn measurement(field: &'static str, value: &str) -> Result<f64, ParseError> {
    let v: f64 = number(field, value)?;
    if !v.is_finite() {
        return Err(ParseError::NonFinite {
            field,
            value: value.to_string(),
        });
    }
    Ok(v)
}
