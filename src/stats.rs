use chrono::{DateTime, Utc};

use crate::parser::Observation;

/// Running statistics for a single state code.
///
/// Only sums and counts are stored; means are derived on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct StateStats {
    pub code: String,
    pub record_count: u64,

    pub temperature_sum: f64,
    pub humidity_sum: f64,
    pub cloud_sum: f64,

    pub lightning_count: u64,
    pub snow_count: u64,

    pub max_temperature_f: f64,
    pub max_temperature_at: i64,
    pub min_temperature_f: f64,
    pub min_temperature_at: i64,
}

impl StateStats {
    /// Seeds every field from the first observation seen for a code.
    pub fn from_observation(obs: &Observation) -> Self {
        StateStats {
            code: obs.state_code.clone(),
            record_count: 1,
            temperature_sum: obs.temperature_f,
            humidity_sum: obs.humidity,
            cloud_sum: obs.cloud_cover,
            lightning_count: obs.has_lightning as u64,
            snow_count: obs.has_snow as u64,
            max_temperature_f: obs.temperature_f,
            max_temperature_at: obs.timestamp,
            min_temperature_f: obs.temperature_f,
            min_temperature_at: obs.timestamp,
        }
    }

    /// Folds one more observation into the running totals.
    ///
    /// Extrema move only on strict improvement, so on ties the first
    /// observation to reach the value keeps its timestamp.
    pub fn merge(&mut self, obs: &Observation) {
        debug_assert_eq!(self.code, obs.state_code);

        self.record_count += 1;
        self.temperature_sum += obs.temperature_f;
        self.humidity_sum += obs.humidity;
        self.cloud_sum += obs.cloud_cover;

        if obs.has_lightning {
            self.lightning_count += 1;
        }

        if obs.has_snow {
            self.snow_count += 1;
        }

        if obs.temperature_f > self.max_temperature_f {
            self.max_temperature_f = obs.temperature_f;
            self.max_temperature_at = obs.timestamp;
        }

        if obs.temperature_f < self.min_temperature_f {
            self.min_temperature_f = obs.temperature_f;
            self.min_temperature_at = obs.timestamp;
        }
    }

    /// Combines partial statistics for the same code, e.g. from another file.
    ///
    /// `self` is treated as the earlier partial result: it keeps its extrema on ties.
    pub fn combine(&mut self, other: &StateStats) {
        debug_assert_eq!(self.code, other.code);

        self.record_count += other.record_count;
        self.temperature_sum += other.temperature_sum;
        self.humidity_sum += other.humidity_sum;
        self.cloud_sum += other.cloud_sum;
        self.lightning_count += other.lightning_count;
        self.snow_count += other.snow_count;

        if other.max_temperature_f > self.max_temperature_f {
            self.max_temperature_f = other.max_temperature_f;
            self.max_temperature_at = other.max_temperature_at;
        }

        if other.min_temperature_f < self.min_temperature_f {
            self.min_temperature_f = other.min_temperature_f;
            self.min_temperature_at = other.min_temperature_at;
        }
    }

    pub fn mean(sum: f64, count: u64) -> f64 {
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    pub fn avg_temperature_f(&self) -> f64 {
        Self::mean(self.temperature_sum, self.record_count)
    }

    pub fn avg_humidity(&self) -> f64 {
        Self::mean(self.humidity_sum, self.record_count)
    }

    pub fn avg_cloud_cover(&self) -> f64 {
        Self::mean(self.cloud_sum, self.record_count)
    }

    /// Time of the maximum temperature, `None` if out of chrono's range.
    pub fn max_temperature_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.max_temperature_at, 0)
    }

    /// Time of the minimum temperature, `None` if out of chrono's range.
    pub fn min_temperature_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.min_temperature_at, 0)
    }
}
