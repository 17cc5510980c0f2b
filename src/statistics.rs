//! Summary statistics for mid-price series.
//!
//! # Key Features
//!
//! - **RunningStats**: Welford's online algorithm for mean/std, min/max
//! - **SeriesSummary**: per-input summary logged after each run and carried
//!   in batch reports
//!
//! # Usage
//!
//! ```
//! use lob_midprice::statistics::RunningStats;
//!
//! let mut stats = RunningStats::new();
//! for v in [11.0, 11.5, 11.5] {
//!     stats.update(v);
//! }
//! assert_eq!(stats.count, 3);
//! assert_eq!(stats.max, 11.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::features::MidPriceSeries;
use crate::types::Timestamp;

// ============================================================================
// Running Statistics (Welford's Algorithm)
// ============================================================================

/// Online algorithm for computing running mean and standard deviation.
///
/// Uses Welford's algorithm for numerical stability with long series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningStats {
    /// Number of observations
    pub count: u64,
    /// Running mean
    pub mean: f64,
    /// Running M2 (sum of squared differences from mean)
    m2: f64,
    /// Minimum value observed
    pub min: f64,
    /// Maximum value observed
    pub max: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    /// Create a new running statistics tracker.
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Update statistics with a new value.
    #[inline]
    pub fn update(&mut self, value: f64) {
        if !value.is_finite() {
            return; // Skip NaN/Inf values
        }

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Get the population variance.
    #[inline]
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Get the population standard deviation.
    #[inline]
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Merge another RunningStats into this one (parallel algorithm).
    ///
    /// Used to combine per-file statistics after a batch run.
    pub fn merge(&mut self, other: &RunningStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let combined_count = self.count + other.count;
        let delta = other.mean - self.mean;

        let combined_mean = self.mean + delta * (other.count as f64 / combined_count as f64);
        let combined_m2 = self.m2
            + other.m2
            + delta * delta * (self.count as f64 * other.count as f64 / combined_count as f64);

        self.count = combined_count;
        self.mean = combined_mean;
        self.m2 = combined_m2;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Check if any values have been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

// ============================================================================
// Series Summary
// ============================================================================

/// Summary of one mid-price series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of snapshots
    pub rows: usize,
    /// Timestamp of the first snapshot
    pub first_timestamp: Option<Timestamp>,
    /// Timestamp of the last snapshot
    pub last_timestamp: Option<Timestamp>,
    /// Mid-price statistics
    pub mid_price: RunningStats,
}

impl SeriesSummary {
    /// Summarise `series`.
    pub fn from_series(series: &MidPriceSeries) -> Self {
        let mut mid_price = RunningStats::new();
        series.mid_price.iter().for_each(|&v| mid_price.update(v));

        Self {
            rows: series.len(),
            first_timestamp: series.first_timestamp(),
            last_timestamp: series.last_timestamp(),
            mid_price,
        }
    }

    /// Covered time span in milliseconds.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        }
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        if self.mid_price.is_empty() {
            return format!("rows={} (no mid-prices)", self.rows);
        }
        format!(
            "rows={} span={}ms mid: min={:.4} max={:.4} mean={:.4} std={:.4}",
            self.rows,
            self.duration_ms().unwrap_or(0),
            self.mid_price.min,
            self.mid_price.max,
            self.mid_price.mean,
            self.mid_price.std()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats_new() {
        let stats = RunningStats::new();
        assert!(stats.is_empty());
        assert_eq!(stats.variance(), 0.0);
    }

    #[test]
    fn test_running_stats_multiple_values() {
        let mut stats = RunningStats::new();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.update(v);
        }
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std() - 2.0).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
    }

    #[test]
    fn test_running_stats_skip_nan() {
        let mut stats = RunningStats::new();
        stats.update(1.0);
        stats.update(f64::NAN);
        stats.update(f64::INFINITY);
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_running_stats_merge() {
        let mut a = RunningStats::new();
        let mut b = RunningStats::new();
        let mut all = RunningStats::new();
        for v in [1.0, 2.0, 3.0] {
            a.update(v);
            all.update(v);
        }
        for v in [10.0, 20.0] {
            b.update(v);
            all.update(v);
        }
        a.merge(&b);
        assert_eq!(a.count, all.count);
        assert!((a.mean - all.mean).abs() < 1e-9);
        assert!((a.variance() - all.variance()).abs() < 1e-9);
        assert_eq!(a.max, 20.0);

        let mut empty = RunningStats::new();
        empty.merge(&all);
        assert_eq!(empty.count, 5);
    }

    #[test]
    fn test_series_summary() {
        let series = MidPriceSeries {
            timestamps: vec![1_000, 1_500, 3_000],
            mid_price: vec![11.0, 11.5, 11.5],
        };
        let summary = SeriesSummary::from_series(&series);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.duration_ms(), Some(2_000));
        assert_eq!(summary.mid_price.min, 11.0);
        assert!(summary.summary().starts_with("rows=3 span=2000ms"));
    }

    #[test]
    fn test_series_summary_empty() {
        let summary = SeriesSummary::from_series(&MidPriceSeries::default());
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.duration_ms(), None);
        assert_eq!(summary.summary(), "rows=0 (no mid-prices)");
    }
}
