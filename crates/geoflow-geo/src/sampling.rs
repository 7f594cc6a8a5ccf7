//! Sampling interval selection for profile requests

use geo::{Euclidean, Length, LineString};
use geoflow_core::error::{GeoflowError, Result};

/// Upper bound on the number of samples a profile should contain
pub const MAX_SAMPLES: f64 = 200.0;

/// Allowed sampling intervals in map units
pub const SAMPLE_DISTANCES: [f64; 12] =
    [1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 10000.0, 100000.0];

/// Ascending table of allowed sampling intervals
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDistanceTable {
    distances: Vec<f64>,
}

impl Default for SampleDistanceTable {
    fn default() -> Self {
        Self { distances: SAMPLE_DISTANCES.to_vec() }
    }
}

impl SampleDistanceTable {
    pub fn new(distances: Vec<f64>) -> Result<Self> {
        if distances.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(GeoflowError::invalid_input(
                "sample distances",
                "intervals must be positive finite numbers",
            ));
        }
        if distances.is_empty() || distances.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GeoflowError::invalid_input(
                "sample distances",
                "table must be non-empty and strictly increasing",
            ));
        }
        Ok(Self { distances })
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Smallest interval that keeps `length` within `MAX_SAMPLES` samples,
    /// clamped to the largest interval.
    pub fn select(&self, length: f64) -> Result<f64> {
        if !length.is_finite() || length < 0.0 {
            return Err(GeoflowError::invalid_input(
                "line length",
                format!("must be a non-negative finite number, got {}", length),
            ));
        }

        let raw = length / MAX_SAMPLES;
        let selected = self
            .distances
            .iter()
            .copied()
            .find(|d| *d >= raw)
            .unwrap_or(self.distances[self.distances.len() - 1]);

        tracing::debug!(length, raw, selected, "Selected sample distance");
        Ok(selected)
    }
}

/// Select a sampling interval from the default table
pub fn sample_distance(length: f64) -> Result<f64> {
    SampleDistanceTable::default().select(length)
}

/// Planar length of a drawn line in its own map units
pub fn line_length(line: &LineString<f64>) -> f64 {
    Euclidean.length(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_lines_use_finest_interval() {
        for length in [0.0, 1.0, 150.0, 199.999, 200.0] {
            assert_eq!(sample_distance(length).unwrap(), 1.0, "length {}", length);
        }
    }

    #[test]
    fn test_boundary_exactness_at_each_threshold() {
        let table = SampleDistanceTable::default();
        let distances = table.distances();

        for pair in distances.windows(2) {
            let threshold = pair[0] * MAX_SAMPLES;
            assert_eq!(table.select(threshold).unwrap(), pair[0], "at {}", threshold);
            assert_eq!(table.select(threshold + 1e-6).unwrap(), pair[1], "above {}", threshold);
        }
        assert_eq!(distances.len() - 1, 11);
    }

    #[test]
    fn test_exact_table_hit() {
        assert_eq!(sample_distance(2000.0).unwrap(), 10.0);
    }

    #[test]
    fn test_long_lines_clamp_to_maximum() {
        assert_eq!(sample_distance(1.0e9).unwrap(), 100000.0);
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(sample_distance(-1.0).is_err());
        assert!(sample_distance(f64::NAN).is_err());
        assert!(sample_distance(f64::INFINITY).is_err());
    }

    #[test]
    fn test_table_rejects_bad_intervals() {
        assert!(SampleDistanceTable::new(vec![]).is_err());
        assert!(SampleDistanceTable::new(vec![5.0, 2.0]).is_err());
        assert!(SampleDistanceTable::new(vec![0.0, 1.0]).is_err());
        assert!(SampleDistanceTable::new(vec![-1.0, 1.0]).is_err());
        assert!(SampleDistanceTable::new(vec![1.0, f64::NAN]).is_err());
        assert!(SampleDistanceTable::new(vec![1.0, f64::INFINITY]).is_err());
        assert!(SampleDistanceTable::new(vec![1.0, 2.0]).is_ok());
    }

    #[test]
    fn test_line_length() {
        let line: LineString<f64> = vec![(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)].into();
        assert!((line_length(&line) - 11.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_selection_is_monotonic(a in 0.0f64..5e7, b in 0.0f64..5e7) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(sample_distance(lo).unwrap() <= sample_distance(hi).unwrap());
        }
    }
}
