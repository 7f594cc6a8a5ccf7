//! Terrain and elevation profile models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which output parameter of the profile service to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputSelector {
    #[serde(rename = "output_points")]
    Points,
    #[serde(rename = "output_polyline")]
    Polyline,
}

impl OutputSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSelector::Points => "output_points",
            OutputSelector::Polyline => "output_polyline",
        }
    }
}

impl fmt::Display for OutputSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request submitted to a profile extraction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRequest {
    /// Drawn line vertices in `crs`
    pub coordinates: Vec<[f64; 2]>,

    /// Reference system code of the coordinates (e.g. "EPSG:25833")
    pub crs: String,

    /// Elevation model name understood by the service
    pub dem: String,

    /// Sampling interval in map units
    pub sample_distance: f64,
}

/// One sampled point along the profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Cumulative planar distance from the first sample
    pub distance: f64,
}

/// Result entity of a profile job: ordered samples with elevation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    /// Same interval that was sent with the request; used for axis labelling
    pub sample_distance: f64,

    pub points: Vec<ProfilePoint>,
}

/// Aggregate figures for a profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub min_z: f64,
    pub max_z: f64,
    pub ascent: f64,
    pub descent: f64,
    pub length: f64,
}

impl ElevationProfile {
    /// Build a profile from `(x, y, z)` samples, computing cumulative distance
    pub fn from_samples(sample_distance: f64, samples: impl IntoIterator<Item = [f64; 3]>) -> Self {
        let mut points: Vec<ProfilePoint> = Vec::new();
        for [x, y, z] in samples {
            let distance = match points.last() {
                Some(prev) => prev.distance + (x - prev.x).hypot(y - prev.y),
                None => 0.0,
            };
            points.push(ProfilePoint { x, y, z, distance });
        }
        Self { sample_distance, points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Min/max elevation, accumulated climb and drop, and total length
    pub fn summary(&self) -> Option<ProfileSummary> {
        let first = self.points.first()?;
        let mut summary = ProfileSummary {
            min_z: first.z,
            max_z: first.z,
            ascent: 0.0,
            descent: 0.0,
            length: self.points.last().map(|p| p.distance).unwrap_or(0.0),
        };

        for pair in self.points.windows(2) {
            let dz = pair[1].z - pair[0].z;
            if dz > 0.0 {
                summary.ascent += dz;
            } else {
                summary.descent -= dz;
            }
            summary.min_z = summary.min_z.min(pair[1].z);
            summary.max_z = summary.max_z.max(pair[1].z);
        }

        Some(summary)
    }
}
