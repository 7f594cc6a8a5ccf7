//! Resolution/scale conversion and standard scale selection

use crate::crs::CrsFamily;
use geoflow_core::error::{GeoflowError, Result};
use serde::{Deserialize, Serialize};

/// Inches in one meter as used by the OGC scale conventions
pub const INCHES_PER_METER: f64 = 39.37;

/// OGC/WMTS "standardized rendering pixel" of 0.28 mm, expressed as DPI
pub const DEFAULT_DPI: f64 = 25.4 / 0.28;

/// Standard print/display scale denominators
pub const STANDARD_SCALES: [f64; 13] = [
    250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0, 250000.0,
    500000.0, 1000000.0, 2500000.0,
];

const EARTH_RADIUS: f64 = 6378137.0;

/// Linear units a projection can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinearUnit {
    Meters,
    Kilometers,
    Feet,
    UsFeet,
    Degrees,
}

impl LinearUnit {
    /// Parse the short unit names used by projection libraries
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "meters" | "metre" | "metres" => Ok(LinearUnit::Meters),
            "km" | "kilometers" => Ok(LinearUnit::Kilometers),
            "ft" | "feet" => Ok(LinearUnit::Feet),
            "us-ft" | "us_ft" => Ok(LinearUnit::UsFeet),
            "degrees" | "degree" | "dd" => Ok(LinearUnit::Degrees),
            _ => Err(GeoflowError::invalid_input(
                "unit",
                format!("Unknown linear unit: {}. Use m, km, ft, us-ft or degrees", s),
            )),
        }
    }

    pub fn meters_per_unit(&self) -> f64 {
        match self {
            LinearUnit::Meters => 1.0,
            LinearUnit::Kilometers => 1000.0,
            LinearUnit::Feet => 0.3048,
            LinearUnit::UsFeet => 1200.0 / 3937.0,
            LinearUnit::Degrees => 2.0 * std::f64::consts::PI * EARTH_RADIUS / 360.0,
        }
    }

    pub fn inches_per_unit(&self) -> f64 {
        self.meters_per_unit() * INCHES_PER_METER
    }
}

/// Converts between view resolution (map units per pixel) and scale denominator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleConverter {
    dpi: f64,
}

impl Default for ScaleConverter {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl ScaleConverter {
    pub fn new(dpi: f64) -> Result<Self> {
        if !dpi.is_finite() || dpi <= 0.0 {
            return Err(GeoflowError::invalid_input("dpi", format!("must be positive, got {}", dpi)));
        }
        Ok(Self { dpi })
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// `scale = inches_per_unit × dpi × resolution`
    pub fn scale_from_resolution(&self, resolution: f64, unit: LinearUnit) -> f64 {
        unit.inches_per_unit() * self.dpi * resolution
    }

    /// Inverse of [`ScaleConverter::scale_from_resolution`].
    ///
    /// Fails with `MissingUnitDefinition` when the active projection has no
    /// meters-per-unit value.
    pub fn resolution_from_scale(&self, scale: f64, meters_per_unit: Option<f64>) -> Result<f64> {
        let meters_per_unit = meters_per_unit.ok_or(GeoflowError::MissingUnitDefinition)?;
        Ok(scale / (meters_per_unit * INCHES_PER_METER * self.dpi))
    }
}

/// Ascending table of standard scale denominators
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleTable {
    scales: Vec<f64>,
}

impl Default for ScaleTable {
    fn default() -> Self {
        Self { scales: STANDARD_SCALES.to_vec() }
    }
}

impl ScaleTable {
    /// Build a table, requiring at least one finite and strictly increasing value
    pub fn new(scales: Vec<f64>) -> Result<Self> {
        if scales.is_empty() {
            return Err(GeoflowError::InvalidScaleTable { reason: "table is empty".to_string() });
        }
        if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(GeoflowError::InvalidScaleTable {
                reason: "scales must be positive finite numbers".to_string(),
            });
        }
        if scales.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GeoflowError::InvalidScaleTable {
                reason: "scales must be strictly increasing".to_string(),
            });
        }
        Ok(Self { scales })
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn min(&self) -> f64 {
        self.scales[0]
    }

    pub fn max(&self) -> f64 {
        self.scales[self.scales.len() - 1]
    }

    /// Pick the standard scale for a continuous `scale`.
    ///
    /// Values outside the table clamp to its bounds. Inside, the web family
    /// rounds down to the largest entry `<= scale` and every other family
    /// rounds up to the smallest entry `>= scale`.
    pub fn nearest(&self, scale: f64, family: CrsFamily) -> Result<f64> {
        if scale.is_nan() {
            return Err(GeoflowError::invalid_input("scale", "scale is NaN"));
        }
        if scale <= self.min() {
            return Ok(self.min());
        }
        if scale >= self.max() {
            return Ok(self.max());
        }

        // First index whose entry is >= scale; bounded by the clamps above
        let idx = self.scales.partition_point(|s| *s < scale);
        let selected = match family {
            CrsFamily::Web if self.scales[idx] == scale => self.scales[idx],
            CrsFamily::Web => self.scales[idx - 1],
            CrsFamily::Regional => self.scales[idx],
        };
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scale_from_resolution_meters() {
        let converter = ScaleConverter::default();
        let scale = converter.scale_from_resolution(2.0, LinearUnit::Meters);
        assert!((scale - 39.37 * DEFAULT_DPI * 2.0).abs() < 1e-9);
        assert_eq!(scale.round(), 7143.0);
    }

    #[test]
    fn test_missing_unit_definition() {
        let converter = ScaleConverter::default();
        let result = converter.resolution_from_scale(25000.0, None);
        assert!(matches!(result, Err(GeoflowError::MissingUnitDefinition)));
    }

    #[test]
    fn test_invalid_dpi() {
        assert!(ScaleConverter::new(0.0).is_err());
        assert!(ScaleConverter::new(f64::NAN).is_err());
        assert_eq!(ScaleConverter::new(96.0).unwrap().dpi(), 96.0);
    }

    #[test]
    fn test_nearest_branches() {
        let table = ScaleTable::default();
        assert_eq!(table.nearest(12000.0, CrsFamily::Regional).unwrap(), 25000.0);
        assert_eq!(table.nearest(12000.0, CrsFamily::Web).unwrap(), 10000.0);
    }

    #[test]
    fn test_nearest_clamps() {
        let table = ScaleTable::default();
        for family in [CrsFamily::Web, CrsFamily::Regional] {
            assert_eq!(table.nearest(10.0, family).unwrap(), 250.0);
            assert_eq!(table.nearest(9.0e7, family).unwrap(), 2500000.0);
        }
        assert!(table.nearest(f64::NAN, CrsFamily::Web).is_err());
    }

    #[test]
    fn test_nearest_is_idempotent_on_table_values() {
        let table = ScaleTable::default();
        for &s in table.scales() {
            assert_eq!(table.nearest(s, CrsFamily::Web).unwrap(), s);
            assert_eq!(table.nearest(s, CrsFamily::Regional).unwrap(), s);
        }
    }

    #[test]
    fn test_table_validation() {
        assert!(ScaleTable::new(vec![]).is_err());
        assert!(ScaleTable::new(vec![1000.0, 1000.0]).is_err());
        assert!(ScaleTable::new(vec![5000.0, 1000.0]).is_err());
        assert!(ScaleTable::new(vec![1000.0, 5000.0]).is_ok());
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(LinearUnit::parse("m").unwrap(), LinearUnit::Meters);
        assert_eq!(LinearUnit::parse("Degrees").unwrap(), LinearUnit::Degrees);
        assert!(LinearUnit::parse("furlong").is_err());
        assert_eq!(LinearUnit::Meters.inches_per_unit(), 39.37);
    }

    proptest! {
        #[test]
        fn prop_resolution_roundtrip(resolution in 1e-6f64..1e6, unit_idx in 0usize..5) {
            let units = [
                LinearUnit::Meters,
                LinearUnit::Kilometers,
                LinearUnit::Feet,
                LinearUnit::UsFeet,
                LinearUnit::Degrees,
            ];
            let unit = units[unit_idx];
            let converter = ScaleConverter::default();

            let scale = converter.scale_from_resolution(resolution, unit);
            let back = converter.resolution_from_scale(scale, Some(unit.meters_per_unit())).unwrap();
            prop_assert!((back - resolution).abs() <= resolution * 1e-9);
        }

        #[test]
        fn prop_nearest_stays_in_table(scale in 1.0f64..1e8) {
            let table = ScaleTable::default();
            for family in [CrsFamily::Web, CrsFamily::Regional] {
                let picked = table.nearest(scale, family).unwrap();
                prop_assert!(table.scales().contains(&picked));
            }
        }

        #[test]
        fn prop_web_rounds_down_regional_rounds_up(scale in 250.0f64..2500000.0) {
            let table = ScaleTable::default();
            prop_assert!(table.nearest(scale, CrsFamily::Web).unwrap() <= scale);
            prop_assert!(table.nearest(scale, CrsFamily::Regional).unwrap() >= scale);
        }
    }
}
