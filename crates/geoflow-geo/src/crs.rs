//! Coordinate reference registry and datum-aware transforms
//!
//! Definitions are rendered as PROJ strings and handed to the `proj` crate.
//! The registry is filled once at startup; lookups never mutate it.

use crate::scale::LinearUnit;
use geo::{Coord, LineString};
use geoflow_core::error::{GeoflowError, Result};
use proj::Proj;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Oslo prime meridian offset from Greenwich, degrees east
pub const OSLO_MERIDIAN: f64 = 10.722916666666667;

/// ED50 to WGS84, Norway (EPSG:1612 parameters)
pub const ED50_TO_WGS84: DatumShift = DatumShift::Helmert7 {
    tx: -116.641,
    ty: -56.931,
    tz: -110.559,
    rx: 0.893,
    ry: 0.921,
    rz: -0.917,
    ds_ppm: -3.52,
};

/// NGO 1948 to WGS84 (EPSG:1654 parameters)
pub const NGO1948_TO_WGS84: DatumShift = DatumShift::Helmert7 {
    tx: 278.3,
    ty: 93.0,
    tz: 474.5,
    rx: 7.889,
    ry: 0.05,
    rz: -6.61,
    ds_ppm: 6.21,
};

/// NGO 1948 axis central meridians relative to Oslo, zones I through VIII
const NGO1948_CENTRAL_MERIDIANS: [(&str, f64); 8] = [
    ("I", -4.666666666666667),
    ("II", -2.333333333333333),
    ("III", 0.0),
    ("IV", 2.5),
    ("V", 6.166666666666667),
    ("VI", 10.16666666666667),
    ("VII", 14.16666666666667),
    ("VIII", 18.33333333333333),
];

/// Reference ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Ellipsoid {
    Wgs84,
    Grs80,
    International1924,
    /// Semi-major axis and inverse flattening
    Custom { a: f64, rf: f64 },
}

impl Ellipsoid {
    /// Modified Bessel ellipsoid of NGO 1948
    pub const NGO_BESSEL: Ellipsoid = Ellipsoid::Custom { a: 6377492.018, rf: 299.1528128 };

    fn proj_params(&self) -> String {
        match self {
            Ellipsoid::Wgs84 => "+ellps=WGS84".to_string(),
            Ellipsoid::Grs80 => "+ellps=GRS80".to_string(),
            Ellipsoid::International1924 => "+ellps=intl".to_string(),
            Ellipsoid::Custom { a, rf } => format!("+a={} +rf={}", a, rf),
        }
    }
}

/// Shift toward WGS84
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DatumShift {
    None,
    /// Position-vector Helmert: meters, arc-seconds, ppm
    Helmert7 {
        tx: f64,
        ty: f64,
        tz: f64,
        rx: f64,
        ry: f64,
        rz: f64,
        ds_ppm: f64,
    },
}

impl DatumShift {
    fn proj_params(&self) -> String {
        match self {
            DatumShift::None => "+towgs84=0,0,0,0,0,0,0".to_string(),
            DatumShift::Helmert7 { tx, ty, tz, rx, ry, rz, ds_ppm } => {
                format!("+towgs84={},{},{},{},{},{},{}", tx, ty, tz, rx, ry, rz, ds_ppm)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionKind {
    LongLat,
    WebMercator,
    Utm { zone: u8 },
    TransverseMercator {
        /// Relative to the definition's prime meridian
        central_meridian: f64,
        latitude_of_origin: f64,
        scale_factor: f64,
        false_easting: f64,
        false_northing: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimeMeridian {
    Oslo,
}

impl PrimeMeridian {
    pub fn offset_degrees(&self) -> f64 {
        match self {
            PrimeMeridian::Oslo => OSLO_MERIDIAN,
        }
    }
}

/// Tie-break family used by nearest-scale selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsFamily {
    /// Global web-map projections (web mercator, plain WGS84)
    Web,
    /// National and UTM grids
    Regional,
}

/// Immutable description of one reference system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsDefinition {
    pub code: String,
    pub name: String,
    pub projection: ProjectionKind,
    pub ellipsoid: Ellipsoid,
    pub datum_shift: DatumShift,
    pub prime_meridian: Option<PrimeMeridian>,
    pub family: CrsFamily,

    /// `None` when the projection has no known linear unit
    pub units: Option<LinearUnit>,
}

impl CrsDefinition {
    pub fn utm(code: &str, name: &str, zone: u8, ellipsoid: Ellipsoid, shift: DatumShift) -> Self {
        Self {
            code: normalize_code(code),
            name: name.to_string(),
            projection: ProjectionKind::Utm { zone },
            ellipsoid,
            datum_shift: shift,
            prime_meridian: None,
            family: CrsFamily::Regional,
            units: Some(LinearUnit::Meters),
        }
    }

    pub fn geographic(code: &str, name: &str, ellipsoid: Ellipsoid, shift: DatumShift) -> Self {
        Self {
            code: normalize_code(code),
            name: name.to_string(),
            projection: ProjectionKind::LongLat,
            ellipsoid,
            datum_shift: shift,
            prime_meridian: None,
            family: CrsFamily::Regional,
            units: Some(LinearUnit::Degrees),
        }
    }

    pub fn with_family(mut self, family: CrsFamily) -> Self {
        self.family = family;
        self
    }

    pub fn meters_per_unit(&self) -> Option<f64> {
        self.units.map(|u| u.meters_per_unit())
    }

    /// EPSG number, for services that address systems by well-known id
    pub fn wkid(&self) -> Option<u32> {
        self.code.strip_prefix("EPSG:").and_then(|n| n.parse().ok())
    }

    /// Render as a PROJ CRS string
    pub fn to_proj_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        match self.projection {
            ProjectionKind::LongLat => parts.push("+proj=longlat".to_string()),
            ProjectionKind::WebMercator => {
                // Spherical mercator on the WGS84 semi-major axis, no datum shift
                return "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 \
                        +k=1 +units=m +nadgrids=@null +wktext +no_defs +type=crs"
                    .to_string();
            }
            ProjectionKind::Utm { zone } => {
                parts.push(format!("+proj=utm +zone={}", zone));
            }
            ProjectionKind::TransverseMercator {
                central_meridian,
                latitude_of_origin,
                scale_factor,
                false_easting,
                false_northing,
            } => {
                parts.push(format!(
                    "+proj=tmerc +lat_0={} +lon_0={} +k={} +x_0={} +y_0={}",
                    latitude_of_origin, central_meridian, scale_factor, false_easting, false_northing
                ));
            }
        }

        if self.ellipsoid == Ellipsoid::Wgs84 && self.datum_shift == DatumShift::None {
            parts.push("+datum=WGS84".to_string());
        } else {
            parts.push(self.ellipsoid.proj_params());
            parts.push(self.datum_shift.proj_params());
        }

        if let Some(pm) = self.prime_meridian {
            parts.push(format!("+pm={}", pm.offset_degrees()));
        }

        match self.units {
            Some(LinearUnit::Meters) => parts.push("+units=m".to_string()),
            Some(LinearUnit::Kilometers) => parts.push("+units=km".to_string()),
            Some(LinearUnit::Feet) => parts.push("+units=ft".to_string()),
            Some(LinearUnit::UsFeet) => parts.push("+units=us-ft".to_string()),
            Some(LinearUnit::Degrees) | None => {}
        }

        parts.push("+no_defs +type=crs".to_string());
        parts.join(" ")
    }
}

/// Canonical registry key: `EPSG:<n>` for numeric or EPSG codes, uppercased otherwise
pub fn normalize_code(code: &str) -> String {
    let trimmed = code.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return format!("EPSG:{}", trimmed);
    }
    trimmed.to_uppercase()
}

/// Registry of reference systems addressable by code
#[derive(Debug, Clone, Default)]
pub struct CrsRegistry {
    definitions: BTreeMap<String, CrsDefinition>,
}

impl CrsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in family
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for definition in builtin_definitions() {
            registry.register(definition);
        }
        tracing::debug!(count = registry.len(), "Registered built-in reference systems");
        registry
    }

    /// Register a definition. Returns `false` and keeps the existing entry
    /// when the code is already registered.
    pub fn register(&mut self, definition: CrsDefinition) -> bool {
        let code = normalize_code(&definition.code);
        if self.definitions.contains_key(&code) {
            return false;
        }
        self.definitions.insert(code.clone(), CrsDefinition { code, ..definition });
        true
    }

    pub fn get(&self, code: &str) -> Option<&CrsDefinition> {
        self.definitions.get(&normalize_code(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &CrsDefinition> {
        self.definitions.values()
    }

    /// Registered codes in sorted order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Look up a code or fail with `UnknownReferenceSystem`
    pub fn require(&self, code: &str) -> Result<&CrsDefinition> {
        self.get(code).ok_or_else(|| GeoflowError::UnknownReferenceSystem {
            code: code.to_string(),
        })
    }

    /// Transform one point. Identical codes return the input untouched.
    pub fn transform(&self, source: &str, target: &str, point: [f64; 2]) -> Result<[f64; 2]> {
        let from = self.require(source)?;
        let to = self.require(target)?;
        if from.code == to.code {
            return Ok(point);
        }

        let proj = build_proj(from, to)?;
        convert(&proj, from, to, point)
    }

    /// Transform every vertex of a line
    pub fn transform_line(
        &self,
        source: &str,
        target: &str,
        line: &LineString<f64>,
    ) -> Result<LineString<f64>> {
        let from = self.require(source)?;
        let to = self.require(target)?;
        if from.code == to.code {
            return Ok(line.clone());
        }

        let proj = build_proj(from, to)?;
        let coords: Result<Vec<Coord<f64>>> = line
            .coords()
            .map(|c| convert(&proj, from, to, [c.x, c.y]).map(|[x, y]| Coord { x, y }))
            .collect();
        Ok(LineString::new(coords?))
    }

    /// Best-effort transform for cartographic metadata: on any failure the
    /// original point is returned and the failure is logged.
    pub fn transform_or_passthrough(&self, source: &str, target: &str, point: [f64; 2]) -> [f64; 2] {
        match self.transform(source, target, point) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(
                    source = %source,
                    target = %target,
                    error = %e,
                    "Transform failed, keeping untransformed point"
                );
                point
            }
        }
    }
}

fn build_proj(from: &CrsDefinition, to: &CrsDefinition) -> Result<Proj> {
    Proj::new_known_crs(&from.to_proj_string(), &to.to_proj_string(), None).map_err(|e| {
        GeoflowError::UnsupportedTransform {
            from: from.code.clone(),
            to: to.code.clone(),
            reason: format!("Failed to create projection: {}", e),
        }
    })
}

fn convert(proj: &Proj, from: &CrsDefinition, to: &CrsDefinition, point: [f64; 2]) -> Result<[f64; 2]> {
    let (x, y) = proj.convert((point[0], point[1])).map_err(|e| {
        GeoflowError::UnsupportedTransform {
            from: from.code.clone(),
            to: to.code.clone(),
            reason: format!("Projection failed: {}", e),
        }
    })?;
    if !x.is_finite() || !y.is_finite() {
        return Err(GeoflowError::UnsupportedTransform {
            from: from.code.clone(),
            to: to.code.clone(),
            reason: format!("Point ({}, {}) is outside the projection domain", point[0], point[1]),
        });
    }
    Ok([x, y])
}

/// Every built-in definition, family by family
pub fn builtin_definitions() -> Vec<CrsDefinition> {
    let mut defs = Vec::new();

    // Web and ETRS89 systems the workflows address directly
    defs.push(
        CrsDefinition::geographic("EPSG:4326", "WGS 84", Ellipsoid::Wgs84, DatumShift::None)
            .with_family(CrsFamily::Web),
    );
    defs.push(CrsDefinition {
        code: "EPSG:3857".to_string(),
        name: "WGS 84 / Pseudo-Mercator".to_string(),
        projection: ProjectionKind::WebMercator,
        ellipsoid: Ellipsoid::Wgs84,
        datum_shift: DatumShift::None,
        prime_meridian: None,
        family: CrsFamily::Web,
        units: Some(LinearUnit::Meters),
    });
    for zone in [32u8, 33, 35] {
        defs.push(CrsDefinition::utm(
            &format!("EPSG:258{}", zone),
            &format!("ETRS89 / UTM zone {}N", zone),
            zone,
            Ellipsoid::Grs80,
            DatumShift::None,
        ));
    }

    // WGS84 UTM zones 31-36
    for zone in 31u8..=36 {
        defs.push(CrsDefinition::utm(
            &format!("EPSG:326{}", zone),
            &format!("WGS 84 / UTM zone {}N", zone),
            zone,
            Ellipsoid::Wgs84,
            DatumShift::None,
        ));
    }

    // ED50 UTM zones 31-35 and ED50 geographic
    for zone in 31u8..=35 {
        defs.push(CrsDefinition::utm(
            &format!("EPSG:230{}", zone),
            &format!("ED50 / UTM zone {}N", zone),
            zone,
            Ellipsoid::International1924,
            ED50_TO_WGS84,
        ));
    }
    defs.push(CrsDefinition::geographic(
        "EPSG:4230",
        "ED50",
        Ellipsoid::International1924,
        ED50_TO_WGS84,
    ));

    // NGO 1948 axes I-VIII on the Oslo meridian
    for (idx, (axis, central_meridian)) in NGO1948_CENTRAL_MERIDIANS.iter().enumerate() {
        defs.push(CrsDefinition {
            code: format!("EPSG:{}", 27391 + idx),
            name: format!("NGO 1948 (Oslo) / NGO zone {}", axis),
            projection: ProjectionKind::TransverseMercator {
                central_meridian: *central_meridian,
                latitude_of_origin: 58.0,
                scale_factor: 1.0,
                false_easting: 0.0,
                false_northing: 0.0,
            },
            ellipsoid: Ellipsoid::NGO_BESSEL,
            datum_shift: NGO1948_TO_WGS84,
            prime_meridian: Some(PrimeMeridian::Oslo),
            family: CrsFamily::Regional,
            units: Some(LinearUnit::Meters),
        });
    }

    defs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_families_present() {
        let registry = CrsRegistry::with_defaults();

        for zone in 31..=36 {
            assert!(registry.contains(&format!("EPSG:326{}", zone)));
        }
        for zone in 31..=35 {
            assert!(registry.contains(&format!("EPSG:230{}", zone)));
        }
        assert!(registry.contains("EPSG:4230"));
        for code in 27391..=27398 {
            let def = registry.get(&format!("EPSG:{}", code)).unwrap();
            assert_eq!(def.prime_meridian, Some(PrimeMeridian::Oslo));
            assert_eq!(def.datum_shift, NGO1948_TO_WGS84);
        }
        assert_eq!(registry.len(), 2 + 3 + 6 + 6 + 8);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = CrsRegistry::with_defaults();
        let before = registry.get("EPSG:25833").unwrap().clone();

        let replacement = CrsDefinition::utm(
            "EPSG:25833",
            "something else",
            34,
            Ellipsoid::Wgs84,
            DatumShift::None,
        );
        assert!(!registry.register(replacement));
        assert_eq!(registry.get("EPSG:25833").unwrap(), &before);
    }

    #[test]
    fn test_code_normalization() {
        let registry = CrsRegistry::with_defaults();
        assert!(registry.contains("epsg:25833"));
        assert!(registry.contains("25833"));
        assert!(registry.contains(" EPSG:25833 "));
        assert_eq!(normalize_code("3857"), "EPSG:3857");
    }

    #[test]
    fn test_identity_transform_is_exact() {
        let registry = CrsRegistry::with_defaults();
        let p = [262144.123456789, 6649270.987654321];
        for def in registry.definitions() {
            assert_eq!(registry.transform(&def.code, &def.code, p).unwrap(), p);
        }
        // Different spellings of the same code also short-circuit
        assert_eq!(registry.transform("25833", "EPSG:25833", p).unwrap(), p);
    }

    #[test]
    fn test_unknown_code_fails() {
        let registry = CrsRegistry::with_defaults();
        let result = registry.transform("EPSG:9999", "EPSG:25833", [0.0, 0.0]);
        assert!(
            matches!(result, Err(GeoflowError::UnknownReferenceSystem { ref code }) if code == "EPSG:9999")
        );
        // Unknown codes fail even when both sides are equal
        assert!(registry.transform("EPSG:9999", "EPSG:9999", [0.0, 0.0]).is_err());
    }

    #[test]
    fn test_passthrough_keeps_point_on_failure() {
        let registry = CrsRegistry::with_defaults();
        let p = [10.0, 60.0];
        assert_eq!(registry.transform_or_passthrough("EPSG:1234", "EPSG:25833", p), p);
    }

    #[test]
    fn test_proj_strings() {
        let registry = CrsRegistry::with_defaults();

        let ed50 = registry.get("EPSG:23032").unwrap().to_proj_string();
        assert!(ed50.contains("+proj=utm +zone=32"));
        assert!(ed50.contains("+ellps=intl"));
        assert!(ed50.contains("+towgs84=-116.641,-56.931,-110.559,0.893,0.921,-0.917,-3.52"));

        let ngo = registry.get("EPSG:27393").unwrap().to_proj_string();
        assert!(ngo.contains("+proj=tmerc +lat_0=58 +lon_0=0"));
        assert!(ngo.contains("+pm=10.722916666666667"));
        assert!(ngo.contains("+a=6377492.018 +rf=299.1528128"));

        let wgs = registry.get("EPSG:32633").unwrap().to_proj_string();
        assert!(wgs.contains("+datum=WGS84"));
    }

    #[test]
    fn test_units_and_families() {
        let registry = CrsRegistry::with_defaults();
        assert_eq!(registry.get("EPSG:3857").unwrap().family, CrsFamily::Web);
        assert_eq!(registry.get("EPSG:4326").unwrap().family, CrsFamily::Web);
        assert_eq!(registry.get("EPSG:25833").unwrap().family, CrsFamily::Regional);
        assert_eq!(registry.get("EPSG:25833").unwrap().meters_per_unit(), Some(1.0));
        assert_eq!(registry.get("EPSG:4230").unwrap().units, Some(LinearUnit::Degrees));
        assert_eq!(registry.get("EPSG:25833").unwrap().wkid(), Some(25833));
    }
}
