//! Print payload construction
//!
//! A [`PrintRequest`] describes the map view as the user sees it. The
//! builder reprojects the center into the print service's reference
//! system, converts the view resolution into a standard scale, resolves
//! the background layer and layout, and attaches the shared tile pyramid.

use crate::layers::{layout_name, BackgroundLayerTable};
use geoflow_core::config::LayeredConfig;
use geoflow_core::error::{GeoflowError, Result};
use geoflow_core::models::{MapAttributes, PrintAttributes, PrintPayload};
use geoflow_geo::crs::CrsRegistry;
use geoflow_geo::scale::{ScaleConverter, ScaleTable};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_FORMAT: &str = "pdf";

/// The view to print
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintRequest {
    /// View center in `source_crs`
    pub center: [f64; 2],
    pub source_crs: String,

    /// View rotation in radians
    #[serde(default)]
    pub rotation_rad: f64,

    /// Map units per screen pixel; `None` when the view cannot report it
    pub resolution: Option<f64>,

    #[serde(default)]
    pub layout_token: String,

    #[serde(default)]
    pub background_id: String,

    pub dpi: Option<u32>,
    pub title: Option<String>,
}

impl PrintRequest {
    pub fn new(center: [f64; 2], source_crs: impl Into<String>) -> Self {
        Self {
            center,
            source_crs: source_crs.into(),
            rotation_rad: 0.0,
            resolution: None,
            layout_token: String::new(),
            background_id: String::new(),
            dpi: None,
            title: None,
        }
    }
}

/// Where the printed scale came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSource {
    /// Derived from the view resolution and snapped to the scale table
    Computed,
    /// Resolution or unit unavailable; configured default used
    Default,
}

/// A payload together with how its scale was chosen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltPayload {
    pub payload: PrintPayload,
    pub scale_source: ScaleSource,

    /// Unsnapped scale derived from the resolution, if any
    pub raw_scale: Option<f64>,
}

/// Builds print payloads for one print service configuration
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    registry: CrsRegistry,
    backgrounds: BackgroundLayerTable,
    scales: ScaleTable,
    converter: ScaleConverter,
    print_crs: String,
    default_scale: f64,
    dpi: u32,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::from_config(&LayeredConfig::default())
    }
}

impl PayloadBuilder {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            registry: CrsRegistry::with_defaults(),
            backgrounds: BackgroundLayerTable::default(),
            scales: ScaleTable::default(),
            converter: ScaleConverter::default(),
            print_crs: config.print_crs.value.clone(),
            default_scale: config.default_print_scale.value,
            dpi: config.print_dpi.value,
        }
    }

    pub fn with_registry(mut self, registry: CrsRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_scale_table(mut self, scales: ScaleTable) -> Self {
        self.scales = scales;
        self
    }

    pub fn print_crs(&self) -> &str {
        &self.print_crs
    }

    pub fn registry(&self) -> &CrsRegistry {
        &self.registry
    }

    pub fn build(&self, request: &PrintRequest) -> Result<BuiltPayload> {
        validate(request)?;

        let center = self
            .registry
            .transform_or_passthrough(&request.source_crs, &self.print_crs, request.center);
        let (scale, scale_source, raw_scale) = self.resolve_scale(request);
        let layer = self.backgrounds.resolve(&request.background_id, &self.print_crs);

        let payload = PrintPayload {
            layout: layout_name(&request.layout_token).to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            attributes: PrintAttributes {
                map: MapAttributes {
                    center,
                    projection: self.print_crs.clone(),
                    rotation: request.rotation_rad.to_degrees(),
                    scale,
                    dpi: request.dpi.unwrap_or(self.dpi),
                    layers: vec![layer],
                },
                title: request.title.clone(),
            },
        };

        tracing::debug!(
            layout = %payload.layout,
            scale,
            scale_source = ?scale_source,
            "Built print payload"
        );
        Ok(BuiltPayload { payload, scale_source, raw_scale })
    }

    /// Snap the view scale to the table, or fall back to the default scale
    fn resolve_scale(&self, request: &PrintRequest) -> (f64, ScaleSource, Option<f64>) {
        let unit = self.registry.get(&request.source_crs).and_then(|def| def.units.map(|u| (u, def.family)));

        let (resolution, (unit, family)) = match (request.resolution, unit) {
            (Some(resolution), Some(unit)) => (resolution, unit),
            (resolution, unit) => {
                tracing::warn!(
                    crs = %request.source_crs,
                    has_resolution = resolution.is_some(),
                    has_unit = unit.is_some(),
                    default_scale = self.default_scale,
                    "Cannot derive print scale, using default"
                );
                return (self.default_scale, ScaleSource::Default, None);
            }
        };

        let raw = self.converter.scale_from_resolution(resolution, unit);
        match self.scales.nearest(raw, family) {
            Ok(scale) => (scale, ScaleSource::Computed, Some(raw)),
            Err(e) => {
                tracing::warn!(raw_scale = raw, error = %e, "Scale lookup failed, using default");
                (self.default_scale, ScaleSource::Default, Some(raw))
            }
        }
    }
}

fn validate(request: &PrintRequest) -> Result<()> {
    if !request.center.iter().all(|v| v.is_finite()) {
        return Err(GeoflowError::invalid_input("center", "coordinates must be finite"));
    }
    if !request.rotation_rad.is_finite() {
        return Err(GeoflowError::invalid_input("rotation", "must be finite"));
    }
    if let Some(resolution) = request.resolution {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(GeoflowError::invalid_input(
                "resolution",
                format!("must be a positive number, got {}", resolution),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn request() -> PrintRequest {
        PrintRequest {
            resolution: Some(2.0),
            layout_token: "a3l".to_string(),
            background_id: "toporaster".to_string(),
            ..PrintRequest::new([262000.0, 6650000.0], "EPSG:25833")
        }
    }

    #[test]
    fn test_build_regional_view() {
        let built = PayloadBuilder::default().build(&request()).unwrap();
        let map = &built.payload.attributes.map;

        assert_eq!(built.scale_source, ScaleSource::Computed);
        assert_eq!(built.raw_scale.map(f64::round), Some(7143.0));
        assert_eq!(map.scale, 10000.0);
        assert_eq!(map.center, [262000.0, 6650000.0]);
        assert_eq!(map.projection, "EPSG:25833");
        assert_eq!(map.dpi, 128);
        assert_eq!(map.layers[0].layer, "toporaster");
        assert_eq!(map.layers[0].matrix_set, "utm33n");
        assert_eq!(built.payload.layout, "A3 landscape");
        assert_eq!(built.payload.output_format, "pdf");
    }

    #[test]
    fn test_web_view_rounds_down() {
        // 12000 sits between 10000 and 25000
        let resolution = 12000.0 / (39.37 * geoflow_geo::scale::DEFAULT_DPI);
        let req = PrintRequest {
            resolution: Some(resolution),
            ..PrintRequest::new([1_190_000.0, 8_380_000.0], "EPSG:3857")
        };
        let built = PayloadBuilder::default().build(&req).unwrap();
        assert_eq!(built.payload.attributes.map.scale, 10000.0);

        let regional = PrintRequest { source_crs: "EPSG:25833".to_string(), ..req };
        let built = PayloadBuilder::default().build(&regional).unwrap();
        assert_eq!(built.payload.attributes.map.scale, 25000.0);
    }

    #[test]
    fn test_missing_resolution_uses_default_scale() {
        let req = PrintRequest { resolution: None, ..request() };
        let built = PayloadBuilder::default().build(&req).unwrap();
        assert_eq!(built.scale_source, ScaleSource::Default);
        assert_eq!(built.payload.attributes.map.scale, 25000.0);
        assert!(built.raw_scale.is_none());
    }

    #[test]
    fn test_unknown_crs_passes_center_through() {
        let req = PrintRequest { source_crs: "EPSG:99999".to_string(), ..request() };
        let built = PayloadBuilder::default().build(&req).unwrap();
        let map = &built.payload.attributes.map;
        assert_eq!(map.center, [262000.0, 6650000.0]);
        assert_eq!(built.scale_source, ScaleSource::Default);
    }

    #[test]
    fn test_rotation_and_fallbacks() {
        let req = PrintRequest {
            rotation_rad: FRAC_PI_2,
            layout_token: "letter".to_string(),
            background_id: "satellite".to_string(),
            dpi: Some(300),
            title: Some("Trip".to_string()),
            ..request()
        };
        let built = PayloadBuilder::default().build(&req).unwrap();
        let map = &built.payload.attributes.map;
        assert!((map.rotation - 90.0).abs() < 1e-12);
        assert_eq!(map.layers[0].layer, "topo");
        assert_eq!(map.dpi, 300);
        assert_eq!(built.payload.layout, "A4 portrait");
        assert_eq!(built.payload.attributes.title.as_deref(), Some("Trip"));
    }

    #[test]
    fn test_rejects_bad_input() {
        let builder = PayloadBuilder::default();
        let nan_center = PrintRequest { center: [f64::NAN, 0.0], ..request() };
        assert!(builder.build(&nan_center).is_err());

        let zero_res = PrintRequest { resolution: Some(0.0), ..request() };
        assert!(matches!(builder.build(&zero_res), Err(GeoflowError::InvalidInput { .. })));
    }

    #[test]
    fn test_payload_wire_shape() {
        let built = PayloadBuilder::default().build(&request()).unwrap();
        let json = serde_json::to_value(&built.payload).unwrap();
        assert_eq!(json["layout"], "A3 landscape");
        assert_eq!(json["outputFormat"], "pdf");
        let layer = &json["attributes"]["map"]["layers"][0];
        assert_eq!(layer["type"], "WMTS");
        assert_eq!(layer["matrixSet"], "utm33n");
        assert_eq!(layer["matrices"].as_array().unwrap().len(), 19);
        assert!(json["attributes"].get("title").is_none());
    }
}
