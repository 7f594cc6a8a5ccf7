//! Background layer and layout lookup tables

use geoflow_core::models::WmtsLayer;
use geoflow_geo::crs::normalize_code;
use geoflow_geo::tile_matrix::shared_pyramid;

/// Tile template of the national WMTS cache
pub const WMTS_BASE_URL: &str = "https://cache.kartverket.no/v1/wmts/1.0.0/\
{Layer}/{style}/{TileMatrixSet}/{TileMatrix}/{TileRow}/{TileCol}.png";

pub const DEFAULT_BACKGROUND: &str = "topo";
pub const DEFAULT_LAYOUT: &str = "A4 portrait";

/// Matrix set used when the print projection has no dedicated one
pub const DEFAULT_MATRIX_SET: &str = "utm33n";

/// A printable background map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundLayer {
    /// Identifier used by the map view
    pub id: &'static str,

    /// Layer name in the WMTS capabilities
    pub layer: &'static str,
}

const BACKGROUNDS: [BackgroundLayer; 6] = [
    BackgroundLayer { id: "topo", layer: "topo" },
    BackgroundLayer { id: "topograatone", layer: "topograatone" },
    BackgroundLayer { id: "toporaster", layer: "toporaster" },
    BackgroundLayer { id: "sjokartraster", layer: "sjokartraster" },
    BackgroundLayer { id: "norgeskart_bakgrunn", layer: "topo" },
    BackgroundLayer { id: "terreng", layer: "toporaster" },
];

const MATRIX_SETS: [(&str, &str); 4] = [
    ("EPSG:25832", "utm32n"),
    ("EPSG:25833", "utm33n"),
    ("EPSG:25835", "utm35n"),
    ("EPSG:3857", "webmercator"),
];

const LAYOUTS: [(&str, &str); 4] = [
    ("a4p", "A4 portrait"),
    ("a4l", "A4 landscape"),
    ("a3p", "A3 portrait"),
    ("a3l", "A3 landscape"),
];

/// Static mapping from background ids to WMTS layers
#[derive(Debug, Clone)]
pub struct BackgroundLayerTable {
    base_url: String,
    entries: Vec<BackgroundLayer>,
}

impl Default for BackgroundLayerTable {
    fn default() -> Self {
        Self {
            base_url: WMTS_BASE_URL.to_string(),
            entries: BACKGROUNDS.to_vec(),
        }
    }
}

impl BackgroundLayerTable {
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn get(&self, id: &str) -> Option<&BackgroundLayer> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Look up `id`, falling back to the default background
    pub fn lookup(&self, id: &str) -> BackgroundLayer {
        match self.get(id) {
            Some(entry) => *entry,
            None => {
                tracing::warn!(background = %id, fallback = DEFAULT_BACKGROUND, "Unknown background layer");
                BackgroundLayer { id: DEFAULT_BACKGROUND, layer: DEFAULT_BACKGROUND }
            }
        }
    }

    /// Describe background `id` for a map printed in `projection`
    pub fn resolve(&self, id: &str, projection: &str) -> WmtsLayer {
        let entry = self.lookup(id);
        WmtsLayer {
            layer_type: "WMTS".to_string(),
            base_url: self.base_url.clone(),
            layer: entry.layer.to_string(),
            matrix_set: matrix_set_for(projection).to_string(),
            image_format: "image/png".to_string(),
            style: "default".to_string(),
            request_encoding: "REST".to_string(),
            version: "1.0.0".to_string(),
            matrices: shared_pyramid(),
        }
    }
}

/// WMTS matrix set serving tiles in `projection`
pub fn matrix_set_for(projection: &str) -> &'static str {
    let code = normalize_code(projection);
    match MATRIX_SETS.iter().find(|(c, _)| *c == code) {
        Some((_, set)) => *set,
        None => {
            tracing::warn!(projection = %projection, fallback = DEFAULT_MATRIX_SET, "No matrix set for projection");
            DEFAULT_MATRIX_SET
        }
    }
}

/// Service layout name for a short layout token; unknown tokens map to A4 portrait
pub fn layout_name(token: &str) -> &'static str {
    let token = token.trim().to_ascii_lowercase();
    LAYOUTS
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_LAYOUT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_known_backgrounds() {
        let table = BackgroundLayerTable::default();
        assert_eq!(table.ids().count(), 6);
        assert_eq!(table.lookup("sjokartraster").layer, "sjokartraster");
        assert_eq!(table.lookup("topograatone").id, "topograatone");
    }

    #[test]
    fn test_unknown_background_falls_back() {
        let table = BackgroundLayerTable::default();
        let entry = table.lookup("satellite");
        assert_eq!(entry.id, "topo");
        assert_eq!(entry.layer, "topo");
    }

    #[test]
    fn test_matrix_sets() {
        assert_eq!(matrix_set_for("EPSG:25832"), "utm32n");
        assert_eq!(matrix_set_for("25833"), "utm33n");
        assert_eq!(matrix_set_for("epsg:25835"), "utm35n");
        assert_eq!(matrix_set_for("EPSG:3857"), "webmercator");
        assert_eq!(matrix_set_for("EPSG:4326"), "utm33n");
    }

    #[test]
    fn test_layouts() {
        assert_eq!(layout_name("a4p"), "A4 portrait");
        assert_eq!(layout_name("A4L"), "A4 landscape");
        assert_eq!(layout_name("a3p"), "A3 portrait");
        assert_eq!(layout_name("a3l"), "A3 landscape");
        assert_eq!(layout_name("a0x"), "A4 portrait");
        assert_eq!(layout_name(""), "A4 portrait");
    }

    #[test]
    fn test_layers_share_pyramid() {
        let table = BackgroundLayerTable::default();
        let a = table.resolve("topo", "EPSG:25833");
        let b = table.resolve("toporaster", "EPSG:25833");
        assert!(Arc::ptr_eq(&a.matrices, &b.matrices));
        assert_eq!(a.matrices.len(), 19);
        assert_eq!(a.matrix_set, "utm33n");
    }
}
