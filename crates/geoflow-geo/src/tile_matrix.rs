//! Tile-matrix pyramid shared by every WMTS background layer

use geoflow_core::models::TileMatrix;
use std::sync::{Arc, LazyLock};

/// Number of zoom levels, 0 through 18
pub const PYRAMID_LEVELS: u32 = 19;

/// Scale denominator of level 0
pub const LEVEL0_SCALE_DENOMINATOR: f64 = 77371428.57142857;

/// Upper-left corner of level 0 in the UTM matrix sets
pub const TOP_LEFT_CORNER: [f64; 2] = [-2500000.0, 9045984.0];

pub const TILE_SIZE: u32 = 256;

static PYRAMID: LazyLock<Arc<[TileMatrix]>> = LazyLock::new(|| build_pyramid(PYRAMID_LEVELS));

/// Generate `levels` matrices from the halving/doubling recurrence
pub fn build_pyramid(levels: u32) -> Arc<[TileMatrix]> {
    (0..levels)
        .map(|z| {
            let cells = 1u64 << z;
            TileMatrix {
                identifier: z.to_string(),
                scale_denominator: LEVEL0_SCALE_DENOMINATOR / (cells as f64),
                top_left_corner: TOP_LEFT_CORNER,
                tile_size: [TILE_SIZE, TILE_SIZE],
                matrix_size: [cells, cells],
            }
        })
        .collect()
}

/// The process-wide pyramid; clones share one allocation
pub fn shared_pyramid() -> Arc<[TileMatrix]> {
    Arc::clone(&PYRAMID)
}
