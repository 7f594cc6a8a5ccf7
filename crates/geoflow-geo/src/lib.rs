//! Geoflow Geo - Reference systems, scale math, and tile pyramids
//!
//! This crate holds the cartographic transform engine: the coordinate
//! reference registry, resolution/scale conversion, nearest-scale and
//! sample-distance selection, and the shared WMTS tile-matrix pyramid.

pub mod crs;
pub mod sampling;
pub mod scale;
pub mod tile_matrix;

pub use crs::{CrsDefinition, CrsFamily, CrsRegistry, DatumShift, Ellipsoid, ProjectionKind};
pub use sampling::{line_length, sample_distance, SampleDistanceTable};
pub use scale::{LinearUnit, ScaleConverter, ScaleTable};
