//! Geoflow Print - Map print payloads and the print job pipeline
//!
//! Turns a view (center, rotation, resolution, background, layout) into a
//! payload for the print rendering service, then submits it and polls the
//! service a bounded number of times for the download link.

pub mod layers;
pub mod payload;
pub mod pipeline;

pub use layers::{layout_name, BackgroundLayer, BackgroundLayerTable};
pub use payload::{BuiltPayload, PayloadBuilder, PrintRequest, ScaleSource};
pub use pipeline::PrintPipeline;
