pub mod job;
pub mod print;
pub mod profile;

pub use job::{GeoprocessingJob, JobId, JobKind, JobStatus, RemoteJobStatus, StatusReport};
pub use print::{
    MapAttributes, PrintAttributes, PrintDownload, PrintPayload, PrintStatusReport, PrintTicket,
    TileMatrix, WmtsLayer,
};
pub use profile::{ElevationProfile, OutputSelector, ProfilePoint, ProfileRequest, ProfileSummary};
