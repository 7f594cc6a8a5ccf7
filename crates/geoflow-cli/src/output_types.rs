use geoflow_core::models::{ElevationProfile, JobStatus, PrintDownload, PrintPayload, ProfileSummary};
use geoflow_print::ScaleSource;
use serde::Serialize;
use tabled::Tabled;

/// Output for profile command
#[derive(Debug, Serialize)]
pub struct ProfileOutput {
    pub kind: String,
    pub job_id: String,
    pub status: JobStatus,
    pub sample_distance: f64,
    pub summary: Option<ProfileSummary>,
    pub messages: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ElevationProfile>,
}

/// Output for print command
#[derive(Debug, Serialize)]
pub struct PrintOutput {
    pub layout: String,
    pub scale: f64,
    pub scale_source: ScaleSource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<PrintDownload>,

    /// Present for dry runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PrintPayload>,
}

/// Output for scale command
#[derive(Debug, Serialize)]
pub struct ScaleOutput {
    pub crs: String,
    pub family: String,
    pub dpi: f64,
    pub resolution: f64,
    pub raw_scale: f64,
    pub nearest_scale: f64,
}

/// Output for transform command
#[derive(Debug, Serialize)]
pub struct TransformOutput {
    pub from: String,
    pub to: String,
    pub input: [f64; 2],
    pub output: [f64; 2],
}

/// One row of the crs listing
#[derive(Debug, Serialize, Tabled)]
pub struct CrsRow {
    #[tabled(rename = "Code")]
    pub code: String,

    #[tabled(rename = "Name")]
    pub name: String,

    #[tabled(rename = "Family")]
    pub family: String,

    #[tabled(rename = "Units")]
    pub units: String,

    #[tabled(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proj: Option<String>,
}

/// One row of the config listing
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,

    #[tabled(rename = "Value")]
    pub value: String,

    #[tabled(rename = "Source")]
    pub source: String,
}
