//! Terrain and elevation profile workflow
//!
//! Both profile kinds run through the same orchestration; they differ only in
//! the service they talk to, the output parameter they fetch, and whether
//! drawing is disabled while a job runs.

use crate::controller::{JobController, Ticket};
use crate::orchestrator::{run_until_terminal, JobOutcome, DEFAULT_POLL_INTERVAL};
use crate::ports::GeoprocessingService;
use geo::LineString;
use geoflow_core::config::LayeredConfig;
use geoflow_core::error::{GeoflowError, Result};
use geoflow_core::models::{
    ElevationProfile, GeoprocessingJob, JobId, JobKind, OutputSelector, ProfileRequest,
};
use geoflow_geo::sampling::{line_length, SampleDistanceTable};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Elevation model requested from the profile services
pub const DEFAULT_DEM: &str = "DTM";

pub type ProfileJob = GeoprocessingJob<ProfileRequest, ElevationProfile>;
pub type ProfileController = JobController<ProfileRequest, ElevationProfile>;

/// Per-kind parameters of a profile workflow
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileWorkflowConfig {
    pub kind: JobKind,
    pub service_url: String,
    pub output: OutputSelector,
    pub dem: String,
    pub disable_draw_while_running: bool,
    pub poll_interval: Duration,
}

impl ProfileWorkflowConfig {
    /// Terrain profile: point samples, drawing locked while the job runs
    pub fn terrain(service_url: impl Into<String>) -> Self {
        Self {
            kind: JobKind::TerrainProfile,
            service_url: service_url.into(),
            output: OutputSelector::Points,
            dem: DEFAULT_DEM.to_string(),
            disable_draw_while_running: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Elevation profile: polyline samples, drawing stays available
    pub fn elevation(service_url: impl Into<String>) -> Self {
        Self {
            kind: JobKind::ElevationProfile,
            service_url: service_url.into(),
            output: OutputSelector::Polyline,
            dem: DEFAULT_DEM.to_string(),
            disable_draw_while_running: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build the config for `kind` from resolved settings
    pub fn from_config(kind: JobKind, config: &LayeredConfig) -> Result<Self> {
        let base = match kind {
            JobKind::TerrainProfile => Self::terrain(config.terrain_service_url.value.clone()),
            JobKind::ElevationProfile => Self::elevation(config.elevation_service_url.value.clone()),
            JobKind::PrintRender => {
                return Err(GeoflowError::invalid_input("kind", "print is not a profile workflow"))
            }
        };
        Ok(base.with_poll_interval(config.poll_interval()))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// A started profile job whose polling loop runs in the background
#[derive(Debug)]
pub struct ProfileHandle {
    pub generation: u64,
    pub job_id: JobId,
    pub sample_distance: f64,
    pub task: JoinHandle<()>,
}

/// Orchestrates profile jobs for one workflow kind
pub struct ProfileWorkflow<S> {
    service: Arc<S>,
    controller: Arc<ProfileController>,
    config: ProfileWorkflowConfig,
    table: SampleDistanceTable,
}

impl<S> ProfileWorkflow<S>
where
    S: GeoprocessingService<Request = ProfileRequest, Output = Vec<[f64; 3]>> + 'static,
{
    pub fn new(service: Arc<S>, config: ProfileWorkflowConfig) -> Self {
        let controller = Arc::new(JobController::new(
            config.kind,
            config.disable_draw_while_running,
        ));
        Self {
            service,
            controller,
            config,
            table: SampleDistanceTable::default(),
        }
    }

    pub fn config(&self) -> &ProfileWorkflowConfig {
        &self.config
    }

    pub fn controller(&self) -> &Arc<ProfileController> {
        &self.controller
    }

    /// Derive the request for a drawn line.
    ///
    /// The sample distance is picked from the line's planar length so that
    /// at most 200 samples are requested.
    pub fn build_request(&self, line: &LineString<f64>, crs: &str) -> Result<ProfileRequest> {
        if line.0.len() < 2 {
            return Err(GeoflowError::invalid_input(
                "line",
                format!("need at least 2 vertices, got {}", line.0.len()),
            ));
        }

        let length = line_length(line);
        let sample_distance = self.table.select(length)?;
        tracing::debug!(length, sample_distance, "Selected sample distance");

        Ok(ProfileRequest {
            coordinates: line.coords().map(|c| [c.x, c.y]).collect(),
            crs: crs.to_string(),
            dem: self.config.dem.clone(),
            sample_distance,
        })
    }

    /// Submit a profile job for `line` and start polling it.
    ///
    /// Supersedes any job still running in this workflow. A failed submit
    /// is published as a failed job and returned as an error.
    pub async fn start(&self, line: &LineString<f64>, crs: &str) -> Result<ProfileHandle> {
        let request = self.build_request(line, crs)?;
        let sample_distance = request.sample_distance;
        let ticket = self.controller.begin(request.clone());

        let job_id = match self.service.submit(&request).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(kind = %self.config.kind, error = %e, "Profile submit failed");
                self.controller.publish_failure(&ticket, vec![e.to_string()]);
                return Err(e);
            }
        };
        self.controller.mark_running(&ticket, job_id.clone());

        let task = tokio::spawn(drive(
            self.service.clone(),
            self.controller.clone(),
            ticket.clone(),
            job_id.clone(),
            self.config.output,
            self.config.poll_interval,
            sample_distance,
        ));

        Ok(ProfileHandle {
            generation: ticket.generation,
            job_id,
            sample_distance,
            task,
        })
    }

    /// Wait for the job of `generation` to finish.
    ///
    /// `None` when it was superseded or reset first.
    pub async fn wait(&self, generation: u64) -> Option<ProfileJob> {
        self.controller.wait_terminal(generation).await
    }

    /// Abandon the current job and clear its result
    pub fn reset(&self) {
        self.controller.reset();
    }

    pub fn current(&self) -> Option<ProfileJob> {
        self.controller.snapshot()
    }

    pub fn draw_enabled(&self) -> bool {
        self.controller.draw_enabled()
    }
}

/// Background polling loop for one submitted job
async fn drive<S>(
    service: Arc<S>,
    controller: Arc<ProfileController>,
    ticket: Ticket,
    job_id: JobId,
    output: OutputSelector,
    interval: Duration,
    sample_distance: f64,
) where
    S: GeoprocessingService<Request = ProfileRequest, Output = Vec<[f64; 3]>>,
{
    let outcome = run_until_terminal(service.as_ref(), &job_id, output, interval, &ticket.cancel).await;

    match outcome {
        Ok(JobOutcome::Succeeded(samples)) => {
            let profile = ElevationProfile::from_samples(sample_distance, samples);
            tracing::info!(job_id = %job_id, points = profile.points.len(), "Profile ready");
            controller.publish_success(&ticket, profile);
        }
        Ok(JobOutcome::Failed { messages }) => {
            controller.publish_failure(&ticket, messages);
        }
        Err(GeoflowError::Cancelled) => {
            tracing::debug!(job_id = %job_id, generation = ticket.generation, "Polling cancelled");
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Profile polling aborted");
            controller.publish_failure(&ticket, vec![e.to_string()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geoflow_core::models::StatusReport;

    struct Unused;

    #[async_trait]
    impl GeoprocessingService for Unused {
        type Request = ProfileRequest;
        type Output = Vec<[f64; 3]>;

        async fn submit(&self, _request: &ProfileRequest) -> Result<JobId> {
            unreachable!()
        }

        async fn poll_once(&self, _job_id: &JobId) -> Result<StatusReport> {
            unreachable!()
        }

        async fn fetch_result(&self, _job_id: &JobId, _selector: OutputSelector) -> Result<Vec<[f64; 3]>> {
            unreachable!()
        }
    }

    fn workflow(config: ProfileWorkflowConfig) -> ProfileWorkflow<Unused> {
        ProfileWorkflow::new(Arc::new(Unused), config)
    }

    #[test]
    fn test_kind_defaults() {
        let terrain = ProfileWorkflowConfig::terrain("http://t");
        assert_eq!(terrain.output, OutputSelector::Points);
        assert!(terrain.disable_draw_while_running);
        assert_eq!(terrain.dem, "DTM");

        let elevation = ProfileWorkflowConfig::elevation("http://e");
        assert_eq!(elevation.output, OutputSelector::Polyline);
        assert!(!elevation.disable_draw_while_running);
    }

    #[test]
    fn test_from_config() {
        let config = LayeredConfig::default();
        let terrain = ProfileWorkflowConfig::from_config(JobKind::TerrainProfile, &config).unwrap();
        assert_eq!(terrain.service_url, config.terrain_service_url.value);
        assert_eq!(terrain.poll_interval, Duration::from_millis(2000));

        assert!(ProfileWorkflowConfig::from_config(JobKind::PrintRender, &config).is_err());
    }

    #[test]
    fn test_build_request_picks_sample_distance() {
        let wf = workflow(ProfileWorkflowConfig::terrain("http://t"));
        let line: LineString<f64> = vec![(0.0, 0.0), (1200.0, 0.0), (1200.0, 800.0)].into();

        let request = wf.build_request(&line, "EPSG:25833").unwrap();
        assert_eq!(request.sample_distance, 10.0);
        assert_eq!(request.coordinates.len(), 3);
        assert_eq!(request.dem, "DTM");
        assert_eq!(request.crs, "EPSG:25833");
    }

    #[test]
    fn test_build_request_rejects_single_vertex() {
        let wf = workflow(ProfileWorkflowConfig::elevation("http://e"));
        let line: LineString<f64> = vec![(0.0, 0.0)].into();
        assert!(matches!(
            wf.build_request(&line, "EPSG:25833"),
            Err(GeoflowError::InvalidInput { .. })
        ));
    }
}
