use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque job identifier issued by a remote processing service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The workflow a job belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    TerrainProfile,
    ElevationProfile,
    PrintRender,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::TerrainProfile => "terrain-profile",
            JobKind::ElevationProfile => "elevation-profile",
            JobKind::PrintRender => "print-render",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JobStatus {
    #[default]
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Succeeded and Failed admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Resetting back to `NotStarted` is an external action and is not
    /// modelled as a transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::NotStarted, JobStatus::Running)
                | (JobStatus::NotStarted, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Succeeded)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

/// Job status vocabulary of the ArcGIS geoprocessing REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteJobStatus {
    #[serde(rename = "esriJobNew")]
    New,
    #[serde(rename = "esriJobSubmitted")]
    Submitted,
    #[serde(rename = "esriJobWaiting")]
    Waiting,
    #[serde(rename = "esriJobExecuting")]
    Executing,
    #[serde(rename = "esriJobSucceeded")]
    Succeeded,
    #[serde(rename = "esriJobFailed")]
    Failed,
    #[serde(rename = "esriJobCancelling")]
    Cancelling,
    #[serde(rename = "esriJobCancelled")]
    Cancelled,
    #[serde(rename = "esriJobTimedOut")]
    TimedOut,
    #[serde(other)]
    Unknown,
}

impl From<RemoteJobStatus> for JobStatus {
    fn from(remote: RemoteJobStatus) -> Self {
        match remote {
            RemoteJobStatus::Succeeded => JobStatus::Succeeded,
            RemoteJobStatus::Failed | RemoteJobStatus::Cancelled | RemoteJobStatus::TimedOut => {
                JobStatus::Failed
            }
            // Unknown values keep the loop polling
            RemoteJobStatus::New
            | RemoteJobStatus::Submitted
            | RemoteJobStatus::Waiting
            | RemoteJobStatus::Executing
            | RemoteJobStatus::Cancelling
            | RemoteJobStatus::Unknown => JobStatus::Running,
        }
    }
}

/// One status observation from a remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    pub messages: Vec<String>,
}

impl StatusReport {
    pub fn new(status: JobStatus) -> Self {
        Self { status, messages: Vec::new() }
    }

    pub fn with_messages(mut self, messages: Vec<String>) -> Self {
        self.messages = messages;
        self
    }
}

/// A long-running remote job and the request that produced it
#[derive(Debug, Clone, Serialize)]
pub struct GeoprocessingJob<Req, Res> {
    /// Remote identifier, assigned once the submit call returns
    pub id: Option<JobId>,

    pub kind: JobKind,

    pub status: JobStatus,

    /// Payload that produced this job
    pub request: Req,

    /// Present only when `status` is `Succeeded`
    pub result: Option<Res>,

    /// Submission sequence number within the owning controller
    pub generation: u64,

    /// Messages reported by the remote service
    pub messages: Vec<String>,

    pub submitted_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,
}

impl<Req, Res> GeoprocessingJob<Req, Res> {
    pub fn new(kind: JobKind, request: Req, generation: u64) -> Self {
        Self {
            id: None,
            kind,
            status: JobStatus::NotStarted,
            request,
            result: None,
            generation,
            messages: Vec::new(),
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record the remote identifier and enter `Running`
    pub fn start(&mut self, id: JobId) {
        self.id = Some(id);
        self.status = JobStatus::Running;
    }

    /// Enter `Succeeded` with the fetched result
    pub fn succeed(&mut self, result: Res) {
        self.status = JobStatus::Succeeded;
        self.result = Some(result);
        self.finished_at = Some(Utc::now());
    }

    /// Enter `Failed`, keeping whatever the service reported
    pub fn fail(&mut self, messages: Vec<String>) {
        self.status = JobStatus::Failed;
        self.result = None;
        self.messages.extend(messages);
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_mapping() {
        let parse = |s: &str| -> RemoteJobStatus {
            serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
        };

        assert_eq!(JobStatus::from(parse("esriJobSubmitted")), JobStatus::Running);
        assert_eq!(JobStatus::from(parse("esriJobWaiting")), JobStatus::Running);
        assert_eq!(JobStatus::from(parse("esriJobExecuting")), JobStatus::Running);
        assert_eq!(JobStatus::from(parse("esriJobSucceeded")), JobStatus::Succeeded);
        assert_eq!(JobStatus::from(parse("esriJobFailed")), JobStatus::Failed);
        assert_eq!(JobStatus::from(parse("esriJobCancelled")), JobStatus::Failed);
        assert_eq!(parse("somethingNew"), RemoteJobStatus::Unknown);
        assert_eq!(JobStatus::from(RemoteJobStatus::Unknown), JobStatus::Running);
    }

    #[test]
    fn test_state_machine_edges() {
        assert!(JobStatus::NotStarted.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Succeeded));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Failed));

        assert!(!JobStatus::Succeeded.can_transition_to(JobStatus::Running));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Succeeded));
        assert!(!JobStatus::NotStarted.can_transition_to(JobStatus::Succeeded));
    }

    #[test]
    fn test_job_lifecycle_keeps_result_invariant() {
        let mut job: GeoprocessingJob<(), u32> = GeoprocessingJob::new(JobKind::TerrainProfile, (), 1);
        assert_eq!(job.status, JobStatus::NotStarted);
        assert!(job.result.is_none());

        job.start(JobId::new("abc"));
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.result.is_none());

        job.succeed(42);
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.result, Some(42));
        assert!(job.finished_at.is_some());
    }
}
