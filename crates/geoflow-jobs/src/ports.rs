//! Remote service port definitions

use async_trait::async_trait;
use geoflow_core::error::Result;
use geoflow_core::models::{
    JobId, OutputSelector, PrintPayload, PrintStatusReport, PrintTicket, StatusReport,
};

/// Port for an asynchronous geoprocessing service (submit, poll, fetch)
#[async_trait]
pub trait GeoprocessingService: Send + Sync {
    /// Payload accepted by `submit`
    type Request: Send + Sync;

    /// Result produced by `fetch_result`
    type Output: Send;

    /// Submit a job and return its remote identifier
    async fn submit(&self, request: &Self::Request) -> Result<JobId>;

    /// Check the job status once
    async fn poll_once(&self, job_id: &JobId) -> Result<StatusReport>;

    /// Fetch one output parameter of a succeeded job
    async fn fetch_result(&self, job_id: &JobId, selector: OutputSelector) -> Result<Self::Output>;
}

/// Port for the map print rendering service
#[async_trait]
pub trait PrintService: Send + Sync {
    /// Submit a print payload; the ticket carries the status URL to poll
    async fn submit(&self, payload: &PrintPayload) -> Result<PrintTicket>;

    /// Check a print job's status once
    async fn poll_status(&self, status_url: &str) -> Result<PrintStatusReport>;
}
