//! Build, submit, and poll a print job

use crate::payload::{BuiltPayload, PayloadBuilder, PrintRequest};
use geoflow_core::config::LayeredConfig;
use geoflow_core::error::{GeoflowError, Result};
use geoflow_core::models::{JobId, JobKind, PrintDownload, PrintPayload};
use geoflow_jobs::orchestrator::{poll_bounded, PollPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use geoflow_jobs::ports::PrintService;
use geoflow_jobs::JobController;
use std::sync::Arc;

pub type PrintController = JobController<PrintPayload, PrintDownload>;

/// Print pipeline over a print service port
pub struct PrintPipeline<P>
where
    P: PrintService,
{
    service: P,
    builder: PayloadBuilder,
    controller: Arc<PrintController>,
    policy: PollPolicy,
}

impl<P> PrintPipeline<P>
where
    P: PrintService,
{
    pub fn new(service: P, builder: PayloadBuilder) -> Self {
        Self {
            service,
            builder,
            controller: Arc::new(JobController::new(JobKind::PrintRender, false)),
            policy: PollPolicy::bounded(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_ATTEMPTS),
        }
    }

    pub fn from_config(service: P, config: &LayeredConfig) -> Self {
        Self::new(service, PayloadBuilder::from_config(config))
            .with_policy(config.poll_interval(), config.print_max_attempts.value)
    }

    pub fn with_policy(mut self, interval: std::time::Duration, max_attempts: u32) -> Self {
        self.policy = PollPolicy::bounded(interval, max_attempts);
        self
    }

    pub fn service(&self) -> &P {
        &self.service
    }

    pub fn builder(&self) -> &PayloadBuilder {
        &self.builder
    }

    pub fn controller(&self) -> &Arc<PrintController> {
        &self.controller
    }

    /// Build the payload for `request` and run it to a download link
    pub async fn print(&self, request: &PrintRequest) -> Result<PrintDownload> {
        let built = self.builder.build(request)?;
        self.run(built).await
    }

    /// Submit an already built payload and poll for its download link.
    ///
    /// Exhausting the attempt budget yields `PrintTimeout`; a status the
    /// service marks as failed yields `JobFailed`.
    pub async fn run(&self, built: BuiltPayload) -> Result<PrintDownload> {
        let BuiltPayload { payload, .. } = built;
        let ticket = self.controller.begin(payload.clone());

        let print_ticket = match self.service.submit(&payload).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "Print submit failed");
                self.controller.publish_failure(&ticket, vec![e.to_string()]);
                return Err(e);
            }
        };

        let job_id = JobId::new(
            print_ticket
                .reference
                .clone()
                .unwrap_or_else(|| print_ticket.status_url.clone()),
        );
        self.controller.mark_running(&ticket, job_id.clone());

        let max_attempts = self.policy.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let status_url = print_ticket.status_url.as_str();
        let service = &self.service;
        let job = &job_id;

        let polled = poll_bounded(self.policy.interval, max_attempts, &ticket.cancel, |attempt| async move {
            let report = service.poll_status(status_url).await?;
            if let Some(link) = report.download() {
                return Ok(Some(PrintDownload {
                    download_url: link.to_string(),
                    status_url: status_url.to_string(),
                    attempts: attempt,
                }));
            }
            if report.is_failure() {
                return Err(GeoflowError::JobFailed {
                    job_id: job.to_string(),
                    messages: report.error.into_iter().collect(),
                });
            }
            tracing::debug!(job_id = %job, attempt, status = %report.status, "Print not ready");
            Ok(None)
        })
        .await;

        match polled {
            Ok(Some(download)) => {
                tracing::info!(job_id = %job_id, attempts = download.attempts, "Print ready");
                self.controller.publish_success(&ticket, download.clone());
                Ok(download)
            }
            Ok(None) => {
                let err = GeoflowError::PrintTimeout { attempts: max_attempts };
                self.controller.publish_failure(&ticket, vec![err.to_string()]);
                Err(err)
            }
            Err(GeoflowError::Cancelled) => Err(GeoflowError::Cancelled),
            Err(e) => {
                let messages = match &e {
                    GeoflowError::JobFailed { messages, .. } => messages.clone(),
                    other => vec![other.to_string()],
                };
                self.controller.publish_failure(&ticket, messages);
                Err(e)
            }
        }
    }

    /// Stop polling the current print job
    pub fn cancel(&self) {
        self.controller.reset();
    }
}
