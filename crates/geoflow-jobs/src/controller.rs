//! Per-workflow owner of the "current" job
//!
//! Every submission takes a [`Ticket`] carrying a monotonically increasing
//! generation. Writes are accepted only from the ticket of the most recent
//! submission, so a superseded polling loop can never overwrite a newer
//! result regardless of the order in which loops finish. Starting a new
//! submission or resetting cancels the previous loop's token.

use geoflow_core::models::{GeoprocessingJob, JobId, JobKind, JobStatus};
use std::sync::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Proof of a submission, handed to the task that drives it
#[derive(Debug, Clone)]
pub struct Ticket {
    pub generation: u64,
    pub cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct ControllerState {
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// Owner of one workflow's current job and its published result
pub struct JobController<Req, Res> {
    kind: JobKind,
    disable_draw_while_running: bool,
    state: Mutex<ControllerState>,
    current: watch::Sender<Option<GeoprocessingJob<Req, Res>>>,
}

impl<Req, Res> JobController<Req, Res>
where
    Req: Clone,
    Res: Clone,
{
    pub fn new(kind: JobKind, disable_draw_while_running: bool) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            kind,
            disable_draw_while_running,
            state: Mutex::new(ControllerState::default()),
            current,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Start a new submission, superseding and cancelling the previous one
    pub fn begin(&self, request: Req) -> Ticket {
        let mut state = self.state.lock().unwrap();
        if let Some(previous) = state.cancel.take() {
            previous.cancel();
        }

        state.generation += 1;
        let cancel = CancellationToken::new();
        state.cancel = Some(cancel.clone());

        let job = GeoprocessingJob::new(self.kind, request, state.generation);
        self.current.send_replace(Some(job));

        tracing::debug!(kind = %self.kind, generation = state.generation, "Began job");
        Ticket { generation: state.generation, cancel }
    }

    /// Record the remote id and enter `Running`
    pub fn mark_running(&self, ticket: &Ticket, job_id: JobId) -> bool {
        self.apply(ticket, JobStatus::Running, |job| job.start(job_id))
    }

    /// Publish a successful result
    pub fn publish_success(&self, ticket: &Ticket, result: Res) -> bool {
        self.apply(ticket, JobStatus::Succeeded, |job| job.succeed(result))
    }

    /// Publish a terminal failure
    pub fn publish_failure(&self, ticket: &Ticket, messages: Vec<String>) -> bool {
        self.apply(ticket, JobStatus::Failed, |job| job.fail(messages))
    }

    /// Clear the current job back to `NotStarted` and stop its loop
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }
        // Bump so that tickets issued before the reset are stale
        state.generation += 1;
        self.current.send_replace(None);
        tracing::debug!(kind = %self.kind, "Reset job state");
    }

    fn apply(
        &self,
        ticket: &Ticket,
        next: JobStatus,
        update: impl FnOnce(&mut GeoprocessingJob<Req, Res>),
    ) -> bool {
        let state = self.state.lock().unwrap();
        if ticket.generation != state.generation {
            tracing::debug!(
                kind = %self.kind,
                stale = ticket.generation,
                current = state.generation,
                "Dropping publish from superseded job"
            );
            return false;
        }

        self.current.send_if_modified(|current| match current {
            Some(job) if job.status.can_transition_to(next) => {
                update(job);
                true
            }
            Some(job) => {
                tracing::warn!(
                    kind = %self.kind,
                    from = ?job.status,
                    to = ?next,
                    "Ignoring illegal job transition"
                );
                false
            }
            None => false,
        })
    }

    /// Generation of the most recent submission or reset
    pub fn generation(&self) -> u64 {
        self.state.lock().unwrap().generation
    }

    pub fn snapshot(&self) -> Option<GeoprocessingJob<Req, Res>> {
        self.current.borrow().clone()
    }

    pub fn status(&self) -> JobStatus {
        self.current.borrow().as_ref().map(|job| job.status).unwrap_or_default()
    }

    pub fn result(&self) -> Option<Res> {
        self.current.borrow().as_ref().and_then(|job| job.result.clone())
    }

    /// Observe every change to the current job
    pub fn subscribe(&self) -> watch::Receiver<Option<GeoprocessingJob<Req, Res>>> {
        self.current.subscribe()
    }

    /// Whether the drawing interaction producing new geometries should be enabled
    pub fn draw_enabled(&self) -> bool {
        !(self.disable_draw_while_running && self.status() == JobStatus::Running)
    }

    /// Wait until the job of `generation` is terminal.
    ///
    /// Returns `None` when that job is superseded or reset first.
    pub async fn wait_terminal(&self, generation: u64) -> Option<GeoprocessingJob<Req, Res>> {
        let mut rx = self.current.subscribe();
        let current = rx
            .wait_for(|current| match current {
                Some(job) => job.generation != generation || job.status.is_terminal(),
                None => true,
            })
            .await
            .ok()?
            .clone();

        current.filter(|job| job.generation == generation)
    }
}
