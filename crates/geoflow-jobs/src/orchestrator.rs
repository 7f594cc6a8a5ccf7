//! Polling disciplines that drive a submitted job to completion
//!
//! Two variants exist. [`run_until_terminal`] polls without an attempt
//! ceiling and fetches the result once the job succeeds; [`poll_bounded`]
//! gives up after a fixed number of attempts. Both suspend on a timed delay
//! between attempts and stop at the next suspension point once their
//! cancellation token fires.

use crate::ports::GeoprocessingService;
use geoflow_core::error::{GeoflowError, Result};
use geoflow_core::models::{JobId, JobStatus, OutputSelector};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Interval and optional attempt ceiling for a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_POLL_INTERVAL)
    }
}

impl PollPolicy {
    pub fn unbounded(interval: Duration) -> Self {
        Self { interval, max_attempts: None }
    }

    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self { interval, max_attempts: Some(max_attempts) }
    }
}

/// Terminal result of an unbounded polling loop
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome<T> {
    Succeeded(T),
    Failed { messages: Vec<String> },
}

/// Sleep for `interval` unless cancelled first
async fn pause(interval: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GeoflowError::Cancelled),
        _ = tokio::time::sleep(interval) => Ok(()),
    }
}

/// Await `fut` unless cancelled first
async fn guarded<T>(fut: impl Future<Output = Result<T>>, cancel: &CancellationToken) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GeoflowError::Cancelled),
        res = fut => res,
    }
}

/// Poll `job_id` every `interval` until it is terminal.
///
/// Transient poll failures are logged and retried without limit. On success
/// the `selector` output is fetched exactly once; on failure nothing is
/// fetched.
pub async fn run_until_terminal<S>(
    service: &S,
    job_id: &JobId,
    selector: OutputSelector,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<JobOutcome<S::Output>>
where
    S: GeoprocessingService + ?Sized,
{
    let mut polls: u64 = 0;

    loop {
        pause(interval, cancel).await?;
        polls += 1;

        let report = match guarded(service.poll_once(job_id), cancel).await {
            Ok(report) => report,
            Err(e) if e.is_transient() => {
                tracing::warn!(job_id = %job_id, poll = polls, error = %e, "Status check failed, retrying");
                continue;
            }
            Err(e) => return Err(e),
        };

        match report.status {
            JobStatus::Succeeded => {
                tracing::info!(job_id = %job_id, polls, "Job succeeded, fetching {}", selector);
                let output = guarded(service.fetch_result(job_id, selector), cancel).await?;
                return Ok(JobOutcome::Succeeded(output));
            }
            JobStatus::Failed => {
                tracing::warn!(job_id = %job_id, polls, messages = ?report.messages, "Job failed");
                return Ok(JobOutcome::Failed { messages: report.messages });
            }
            JobStatus::Running | JobStatus::NotStarted => {
                tracing::debug!(job_id = %job_id, poll = polls, "Job still running");
            }
        }
    }
}

/// Run at most `max_attempts` attempts, `interval` apart.
///
/// `attempt` receives the 1-based attempt number and yields `Some` once the
/// job is done. Transient errors consume the attempt and the loop goes on;
/// other errors (explicit remote failure, cancellation) end it. Returns
/// `None` when every attempt came back empty.
pub async fn poll_bounded<T, F, Fut>(
    interval: Duration,
    max_attempts: u32,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<Option<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for n in 1..=max_attempts {
        pause(interval, cancel).await?;

        match guarded(attempt(n), cancel).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {
                tracing::debug!(attempt = n, max_attempts, "Not finished yet");
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(attempt = n, max_attempts, error = %e, "Status check failed");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::warn!(max_attempts, "Gave up polling after exhausting attempts");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FAST: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn test_bounded_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: Option<()> = poll_bounded(FAST, 10, &cancel, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .await
        .unwrap();

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_bounded_returns_first_success() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result = poll_bounded(FAST, 10, &cancel, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(if n == 3 { Some(n) } else { None }) }
        })
        .await
        .unwrap();

        assert_eq!(result, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bounded_counts_transport_errors_as_attempts() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: Option<u32> = poll_bounded(FAST, 4, &cancel, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GeoflowError::transport("checking print status", "connection refused")) }
        })
        .await
        .unwrap();

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_bounded_stops_on_remote_failure() {
        let cancel = CancellationToken::new();

        let result: Result<Option<u32>> = poll_bounded(FAST, 10, &cancel, |_| async {
            Err(GeoflowError::JobFailed { job_id: "p1".to_string(), messages: vec![] })
        })
        .await;

        assert!(matches!(result, Err(GeoflowError::JobFailed { .. })));
    }

    #[tokio::test]
    async fn test_bounded_cancelled_before_first_attempt() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<Option<()>> = poll_bounded(Duration::from_secs(60), 10, &cancel, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .await;

        assert!(matches!(result, Err(GeoflowError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_policies() {
        assert_eq!(PollPolicy::default().interval, Duration::from_millis(2000));
        assert_eq!(PollPolicy::default().max_attempts, None);
        assert_eq!(PollPolicy::bounded(FAST, 10).max_attempts, Some(10));
    }
}
