//! Async-job polling
//!
//! VM/NIC deletes and VM restarts return an opaque job handle; the poller
//! blocks the calling task, sleeping a fixed interval between status calls,
//! until the job reaches an accepted terminal status or the ceiling elapses.

use crate::api::JobApi;
use std::sync::Arc;
use std::time::Duration;
use stratus_common::{ApiError, AsyncJobHandle, JobStatus};
use tokio::time::{sleep, Instant};

/// Polls one job handle to completion
pub struct JobPoller {
    jobs: Arc<dyn JobApi>,
    interval: Duration,
    ceiling: Duration,
}

impl JobPoller {
    /// Poller with the given interval and ceiling
    pub fn new(jobs: Arc<dyn JobApi>, interval: Duration, ceiling: Duration) -> Self {
        Self {
            jobs,
            interval,
            ceiling,
        }
    }

    /// Block until the job reports one of `accept`, the job fails, or the
    /// ceiling elapses.
    pub async fn await_terminal(
        &self,
        handle: &AsyncJobHandle,
        accept: &[JobStatus],
    ) -> Result<JobStatus, JobWaitError> {
        let start = Instant::now();
        loop {
            let status = self.jobs.status(handle).await?;
            if accept.contains(&status) {
                return Ok(status);
            }
            if status == JobStatus::Failed {
                return Err(JobWaitError::JobFailed(handle.uri().to_string()));
            }
            if start.elapsed() >= self.ceiling {
                return Err(JobWaitError::CeilingExceeded {
                    uri: handle.uri().to_string(),
                    ceiling: self.ceiling,
                });
            }
            tracing::debug!(uri = handle.uri(), ?status, "job not terminal yet");
            sleep(self.interval).await;
        }
    }
}

/// Why a job wait ended without an accepted status
#[derive(Debug, thiserror::Error)]
pub enum JobWaitError {
    /// Status call failed
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The job reported `Failed`
    #[error("async job {0} failed remotely")]
    JobFailed(String),
    /// The job stayed non-terminal past the ceiling
    #[error("async job {uri} did not complete within {ceiling:?}")]
    CeilingExceeded {
        /// Job URI
        uri: String,
        /// Configured ceiling
        ceiling: Duration,
    },
}
