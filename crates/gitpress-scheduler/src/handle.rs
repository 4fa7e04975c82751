//! Per-submission lifecycle handle.

use gitpress_core::PipelineError;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Lifecycle notification for one submitted job.
#[derive(Debug)]
pub enum JobUpdate {
    /// The job took the running slot and the build pipeline was invoked.
    Started,
    /// The build pipeline finished successfully.
    Completed,
    /// The build pipeline failed.
    Failed(PipelineError),
    /// A newer submission displaced this job before it started.
    Aborted,
}

/// Terminal outcome of a submission.
#[derive(Debug)]
pub enum JobOutcome {
    Completed,
    Failed(PipelineError),
    Aborted,
}

/// Caller-side view of a submitted job.
///
/// Updates arrive in submission order and always end with a terminal one:
/// `Completed`, `Failed`, or `Aborted`.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    target_key: String,
    updates: mpsc::UnboundedReceiver<JobUpdate>,
}

impl JobHandle {
    pub(crate) fn new(
        id: Uuid,
        target_key: String,
        updates: mpsc::UnboundedReceiver<JobUpdate>,
    ) -> Self {
        Self {
            id,
            target_key,
            updates,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// Receive the next lifecycle update.
    pub async fn next(&mut self) -> Option<JobUpdate> {
        self.updates.recv().await
    }

    /// Drain updates until the job reaches a terminal state.
    pub async fn wait(mut self) -> JobOutcome {
        loop {
            match self.updates.recv().await {
                Some(JobUpdate::Started) => continue,
                Some(JobUpdate::Completed) => return JobOutcome::Completed,
                Some(JobUpdate::Failed(err)) => return JobOutcome::Failed(err),
                Some(JobUpdate::Aborted) => return JobOutcome::Aborted,
                // A controller torn down mid-build (process shutdown) counts
                // as superseded, not failed.
                None => return JobOutcome::Aborted,
            }
        }
    }
}
