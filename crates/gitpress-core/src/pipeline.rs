//! Build pipeline trait.

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::event::PushEvent;

/// The clone/build/publish procedure for one push event.
///
/// The job controller invokes this on a spawned task, never under its
/// bookkeeping locks. Implementations must be safe to re-run for the same
/// revision, and must publish atomically: a failed run may not leave the
/// output location looking like a successful one.
#[async_trait]
pub trait BuildPipeline: Send + Sync {
    async fn run(&self, event: &PushEvent) -> Result<(), PipelineError>;
}
