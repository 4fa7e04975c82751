//! Error types for gitpress.

use std::path::PathBuf;
use thiserror::Error;

/// Rejection reasons for an inbound push notification.
///
/// A payload that trips any of these never becomes a push event and never
/// reaches the job controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no after")]
    MissingRevision,

    #[error("no ref")]
    MissingRef,

    #[error("no repository")]
    MissingRepository,

    #[error("no repository url")]
    MissingRepositoryUrl,

    #[error("bad repository url: {0}")]
    BadRepositoryUrl(String),

    #[error("bad repo name")]
    BadRepositoryName,

    #[error("no master branch")]
    MissingDefaultBranch,
}

/// Failures from the clone/build/publish pipeline.
///
/// These surface through the job's `failed` notification. They never disturb
/// controller bookkeeping and never block promotion of a queued job.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git {op} failed: {detail}")]
    Git { op: String, detail: String },

    #[error("no build manifest at {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("bad build manifest: {0}")]
    Manifest(String),

    #[error("build command exited with status {code:?}: {detail}")]
    BuildFailed { code: Option<i32>, detail: String },

    #[error("publish failed: {0}")]
    Publish(String),
}
