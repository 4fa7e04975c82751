//! The validated push event.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// A push notification that passed validation.
///
/// Constructed only by the validator; the job controller and the build
/// pipeline trust it as-is. All events sharing a `target_key` coalesce
/// against each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// Identity of the build target (the repository name).
    pub target_key: String,
    /// Commit being deployed.
    pub revision: String,
    /// Where the source is cloned from.
    pub source_url: Url,
    /// Where the built site is published.
    pub output_dir: PathBuf,
}
