//! Site build manifest carried in each deployable repository.

use serde::{Deserialize, Serialize};

/// Parsed `.gitpress.kdl` manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteManifest {
    /// Shell command that produces the site.
    pub build_command: String,
    /// Directory, relative to the working copy, the build writes into.
    pub output_dir: String,
    /// Optional serving name for the published site.
    pub cname: Option<String>,
}
