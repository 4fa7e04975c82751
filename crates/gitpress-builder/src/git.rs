//! Git plumbing for working copies.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

use gitpress_core::PipelineError;

/// Run one git subcommand, mapping failure to a pipeline error.
async fn git(workspace: Option<&Path>, args: &[&str]) -> Result<(), PipelineError> {
    let mut cmd = Command::new("git");
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = workspace {
        cmd.current_dir(dir);
    }

    let output = cmd.output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::Git {
            op: args.first().copied().unwrap_or("git").to_string(),
            detail: stderr.trim_end().to_string(),
        });
    }
    Ok(())
}

/// Clone a repository, or fetch into an existing working copy.
pub(crate) async fn clone_or_update(
    workspace: &Path,
    source_url: &str,
) -> Result<(), PipelineError> {
    if workspace.join(".git").exists() {
        info!(path = %workspace.display(), "fetching origin");
        if git(Some(workspace), &["fetch", "origin"]).await.is_ok() {
            return Ok(());
        }
        // A working copy is disposable; re-clone rather than repair.
        warn!(path = %workspace.display(), "fetch failed, re-cloning");
        tokio::fs::remove_dir_all(workspace).await?;
    }

    info!(url = %source_url, path = %workspace.display(), "cloning repository");
    let dest = workspace.to_str().ok_or_else(|| PipelineError::Git {
        op: "clone".to_string(),
        detail: format!("non-UTF-8 clone path: {}", workspace.display()),
    })?;
    git(None, &["clone", source_url, dest]).await
}

/// Check out the pushed revision.
pub(crate) async fn checkout(workspace: &Path, revision: &str) -> Result<(), PipelineError> {
    git(Some(workspace), &["checkout", revision]).await
}

/// Initialize and update submodules. A no-op for repositories without any.
pub(crate) async fn update_submodules(workspace: &Path) -> Result<(), PipelineError> {
    git(Some(workspace), &["submodule", "update", "--init"]).await
}
