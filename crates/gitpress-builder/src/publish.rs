//! Atomic publication of built output.
//!
//! The built tree is copied into a staging sibling of the destination and
//! swapped in with renames, so an observer at the destination sees either
//! the previous site or the new one, never a half-written tree.

use std::path::Path;

use async_recursion::async_recursion;
use tracing::{debug, warn};
use uuid::Uuid;

use gitpress_core::PipelineError;

/// Publish `built` to `dest`, replacing whatever was there.
pub(crate) async fn publish(built: &Path, dest: &Path) -> Result<(), PipelineError> {
    if !built.is_dir() {
        return Err(PipelineError::Publish(format!(
            "build produced no output directory at {}",
            built.display()
        )));
    }
    let (parent, site_name) = match (dest.parent(), dest.file_name().and_then(|n| n.to_str())) {
        (Some(parent), Some(name)) => (parent, name),
        _ => {
            return Err(PipelineError::Publish(format!(
                "bad publish destination: {}",
                dest.display()
            )));
        }
    };
    tokio::fs::create_dir_all(parent).await?;

    let suffix = Uuid::new_v4();
    let staging = parent.join(format!(".{}.stage-{}", site_name, suffix));
    let displaced = parent.join(format!(".{}.old-{}", site_name, suffix));

    copy_dir(built, &staging).await?;

    let had_previous = tokio::fs::try_exists(dest).await.unwrap_or(false);
    if had_previous {
        tokio::fs::rename(dest, &displaced).await?;
    }
    if let Err(err) = tokio::fs::rename(&staging, dest).await {
        // Put the previous site back before reporting the failure.
        if had_previous {
            if let Err(undo) = tokio::fs::rename(&displaced, dest).await {
                warn!(site = %dest.display(), error = %undo, "failed to restore previous site");
            }
        }
        return Err(err.into());
    }
    if had_previous {
        if let Err(err) = tokio::fs::remove_dir_all(&displaced).await {
            warn!(path = %displaced.display(), error = %err, "failed to remove displaced site");
        }
    }

    debug!(site = %dest.display(), "output swapped into place");
    Ok(())
}

/// Recursively copy a directory tree.
#[async_recursion]
async fn copy_dir(src: &Path, dst: &Path) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(dst).await?;
    let mut entries = tokio::fs::read_dir(src).await?;
    while let Some(entry) = entries.next_entry().await? {
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().await?;
        if file_type.is_dir() {
            copy_dir(&from, &to).await?;
        } else if file_type.is_symlink() {
            // Keep links as links; sites occasionally symlink shared assets.
            let link = tokio::fs::read_link(&from).await?;
            tokio::fs::symlink(&link, &to).await?;
        } else {
            tokio::fs::copy(&from, &to).await?;
        }
    }
    Ok(())
}
