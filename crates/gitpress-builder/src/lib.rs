//! Clone/build/publish pipeline for gitpress sites.
//!
//! `SiteBuilder` implements the build pipeline: clone or update the working
//! copy, check out the pushed revision, run the build command from the
//! repository's `.gitpress.kdl`, and atomically swap the output into the
//! serving location.

mod git;
mod publish;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use gitpress_config::{MANIFEST_FILE, parse_manifest};
use gitpress_core::{BuildPipeline, PipelineError, PushEvent, SiteManifest};

/// Build pipeline for static sites.
pub struct SiteBuilder {
    /// Base directory for working copies.
    clone_root: PathBuf,
}

impl SiteBuilder {
    pub fn new(clone_root: impl Into<PathBuf>) -> Self {
        Self {
            clone_root: clone_root.into(),
        }
    }

    /// Working copy location for a target.
    pub fn workspace_path(&self, target_key: &str) -> PathBuf {
        self.clone_root.join(target_key)
    }

    async fn load_manifest(workspace: &Path) -> Result<SiteManifest, PipelineError> {
        let path = workspace.join(MANIFEST_FILE);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(PipelineError::ManifestMissing(path));
        }
        let text = tokio::fs::read_to_string(&path).await?;
        parse_manifest(&text).map_err(|err| PipelineError::Manifest(err.to_string()))
    }

    async fn run_build_command(
        workspace: &Path,
        manifest: &SiteManifest,
    ) -> Result<(), PipelineError> {
        info!(command = %manifest.build_command, "running build command");
        let output = Command::new("/bin/sh")
            .arg("-c")
            .arg(&manifest.build_command)
            .current_dir(workspace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::BuildFailed {
                code: output.status.code(),
                detail: tail(&stderr),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BuildPipeline for SiteBuilder {
    async fn run(&self, event: &PushEvent) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(&self.clone_root).await?;
        let workspace = self.workspace_path(&event.target_key);

        git::clone_or_update(&workspace, event.source_url.as_str()).await?;
        git::checkout(&workspace, &event.revision).await?;
        git::update_submodules(&workspace).await?;

        let manifest = Self::load_manifest(&workspace).await?;
        Self::run_build_command(&workspace, &manifest).await?;

        let built = workspace.join(&manifest.output_dir);
        publish::publish(&built, &event.output_dir).await?;

        info!(
            target_key = %event.target_key,
            revision = %event.revision,
            site = %event.output_dir.display(),
            "site built and published"
        );
        Ok(())
    }
}

/// Last chunk of build output, enough to show the failing step.
fn tail(text: &str) -> String {
    const MAX: usize = 2048;
    if text.len() <= MAX {
        return text.trim_end().to_string();
    }
    let cut = text.len() - MAX;
    let cut = text
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| i >= cut)
        .unwrap_or(0);
    format!("…{}", text[cut..].trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gitpress-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn publish_swaps_output_into_place() {
        let root = scratch();
        let built = root.join("build");
        std::fs::create_dir_all(built.join("css")).unwrap();
        std::fs::write(built.join("index.html"), "v1").unwrap();
        std::fs::write(built.join("css/site.css"), "body{}").unwrap();

        let dest = root.join("sites/smoke");
        publish::publish(&built, &dest).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("index.html")).unwrap(),
            "v1"
        );
        assert_eq!(
            std::fs::read_to_string(dest.join("css/site.css")).unwrap(),
            "body{}"
        );

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn publish_replaces_previous_site() {
        let root = scratch();
        let built = root.join("build");
        std::fs::create_dir_all(&built).unwrap();
        std::fs::write(built.join("index.html"), "v1").unwrap();
        std::fs::write(built.join("stale.html"), "old").unwrap();

        let dest = root.join("sites/smoke");
        publish::publish(&built, &dest).await.unwrap();

        std::fs::remove_file(built.join("stale.html")).unwrap();
        std::fs::write(built.join("index.html"), "v2").unwrap();
        publish::publish(&built, &dest).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("index.html")).unwrap(),
            "v2"
        );
        assert!(!dest.join("stale.html").exists());

        // No staging or displaced trees left behind.
        let leftovers: Vec<_> = std::fs::read_dir(root.join("sites"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "smoke")
            .collect();
        assert!(leftovers.is_empty(), "leftovers: {:?}", leftovers);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn publish_without_output_dir_fails() {
        let root = scratch();

        let err = publish::publish(&root.join("missing"), &root.join("sites/smoke"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Publish(_)));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn missing_manifest_is_reported() {
        let root = scratch();

        let err = SiteBuilder::load_manifest(&root).await.unwrap_err();
        assert!(matches!(err, PipelineError::ManifestMissing(_)));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn manifest_is_loaded_from_working_copy() {
        let root = scratch();
        std::fs::write(root.join(MANIFEST_FILE), r#"build "make dist""#).unwrap();

        let manifest = SiteBuilder::load_manifest(&root).await.unwrap();
        assert_eq!(manifest.build_command, "make dist");

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn build_command_failure_carries_exit_code() {
        let root = scratch();
        let manifest = SiteManifest {
            build_command: "echo boom >&2; exit 3".to_string(),
            output_dir: "build".to_string(),
            cname: None,
        };

        let err = SiteBuilder::run_build_command(&root, &manifest)
            .await
            .unwrap_err();
        match err {
            PipelineError::BuildFailed { code, detail } => {
                assert_eq!(code, Some(3));
                assert!(detail.contains("boom"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        std::fs::remove_dir_all(&root).unwrap();
    }
}
