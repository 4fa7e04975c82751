//! One-shot site builder.
//!
//! Builds a repository exactly the way the receiver does, without going
//! through HTTP. Useful for bootstrapping a site or debugging a manifest.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use gitpress_builder::SiteBuilder;
use gitpress_core::{BuildPipeline, PushEvent};

#[derive(Parser)]
#[command(name = "gitpress-build")]
#[command(about = "Build a static site gitpress style", long_about = None)]
struct Cli {
    /// Repository to build
    #[arg(long)]
    git_url: Url,

    /// Branch to build
    #[arg(long, default_value = "master")]
    git_ref: String,

    /// Where working copies live
    #[arg(long, env = "GITPRESS_CLONE_ROOT")]
    clone_root: Option<PathBuf>,

    /// Where the built site is published
    #[arg(long, env = "GITPRESS_SITE_ROOT", default_value = "/var/www")]
    site_root: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let Some(name) = cli
        .git_url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.trim_end_matches(".git").to_string())
    else {
        bail!("cannot derive a site name from {}", cli.git_url);
    };

    let clone_root = cli
        .clone_root
        .unwrap_or_else(|| std::env::temp_dir().join("gitpress-repos"));

    let event = PushEvent {
        target_key: name.clone(),
        revision: format!("origin/{}", cli.git_ref),
        source_url: cli.git_url,
        output_dir: cli.site_root.join(&name),
    };

    let builder = SiteBuilder::new(clone_root);
    builder
        .run(&event)
        .await
        .with_context(|| format!("building {}", name))?;

    println!(
        "Success! {} has been built and is now hosted at {}",
        event.source_url,
        event.output_dir.display()
    );
    Ok(())
}
