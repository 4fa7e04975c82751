//! Core domain types and traits for the gitpress deploy receiver.
//!
//! This crate contains:
//! - The validated push event the job controller consumes
//! - Job lifecycle states
//! - The build pipeline trait implemented by `gitpress-builder`
//! - Site manifest types
//! - The error taxonomy shared across the workspace

pub mod error;
pub mod event;
pub mod job;
pub mod pipeline;
pub mod site;

pub use error::{PipelineError, ValidationError};
pub use event::PushEvent;
pub use job::JobState;
pub use pipeline::BuildPipeline;
pub use site::SiteManifest;
