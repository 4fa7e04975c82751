//! HTTP receiver for repository push notifications.
//!
//! Parses GitHub webhook deliveries, validates them against the configured
//! deployment, and submits accepted pushes to the job controller.

pub mod error;
pub mod routes;
pub mod state;
pub mod validate;

pub use state::AppState;
