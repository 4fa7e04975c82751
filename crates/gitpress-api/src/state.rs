//! Application state.

use std::sync::Arc;

use gitpress_builder::SiteBuilder;
use gitpress_config::ServerConfig;
use gitpress_scheduler::JobController;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub controller: JobController,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let builder = SiteBuilder::new(config.clone_root.clone());
        let controller = JobController::new(Arc::new(builder));

        Self {
            config: Arc::new(config),
            controller,
        }
    }
}
