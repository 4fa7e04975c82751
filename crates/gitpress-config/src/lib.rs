//! Configuration for gitpress.
//!
//! This crate handles:
//! - Server configuration from environment variables
//! - Site build manifest parsing (`.gitpress.kdl`)

pub mod error;
pub mod manifest;
pub mod system;

pub use error::{ConfigError, ConfigResult};
pub use manifest::{DEFAULT_OUTPUT_DIR, MANIFEST_FILE, parse_manifest};
pub use system::ServerConfig;
