//! Server configuration from the environment.

use crate::{ConfigError, ConfigResult};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Repository owner pushes must come from. Required.
pub const ENV_REPO_OWNER: &str = "GITPRESS_REPO_OWNER";
/// Host repository URLs must point at.
pub const ENV_GIT_HOST: &str = "GITPRESS_GIT_HOST";
/// Root directory for working copies.
pub const ENV_CLONE_ROOT: &str = "GITPRESS_CLONE_ROOT";
/// Root directory published sites are served from.
pub const ENV_SITE_ROOT: &str = "GITPRESS_SITE_ROOT";
/// Listen address for the HTTP server.
pub const ENV_BIND: &str = "GITPRESS_BIND";
/// Shared secret for webhook signature verification. Optional.
pub const ENV_WEBHOOK_SECRET: &str = "GITPRESS_WEBHOOK_SECRET";

/// Runtime configuration for the receiver.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub repo_owner: String,
    pub git_host: String,
    pub clone_root: PathBuf,
    pub site_root: PathBuf,
    pub bind_addr: SocketAddr,
    pub webhook_secret: Option<String>,
}

impl ServerConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let repo_owner = lookup(ENV_REPO_OWNER)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingField(ENV_REPO_OWNER.to_string()))?;

        let git_host = lookup(ENV_GIT_HOST).unwrap_or_else(|| "github.com".to_string());

        let clone_root = lookup(ENV_CLONE_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("gitpress-repos"));

        let site_root = lookup(ENV_SITE_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/var/www"));

        let bind_addr = match lookup(ENV_BIND) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_BIND.to_string(),
                message: format!("not a socket address: {}", raw),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8888)),
        };

        let webhook_secret = lookup(ENV_WEBHOOK_SECRET).filter(|v| !v.is_empty());

        Ok(Self {
            repo_owner,
            git_host,
            clone_root,
            site_root,
            bind_addr,
            webhook_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn owner_is_required() {
        let err = ServerConfig::from_vars(|_| None).unwrap_err();

        assert!(matches!(err, ConfigError::MissingField(field) if field == ENV_REPO_OWNER));
    }

    #[test]
    fn defaults_apply() {
        let env = vars(&[(ENV_REPO_OWNER, "acme")]);
        let config = ServerConfig::from_vars(|name| env.get(name).cloned()).unwrap();

        assert_eq!(config.repo_owner, "acme");
        assert_eq!(config.git_host, "github.com");
        assert_eq!(config.site_root, PathBuf::from("/var/www"));
        assert_eq!(config.bind_addr.port(), 8888);
        assert_eq!(config.webhook_secret, None);
    }

    #[test]
    fn explicit_values_win() {
        let env = vars(&[
            (ENV_REPO_OWNER, "acme"),
            (ENV_GIT_HOST, "git.acme.dev"),
            (ENV_CLONE_ROOT, "/srv/repos"),
            (ENV_SITE_ROOT, "/srv/www"),
            (ENV_BIND, "127.0.0.1:9000"),
            (ENV_WEBHOOK_SECRET, "s3cret"),
        ]);
        let config = ServerConfig::from_vars(|name| env.get(name).cloned()).unwrap();

        assert_eq!(config.git_host, "git.acme.dev");
        assert_eq!(config.clone_root, PathBuf::from("/srv/repos"));
        assert_eq!(config.site_root, PathBuf::from("/srv/www"));
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.webhook_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn bad_bind_address_is_an_error() {
        let env = vars(&[(ENV_REPO_OWNER, "acme"), (ENV_BIND, "not-an-addr")]);
        let err = ServerConfig::from_vars(|name| env.get(name).cloned()).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == ENV_BIND));
    }
}
