//! Daemon configuration (TOML)
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [bus]
//! type = "jsonrpc"          # or "mock"
//! url = "http://127.0.0.1:8443/jsonrpc"
//! auth_token = "..."
//!
//! [timeouts]
//! peer_list_secs = 5
//! call_secs = 10
//!
//! [platform]
//! driver_identity = "platform.driver"
//!
//! [auth]
//! verify_url = "https://host/authenticate"
//! ```
//!
//! Every section and field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use vgate_core::routing::DEFAULT_DRIVER_IDENTITY;
use vgate_platform::CallTimeouts;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl GatewayConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus.kind == BusKind::JsonRpc && self.bus.url.is_none() {
            return Err(ConfigError::Invalid(
                "[bus] url is required when type = \"jsonrpc\"".to_string(),
            ));
        }
        if self.timeouts.peer_list_secs == 0 || self.timeouts.call_secs == 0 {
            return Err(ConfigError::Invalid(
                "[timeouts] values must be at least 1 second".to_string(),
            ));
        }
        if self.platform.driver_identity.is_empty() {
            return Err(ConfigError::Invalid(
                "[platform] driver_identity must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP listener
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which bus adapter to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// In-memory demo platforms
    #[default]
    Mock,
    /// HTTP JSON-RPC bridge
    JsonRpc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusConfig {
    #[serde(rename = "type", default)]
    pub kind: BusKind,

    /// Bridge URL (jsonrpc only)
    #[serde(default)]
    pub url: Option<String>,

    /// Bearer token sent to the bridge
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Bounds on bus calls, in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_peer_list_secs")]
    pub peer_list_secs: u64,

    #[serde(default = "default_call_secs")]
    pub call_secs: u64,
}

fn default_peer_list_secs() -> u64 {
    5
}

fn default_call_secs() -> u64 {
    10
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            peer_list_secs: default_peer_list_secs(),
            call_secs: default_call_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn call_timeouts(&self) -> CallTimeouts {
        CallTimeouts {
            peer_list: Duration::from_secs(self.peer_list_secs),
            call: Duration::from_secs(self.call_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Agent that owns device points on every platform
    #[serde(default = "default_driver_identity")]
    pub driver_identity: String,
}

fn default_driver_identity() -> String {
    DEFAULT_DRIVER_IDENTITY.to_string()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            driver_identity: default_driver_identity(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Endpoint that must accept credentials before a token is issued
    #[serde(default)]
    pub verify_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = write_config("");
        let config = GatewayConfig::load(file.path()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.bus.kind, BusKind::Mock);
        assert_eq!(config.timeouts.call_timeouts(), CallTimeouts::default());
        assert_eq!(config.platform.driver_identity, "platform.driver");
        assert!(config.auth.verify_url.is_none());
    }

    #[test]
    fn full_file() {
        let file = write_config(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9090

            [bus]
            type = "jsonrpc"
            url = "http://127.0.0.1:8443/jsonrpc"
            auth_token = "s3cret"

            [timeouts]
            peer_list_secs = 2
            call_secs = 30

            [platform]
            driver_identity = "custom.driver"

            [auth]
            verify_url = "https://vc.local/authenticate"
            "#,
        );
        let config = GatewayConfig::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.bus.kind, BusKind::JsonRpc);
        assert_eq!(config.bus.url.as_deref(), Some("http://127.0.0.1:8443/jsonrpc"));
        assert_eq!(config.bus.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(
            config.timeouts.call_timeouts(),
            CallTimeouts {
                peer_list: Duration::from_secs(2),
                call: Duration::from_secs(30),
            }
        );
        assert_eq!(config.platform.driver_identity, "custom.driver");
        assert_eq!(
            config.auth.verify_url.as_deref(),
            Some("https://vc.local/authenticate")
        );
    }

    #[test]
    fn jsonrpc_requires_url() {
        let file = write_config("[bus]\ntype = \"jsonrpc\"\n");
        let err = GatewayConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let file = write_config("[timeouts]\ncall_secs = 0\n");
        assert!(matches!(
            GatewayConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_bus_type_is_parse_error() {
        let file = write_config("[bus]\ntype = \"zmq\"\n");
        assert!(matches!(
            GatewayConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GatewayConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
