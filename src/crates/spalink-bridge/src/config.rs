//! TOML configuration for the bridge.
//!
//! Every field has a serde default so the bridge runs with no config file
//! at all; a file only needs the keys it wants to change:
//!
//! ```toml
//! [gateway]
//! addr = "spa-gw.local:3001"
//! reconnect_secs = 5
//!
//! [node]
//! tick_secs = 300
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub gateway: GatewayConfig,
    pub node: NodeConfig,
}

/// Where the RS-485-over-TCP gateway lives and how to treat drops.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// host:port of the gateway (ser2net or similar).
    pub addr: String,
    /// Seconds to wait before reconnecting after a drop.
    pub reconnect_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3001".to_string(),
            reconnect_secs: 5,
        }
    }
}

/// Engine housekeeping driven by the host clock.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    /// Interval between engine re-arm ticks, in seconds.
    pub tick_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self { tick_secs: 300 }
    }
}

impl BridgeConfig {
    /// Loads the config file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(toml::from_str(&text)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = BridgeConfig::load(None).unwrap();
        assert_eq!(config.gateway.addr, "127.0.0.1:3001");
        assert_eq!(config.gateway.reconnect_secs, 5);
        assert_eq!(config.node.tick_secs, 300);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: BridgeConfig = toml::from_str("[gateway]\naddr = \"10.0.0.7:4000\"\n").unwrap();
        assert_eq!(config.gateway.addr, "10.0.0.7:4000");
        assert_eq!(config.gateway.reconnect_secs, 5);
        assert_eq!(config.node.tick_secs, 300);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let err = toml::from_str::<BridgeConfig>("gateway = 12").unwrap_err();
        let _ = err; // parse errors surface as ConfigError::Parse via load()
    }
}
