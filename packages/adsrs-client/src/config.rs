//! Connection defaults, optionally loaded from a TOML file.
//!
//! Nothing here is read implicitly: an embedding application opts in by calling
//! [`ConnectionConfig::from_toml_file`] (or constructing one directly) and passing the
//! result to [`Connection::connect_with_config`](crate::Connection::connect_with_config).

use adsrs_core::ams::{AmsNetId, AmsPort};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default ADS port used by the local TwinCAT runtime (port 851, the first PLC runtime).
pub const DEFAULT_ADS_PORT: AmsPort = 851;

/// Default AMS router TCP port.
pub const DEFAULT_ROUTER_PORT: u16 = 48898;

/// Connection-time defaults for a [`Connection`](crate::Connection).
///
/// Holds only transport parameters - never protocol state. Safe to load from an
/// untrusted or version-controlled TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Router host to dial (hostname or IP). `"127.0.0.1"` triggers the loopback
    /// self-registration handshake when `source` is unset.
    pub host: String,
    /// AMS router TCP port. Almost always [`DEFAULT_ROUTER_PORT`].
    pub router_port: u16,
    /// Target ADS port on the remote device (e.g. 851 for the first PLC runtime).
    pub ads_port: AmsPort,
    /// Overrides the source identity instead of performing the loopback handshake.
    ///
    /// Equivalent to the `setSource` pre-connect step: set this (plus `source_port`)
    /// before calling [`Connection::connect_with_config`](crate::Connection::connect_with_config).
    pub source_net_id: Option<AmsNetId>,
    /// Overrides the source AMS port. Ignored unless `source_net_id` is also set.
    pub source_port: Option<AmsPort>,
    /// Overrides the target NetId instead of deriving it from `host` (`a.b.c.d.1.1` for
    /// an IPv4 host). Equivalent to the `setTarget` pre-connect step.
    pub target_net_id: Option<AmsNetId>,
    /// Overrides the target AMS port instead of using `ads_port`.
    pub target_port: Option<AmsPort>,
    /// Number of response-ready wakeups to tolerate before declaring a request timed out.
    pub response_retries: u32,
    /// How long a single wait for the response-ready notification blocks before re-checking
    /// the fatal-error/shutdown flags.
    pub response_wait: Duration,
    /// How often the receiver loop's idle-read wakes up to check the shutdown flag.
    pub receiver_poll_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            router_port: DEFAULT_ROUTER_PORT,
            ads_port: DEFAULT_ADS_PORT,
            source_net_id: None,
            source_port: None,
            target_net_id: None,
            target_port: None,
            response_retries: 5,
            response_wait: Duration::from_secs(1),
            receiver_poll_interval: Duration::from_secs(1),
        }
    }
}

impl ConnectionConfig {
    /// Convenience constructor: loopback connection to the local TwinCAT runtime.
    pub fn local() -> Self {
        Self::default()
    }

    /// Targets a remote host on the default router port, at the default ADS port.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Loads connection defaults from a TOML file.
    ///
    /// The library never calls this implicitly - the caller must opt in.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(ClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_local_loopback() {
        let cfg = ConnectionConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.router_port, DEFAULT_ROUTER_PORT);
        assert_eq!(cfg.ads_port, DEFAULT_ADS_PORT);
        assert!(cfg.source_net_id.is_none());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let toml_str = r#"
            host = "192.168.0.10"
            ads_port = 852
        "#;
        let cfg: ConnectionConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.host, "192.168.0.10");
        assert_eq!(cfg.ads_port, 852);
        assert_eq!(cfg.router_port, DEFAULT_ROUTER_PORT);
    }

    #[test]
    fn from_toml_file_roundtrips(){
        let dir = std::env::temp_dir();
        let path = dir.join("adsrs_client_config_test.toml");
        std::fs::write(&path, "host = \"10.0.0.5\"\nads_port = 851\n").unwrap();

        let cfg = ConnectionConfig::from_toml_file(&path).unwrap();
        assert_eq!(cfg.host, "10.0.0.5");

        std::fs::remove_file(&path).ok();
    }
}
