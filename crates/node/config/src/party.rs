//! Party configuration.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default party listen address.
pub const DEFAULT_PARTY_ADDR: &str = "127.0.0.1:8801";

/// Default deadline of a DKG round.
pub const DEFAULT_ROUND_DEADLINE_SECS: u64 = 60;

const DEFAULT_AGGREGATOR_URL: &str = "http://127.0.0.1:8080/";

/// Party configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartyConfig {
    /// Party id. Defaults to the listen port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Address the RPC server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Location announced to the aggregator. Defaults to `<listen_addr>/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertised_url: Option<String>,

    /// Aggregator to register with.
    #[serde(default = "default_aggregator_url")]
    pub aggregator_url: String,

    /// Serve over plain HTTP.
    #[serde(default = "crate::default_true")]
    pub no_tls: bool,

    /// Timeout of every call to the aggregator or a peer.
    #[serde(default = "crate::default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,

    /// Deadline of a DKG round.
    #[serde(default = "default_round_deadline_secs")]
    pub round_deadline_secs: u64,

    /// Directory to persist DKG outputs into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            id: None,
            listen_addr: default_listen_addr(),
            advertised_url: None,
            aggregator_url: default_aggregator_url(),
            no_tls: true,
            rpc_timeout_ms: crate::DEFAULT_RPC_TIMEOUT_MS,
            round_deadline_secs: DEFAULT_ROUND_DEADLINE_SECS,
            data_dir: None,
        }
    }
}

impl PartyConfig {
    /// Config for a local party listening on `port`.
    pub fn local(port: u16) -> Self {
        Self { listen_addr: format!("127.0.0.1:{port}"), ..Default::default() }
    }

    /// Set the aggregator URL.
    #[must_use]
    pub fn with_aggregator_url(mut self, url: impl Into<String>) -> Self {
        self.aggregator_url = url.into();
        self
    }

    /// Party id: the configured one, or the listen port.
    pub fn party_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| {
            self.listen_addr.rsplit(':').next().unwrap_or(&self.listen_addr).to_string()
        })
    }

    /// Location announced to the aggregator, without scheme unless configured.
    pub fn registration_url(&self) -> String {
        self.advertised_url.clone().unwrap_or_else(|| format!("{}/", self.listen_addr))
    }

    /// Parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|e| ConfigError::Invalid {
            field: "listen_addr",
            reason: format!("{e}: {}", self.listen_addr),
        })
    }

    /// Timeout of every outbound call.
    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Deadline of a DKG round.
    pub const fn round_deadline(&self) -> Duration {
        Duration::from_secs(self.round_deadline_secs)
    }

    /// Reject values the party cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.party_id().is_empty() {
            return Err(ConfigError::Invalid {
                field: "id",
                reason: "cannot be derived from listen_addr".to_string(),
            });
        }
        if self.rpc_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "rpc_timeout_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.round_deadline_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "round_deadline_secs",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

fn default_listen_addr() -> String {
    DEFAULT_PARTY_ADDR.to_string()
}

fn default_aggregator_url() -> String {
    DEFAULT_AGGREGATOR_URL.to_string()
}

const fn default_round_deadline_secs() -> u64 {
    DEFAULT_ROUND_DEADLINE_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_party_config() {
        let config = PartyConfig::default();
        assert_eq!(config.party_id(), "8801");
        assert_eq!(config.registration_url(), "127.0.0.1:8801/");
        assert!(config.no_tls);
        assert_eq!(config.round_deadline(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_local_party() {
        let config = PartyConfig::local(8803).with_aggregator_url("http://127.0.0.1:9090/");
        assert_eq!(config.party_id(), "8803");
        assert_eq!(config.registration_url(), "127.0.0.1:8803/");
        assert_eq!(config.aggregator_url, "http://127.0.0.1:9090/");
    }

    #[test]
    fn test_explicit_id_and_url() {
        let config = PartyConfig {
            id: Some("alice".into()),
            advertised_url: Some("https://alice.example/".into()),
            ..Default::default()
        };
        assert_eq!(config.party_id(), "alice");
        assert_eq!(config.registration_url(), "https://alice.example/");
    }

    #[test]
    fn test_party_config_serde_defaults() {
        let config: PartyConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config, PartyConfig::default());
        let serialized = serde_json::to_string(&config).expect("serialize");
        assert!(!serialized.contains("advertised_url"));
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let config = PartyConfig { round_deadline_secs: 0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "round_deadline_secs", .. })
        ));
    }

    #[test]
    fn test_empty_id_rejected() {
        let config = PartyConfig { listen_addr: "127.0.0.1:".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "id", .. })));
    }
}
