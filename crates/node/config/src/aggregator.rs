//! Aggregator configuration.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default aggregator listen address.
pub const DEFAULT_AGGREGATOR_ADDR: &str = "127.0.0.1:8080";

/// Default delay before the first epoch.
pub const DEFAULT_INITIAL_TICK_SECS: u64 = 40;

/// Default length of an epoch.
pub const DEFAULT_EPOCH_DURATION_SECS: u64 = 100;

/// Default divisor used to derive the threshold from the party count.
pub const DEFAULT_THRESHOLD_FACTOR: f64 = 2.0;

const DEFAULT_DATA_DIR: &str = "./data/aggregator";

/// Aggregator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatorConfig {
    /// Address the RPC server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory holding the epoch store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Delay before the first epoch, letting parties register.
    #[serde(default = "default_initial_tick_secs")]
    pub initial_tick_secs: u64,

    /// Sleep between epochs.
    #[serde(default = "default_epoch_duration_secs")]
    pub epoch_duration_secs: u64,

    /// Threshold is `floor(parties / threshold_factor) + 1`.
    #[serde(default = "default_threshold_factor")]
    pub threshold_factor: f64,

    /// Timeout of every call to a party.
    #[serde(default = "crate::default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,

    /// Ping a registrant before accepting it.
    #[serde(default = "crate::default_true")]
    pub ping_on_register: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            data_dir: default_data_dir(),
            initial_tick_secs: DEFAULT_INITIAL_TICK_SECS,
            epoch_duration_secs: DEFAULT_EPOCH_DURATION_SECS,
            threshold_factor: DEFAULT_THRESHOLD_FACTOR,
            rpc_timeout_ms: crate::DEFAULT_RPC_TIMEOUT_MS,
            ping_on_register: true,
        }
    }
}

impl AggregatorConfig {
    /// Delay before the first epoch.
    pub const fn initial_tick(&self) -> Duration {
        Duration::from_secs(self.initial_tick_secs)
    }

    /// Sleep between epochs.
    pub const fn epoch_duration(&self) -> Duration {
        Duration::from_secs(self.epoch_duration_secs)
    }

    /// Timeout of every call to a party.
    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|e| ConfigError::Invalid {
            field: "listen_addr",
            reason: format!("{e}: {}", self.listen_addr),
        })
    }

    /// Path of the epoch store file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("epochs.json")
    }

    /// Reject values the orchestrator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if !(self.threshold_factor.is_finite() && self.threshold_factor > 0.0) {
            return Err(ConfigError::Invalid {
                field: "threshold_factor",
                reason: format!("must be a positive number, got {}", self.threshold_factor),
            });
        }
        if self.rpc_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "rpc_timeout_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

fn default_listen_addr() -> String {
    DEFAULT_AGGREGATOR_ADDR.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

const fn default_initial_tick_secs() -> u64 {
    DEFAULT_INITIAL_TICK_SECS
}

const fn default_epoch_duration_secs() -> u64 {
    DEFAULT_EPOCH_DURATION_SECS
}

const fn default_threshold_factor() -> f64 {
    DEFAULT_THRESHOLD_FACTOR
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_default_aggregator_config() {
        let config = AggregatorConfig::default();
        assert_eq!(config.listen_addr, DEFAULT_AGGREGATOR_ADDR);
        assert_eq!(config.initial_tick(), Duration::from_secs(40));
        assert_eq!(config.epoch_duration(), Duration::from_secs(100));
        assert_eq!(config.threshold_factor, 2.0);
        assert_eq!(config.rpc_timeout(), Duration::from_secs(5));
        assert!(config.ping_on_register);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_aggregator_config_serde_defaults() {
        let config: AggregatorConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config, AggregatorConfig::default());
    }

    #[test]
    fn test_aggregator_config_toml_partial() {
        let config: AggregatorConfig =
            toml::from_str("initial_tick_secs = 1\nthreshold_factor = 3.0\n").expect("toml");
        assert_eq!(config.initial_tick_secs, 1);
        assert_eq!(config.threshold_factor, 3.0);
        assert_eq!(config.epoch_duration_secs, DEFAULT_EPOCH_DURATION_SECS);
    }

    #[test]
    fn test_store_path() {
        let config = AggregatorConfig { data_dir: PathBuf::from("/var/sigag"), ..Default::default() };
        assert_eq!(config.store_path(), PathBuf::from("/var/sigag/epochs.json"));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_threshold_factor(#[case] factor: f64) {
        let config = AggregatorConfig { threshold_factor: factor, ..Default::default() };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "threshold_factor", .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AggregatorConfig { rpc_timeout_ms: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = AggregatorConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 8080);

        let bad = AggregatorConfig { listen_addr: "localhost".into(), ..Default::default() };
        assert!(matches!(bad.validate(), Err(ConfigError::Invalid { field: "listen_addr", .. })));
    }
}
