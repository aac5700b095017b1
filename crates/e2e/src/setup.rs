//! Test configuration.

use std::{path::PathBuf, time::Duration};

use sigag_aggregator::OrchestratorConfig;
use sigag_config::{AggregatorConfig, PartyConfig};

/// Configuration for an e2e run.
#[derive(Clone, Debug)]
pub struct TestConfig {
    /// Number of parties.
    pub parties: usize,
    /// Delay before the first epoch.
    pub initial_tick: Duration,
    /// Delay between epochs.
    pub epoch_duration: Duration,
    /// Threshold divisor.
    pub threshold_factor: f64,
    /// Timeout of every RPC call.
    pub rpc_timeout: Duration,
    /// Deadline of a party's DKG round.
    pub round_deadline_secs: u64,
    /// Root under which each party saves its DKG output.
    pub data_dir: Option<PathBuf>,
    /// How long `wait_*` helpers wait.
    pub timeout: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            parties: 2,
            initial_tick: Duration::from_millis(500),
            epoch_duration: Duration::from_secs(30),
            threshold_factor: 2.0,
            rpc_timeout: Duration::from_secs(2),
            round_deadline_secs: 20,
            data_dir: None,
            timeout: Duration::from_secs(20),
        }
    }
}

impl TestConfig {
    /// Run with `n` parties.
    #[must_use]
    pub const fn with_parties(mut self, n: usize) -> Self {
        self.parties = n;
        self
    }

    /// Delay before the first epoch.
    #[must_use]
    pub const fn with_initial_tick(mut self, tick: Duration) -> Self {
        self.initial_tick = tick;
        self
    }

    /// Delay between epochs.
    #[must_use]
    pub const fn with_epoch_duration(mut self, duration: Duration) -> Self {
        self.epoch_duration = duration;
        self
    }

    /// Save party outputs under `dir`.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Id of the `i`-th party, 1-based.
    pub fn party_id(i: usize) -> String {
        format!("p{i}")
    }

    pub(crate) fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            threshold_factor: self.threshold_factor,
            rpc_timeout_ms: self.rpc_timeout.as_millis() as u64,
            ping_on_register: true,
            ..Default::default()
        }
    }

    pub(crate) const fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            initial_tick: self.initial_tick,
            epoch_duration: self.epoch_duration,
            threshold_factor: self.threshold_factor,
        }
    }

    pub(crate) fn party(&self, i: usize, aggregator_url: &str) -> PartyConfig {
        let id = Self::party_id(i);
        PartyConfig {
            data_dir: self.data_dir.as_ref().map(|dir| dir.join(&id)),
            id: Some(id),
            rpc_timeout_ms: self.rpc_timeout.as_millis() as u64,
            round_deadline_secs: self.round_deadline_secs,
            ..PartyConfig::local(0)
        }
        .with_aggregator_url(aggregator_url)
    }
}
