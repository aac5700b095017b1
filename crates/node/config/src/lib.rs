#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/sigag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod aggregator;
pub use aggregator::{
    AggregatorConfig, DEFAULT_AGGREGATOR_ADDR, DEFAULT_EPOCH_DURATION_SECS,
    DEFAULT_INITIAL_TICK_SECS, DEFAULT_THRESHOLD_FACTOR,
};

mod error;
pub use error::ConfigError;

mod node;
pub use node::NodeConfig;

mod party;
pub use party::{DEFAULT_PARTY_ADDR, DEFAULT_ROUND_DEADLINE_SECS, PartyConfig};

/// Default timeout for outbound RPC calls, in milliseconds.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 5_000;

fn default_rpc_timeout_ms() -> u64 {
    DEFAULT_RPC_TIMEOUT_MS
}

const fn default_true() -> bool {
    true
}
