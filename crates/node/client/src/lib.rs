#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/sigag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod aggregator;
pub use aggregator::AggregatorClient;

mod error;
pub use error::ClientError;

mod party;
pub use party::{PartyApi, PartyClient};

mod rpc;
pub use rpc::{DEFAULT_TIMEOUT, RpcClient};

mod types;
pub use types::{
    DkgInitParams, DkgRound1Params, DkgRound2Params, HealthResult, NewEpochParams, Parties,
    PingResult, RegisterParams, StaleEpochData,
};

mod url;
pub use url::with_scheme;
