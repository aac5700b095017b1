#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/sigag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod context;
pub use context::{AggregatorContext, RegistrationLock};

mod error;
pub use error::{AggregatorError, RegistrationError};

mod handlers;
pub use handlers::{RegisterOptions, aggregator_methods};

mod orchestrator;
pub use orchestrator::{CycleOutcome, EpochOrchestrator, OrchestratorConfig};

mod service;
pub use service::{AggregatorHandle, AggregatorService};

mod threshold;
pub use threshold::compute_threshold;
