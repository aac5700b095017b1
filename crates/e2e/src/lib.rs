#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/sigag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod harness;
pub use harness::{DkgOutcome, HarnessError, TestHarness};

mod setup;
pub use setup::TestConfig;
