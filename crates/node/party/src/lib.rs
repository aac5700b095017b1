#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/sigag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::PartyError;

mod handlers;
pub use handlers::party_methods;

mod node;
pub use node::PartyNode;

mod service;
pub use service::{PartyHandle, PartyService};

mod state;
pub use state::{DkgStart, PartyState};

mod transport;
pub use transport::HttpTransport;
