#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/sigag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]


mod ceremony;
pub use ceremony::DkgCeremony;

mod config;
pub use config::{DEFAULT_DEADLINE, DkgConfig, INITIAL_BACKOFF, MAX_BACKOFF};

pub mod encoding;

mod error;
pub use error::DkgError;

mod messages;
pub use messages::{Round1Message, Round2Message};

mod output;
pub use output::DkgOutput;

mod participant;
pub use participant::{DkgParticipant, assign_indices};

mod pok;
pub use pok::ProofOfKnowledge;

mod poly;
pub use poly::{Commitments, SecretPolynomial, index_scalar, interpolate_at_zero};

mod session;
pub use session::DkgSession;

mod state;
pub use state::{DkgPhase, DkgStatus};

mod transport;
pub use transport::PeerTransport;
