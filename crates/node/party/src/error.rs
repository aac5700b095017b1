use serde_json::json;
use sigag_client::ClientError;
use sigag_config::ConfigError;
use sigag_dkg::DkgError;
use sigag_rpc::{RegisterError, RpcError, ServerError, codes};
use thiserror::Error;

/// Errors raised by a party node.
#[derive(Debug, Error)]
pub enum PartyError {
    /// The announced epoch is not newer than the current one.
    #[error("stale epoch {epoch}, current epoch is {current}")]
    StaleEpoch {
        /// Announced epoch.
        epoch: u64,
        /// Epoch already accepted.
        current: u64,
    },

    /// A DKG round holds the epoch lock.
    #[error("Epoch Already in progress")]
    Locked,

    /// `dkg_init` arrived before any epoch was announced.
    #[error("no epoch announced")]
    NoEpoch,

    /// A round message arrived while no DKG round exists.
    #[error("no DKG round in progress")]
    NoSession,

    /// The DKG engine rejected a request or message.
    #[error(transparent)]
    Dkg(#[from] DkgError),

    /// Registration with the aggregator failed.
    #[error("failed to register with aggregator: {0}")]
    Registration(#[from] ClientError),

    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The RPC server could not start.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Method table construction failed.
    #[error("failed to register method: {0}")]
    Methods(#[from] RegisterError),
}

impl From<PartyError> for RpcError {
    fn from(err: PartyError) -> Self {
        match err {
            PartyError::StaleEpoch { current, .. } => {
                Self::state_with(codes::STALE_EPOCH, err.to_string(), json!({ "current": current }))
            }
            PartyError::Dkg(e) if e.is_verification_failure() => Self::State {
                code: codes::VERIFICATION_FAILED,
                message: e.to_string(),
                data: None,
            },
            PartyError::Dkg(
                e @ (DkgError::InvalidThreshold { .. } | DkgError::NotAParticipant { .. }),
            ) => Self::InvalidParams(e.to_string()),
            PartyError::Locked
            | PartyError::NoEpoch
            | PartyError::NoSession
            | PartyError::Dkg(_) => Self::state(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
