use std::time::Duration;

use sigag_rpc::{ErrorObject, codes};
use thiserror::Error;

use crate::StaleEpochData;

/// Errors returned by outbound RPC calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    /// No response within the configured timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL.
        url: String,
        /// Configured timeout.
        timeout: Duration,
    },

    /// The peer could not be reached.
    #[error("transport error calling {url}: {message}")]
    Transport {
        /// Target URL.
        url: String,
        /// Underlying error.
        message: String,
    },

    /// The peer answered with a non-JSON-RPC body.
    #[error("unexpected HTTP status {status} from {url}")]
    Http {
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The peer answered with a JSON-RPC error.
    #[error(transparent)]
    Rpc(#[from] ErrorObject),

    /// The result did not match the expected type.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// JSON-RPC error code, if the peer answered with an error object.
    pub const fn rpc_code(&self) -> Option<i32> {
        match self {
            Self::Rpc(err) => Some(err.code),
            _ => None,
        }
    }

    /// The peer's current epoch, if it rejected an announcement as stale.
    pub fn stale_epoch(&self) -> Option<u64> {
        match self {
            Self::Rpc(err) if err.code == codes::STALE_EPOCH => err
                .data
                .clone()
                .and_then(|data| serde_json::from_value::<StaleEpochData>(data).ok())
                .map(|data| data.current),
            _ => None,
        }
    }

    /// Returns `true` when the peer never produced a JSON-RPC answer.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. } | Self::Http { .. })
    }
}
