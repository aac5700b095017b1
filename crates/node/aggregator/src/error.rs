use sigag_client::ClientError;
use sigag_config::ConfigError;
use sigag_registry::RegistryError;
use sigag_rpc::ServerError;
use sigag_store::StorageError;
use thiserror::Error;

/// Fatal aggregator errors.
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// The epoch store failed; membership state is undefined past this point.
    #[error("epoch store failure: {0}")]
    Storage(#[from] StorageError),

    /// A failing party could not be evicted.
    #[error("failed to evict party: {0}")]
    Eviction(#[from] RegistryError),

    /// A persisted party could not be restored into the registry.
    #[error("failed to restore party {id}: {source}")]
    Restore {
        /// Party id.
        id: String,
        /// Client construction failure.
        source: ClientError,
    },

    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The RPC server could not start.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Method table construction failed.
    #[error("failed to register method: {0}")]
    Methods(#[from] sigag_rpc::RegisterError),

    /// The orchestrator task panicked or was cancelled.
    #[error("orchestrator task failed: {0}")]
    Task(String),
}

/// Reasons a `register` call is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// An epoch transition is in progress.
    #[error("registration is locked while an epoch transition is in progress")]
    Locked,

    /// The id is taken.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The registrant did not answer the liveness probe.
    #[error("party {id} is unreachable: {reason}")]
    Unreachable {
        /// Party id.
        id: String,
        /// Probe failure.
        reason: String,
    },
}
