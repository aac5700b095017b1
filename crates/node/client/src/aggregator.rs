//! Client for the aggregator-hosted methods.

use std::time::Duration;

use tracing::debug;

use crate::{ClientError, HealthResult, Parties, PingResult, RegisterParams, RpcClient};

/// RPC client bound to the aggregator.
#[derive(Debug)]
pub struct AggregatorClient {
    rpc: RpcClient,
}

impl AggregatorClient {
    /// Client for the aggregator at `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self { rpc: RpcClient::new(url, timeout)? })
    }

    /// Aggregator URL.
    pub fn url(&self) -> &str {
        self.rpc.url()
    }

    /// Register party `id` reachable at `url`.
    pub async fn register(&self, id: &str, url: &str, no_tls: bool) -> Result<bool, ClientError> {
        debug!(id, url, no_tls, aggregator = %self.rpc.url(), "registering with aggregator");
        let params = RegisterParams { address: id.to_string(), url: url.to_string(), no_tls };
        self.rpc.call("register", Some(params)).await
    }

    /// Health probe.
    pub async fn health(&self) -> Result<HealthResult, ClientError> {
        self.rpc.call::<(), _>("health", None).await
    }

    /// Liveness probe.
    pub async fn ping(&self) -> Result<PingResult, ClientError> {
        self.rpc.call::<(), _>("ping", None).await
    }

    /// Current registry.
    pub async fn get_parties(&self) -> Result<Parties, ClientError> {
        self.rpc.call::<(), _>("get_parties", None).await
    }

    /// Last persisted epoch party set.
    pub async fn get_epoch_parties(&self) -> Result<Parties, ClientError> {
        self.rpc.call::<(), _>("get_epoch_parties", None).await
    }
}
