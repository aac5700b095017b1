//! Aggregator service: RPC server plus epoch orchestrator.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use sigag_client::{PartyApi, PartyClient};
use sigag_config::AggregatorConfig;
use sigag_registry::PartyHandle;
use sigag_rpc::{RpcServer, RpcServerConfig, RpcServerHandle, Shutdown};
use sigag_store::{EpochStore, FileKv, KvStore};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{
    AggregatorContext, AggregatorError, EpochOrchestrator, OrchestratorConfig, RegisterOptions,
    aggregator_methods,
};

/// Builds and starts an aggregator.
#[derive(Debug)]
pub struct AggregatorService {
    config: AggregatorConfig,
    orchestrator: Option<OrchestratorConfig>,
    kv: Option<Arc<dyn KvStore>>,
}

impl AggregatorService {
    /// Service for `config`. The epoch store lives under `config.data_dir`.
    pub const fn new(config: AggregatorConfig) -> Self {
        Self { config, orchestrator: None, kv: None }
    }

    /// Use `kv` instead of the file store.
    #[must_use]
    pub fn with_store(mut self, kv: Arc<dyn KvStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    /// Override the timings derived from the config.
    #[must_use]
    pub fn with_orchestrator(mut self, config: OrchestratorConfig) -> Self {
        self.orchestrator = Some(config);
        self
    }

    /// Bind the RPC server and spawn the orchestrator.
    ///
    /// A fatal orchestrator error triggers `shutdown`, stopping the server.
    pub async fn start(self, shutdown: &Shutdown) -> Result<AggregatorHandle, AggregatorError> {
        self.config.validate()?;
        let addr = self.config.socket_addr()?;
        let kv = match self.kv {
            Some(kv) => kv,
            None => Arc::new(FileKv::open(self.config.store_path())?),
        };
        let store = EpochStore::new(kv);
        let context = Arc::new(AggregatorContext::new());
        let restored = restore_parties(&context, &store, self.config.rpc_timeout())?;
        if restored > 0 {
            info!(parties = restored, "restored frozen membership from the epoch store");
        }

        let options = RegisterOptions {
            rpc_timeout: self.config.rpc_timeout(),
            ping_on_register: self.config.ping_on_register,
        };
        let methods = aggregator_methods(Arc::clone(&context), store.clone(), options)?;
        let server = RpcServer::new(methods, RpcServerConfig::new(addr))
            .start(shutdown.listener())
            .await?;

        let timings =
            self.orchestrator.unwrap_or_else(|| OrchestratorConfig::from(&self.config));
        let orchestrator = EpochOrchestrator::new(Arc::clone(&context), store.clone(), timings)?;
        info!(addr = %server.local_addr(), epoch = orchestrator.epoch(), "aggregator started");

        let listener = shutdown.listener();
        let trigger = shutdown.clone();
        let task = tokio::spawn(async move {
            let result = orchestrator.run(listener).await;
            if let Err(e) = &result {
                error!(error = %e, "orchestrator stopped on fatal error, shutting down");
                trigger.trigger();
            }
            result
        });

        Ok(AggregatorHandle { server, orchestrator: task, context, store })
    }
}

/// Re-register the last frozen party set so a restarted aggregator keeps its
/// membership. Returns the number of parties restored.
fn restore_parties(
    context: &AggregatorContext,
    store: &EpochStore,
    rpc_timeout: Duration,
) -> Result<usize, AggregatorError> {
    let parties = store.get_parties()?;
    for (id, url) in &parties {
        let client = PartyClient::new(id.as_str(), url.as_str(), rpc_timeout)
            .map_err(|source| AggregatorError::Restore { id: id.clone(), source })?;
        let client: Arc<dyn PartyApi> = Arc::new(client);
        context.restore(PartyHandle::new(id.as_str(), url.as_str(), client))?;
    }
    Ok(parties.len())
}

/// Handle of a running aggregator.
pub struct AggregatorHandle {
    server: RpcServerHandle,
    orchestrator: JoinHandle<Result<(), AggregatorError>>,
    context: Arc<AggregatorContext>,
    store: EpochStore,
}

impl std::fmt::Debug for AggregatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorHandle")
            .field("local_addr", &self.server.local_addr())
            .finish_non_exhaustive()
    }
}

impl AggregatorHandle {
    /// Bound RPC address.
    pub const fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Plain-HTTP URL of the RPC server.
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Shared registry and lock.
    pub const fn context(&self) -> &Arc<AggregatorContext> {
        &self.context
    }

    /// Epoch store.
    pub const fn store(&self) -> &EpochStore {
        &self.store
    }

    /// Wait for the orchestrator and the server to stop.
    pub async fn stopped(self) -> Result<(), AggregatorError> {
        let result = match self.orchestrator.await {
            Ok(result) => result,
            Err(e) => Err(AggregatorError::Task(e.to_string())),
        };
        self.server.stopped().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sigag_client::AggregatorClient;
    use sigag_store::MemoryKv;

    use super::*;

    fn test_config() -> AggregatorConfig {
        AggregatorConfig {
            listen_addr: "127.0.0.1:0".into(),
            ping_on_register: false,
            ..Default::default()
        }
    }

    fn quick() -> OrchestratorConfig {
        OrchestratorConfig {
            initial_tick: Duration::from_secs(60),
            epoch_duration: Duration::from_secs(60),
            threshold_factor: 2.0,
        }
    }

    #[tokio::test]
    async fn test_start_serves_and_stops() {
        let shutdown = Shutdown::new();
        let handle = AggregatorService::new(test_config())
            .with_store(Arc::new(MemoryKv::new()))
            .with_orchestrator(quick())
            .start(&shutdown)
            .await
            .unwrap();

        let client = AggregatorClient::new(handle.url(), Duration::from_secs(2)).unwrap();
        assert_eq!(client.health().await.unwrap().status, "ok");
        assert!(client.register("8801", "127.0.0.1:8801/", true).await.unwrap());
        assert_eq!(handle.context().len(), 1);
        assert!(client.get_epoch_parties().await.unwrap().is_empty());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle.stopped()).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_start_uses_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = AggregatorConfig { data_dir: dir.path().join("agg"), ..test_config() };
        let shutdown = Shutdown::new();
        let handle =
            AggregatorService::new(config).with_orchestrator(quick()).start(&shutdown).await.unwrap();
        assert_eq!(handle.store().latest_epoch().unwrap(), None);

        shutdown.trigger();
        handle.stopped().await.unwrap();
    }

    #[tokio::test]
    async fn test_restart_restores_frozen_membership() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        let frozen: sigag_client::Parties = [
            ("p1".to_string(), "http://127.0.0.1:9/".to_string()),
            ("p2".to_string(), "http://127.0.0.1:10/".to_string()),
        ]
        .into_iter()
        .collect();
        let seed = EpochStore::new(Arc::clone(&kv));
        seed.put_parties(&frozen).unwrap();
        seed.put_threshold(2, 3).unwrap();

        let shutdown = Shutdown::new();
        let handle = AggregatorService::new(test_config())
            .with_store(kv)
            .with_orchestrator(quick())
            .start(&shutdown)
            .await
            .unwrap();

        assert_eq!(handle.context().parties(), frozen);
        let client = AggregatorClient::new(handle.url(), Duration::from_secs(2)).unwrap();
        assert_eq!(client.get_parties().await.unwrap(), frozen);
        assert_eq!(client.get_epoch_parties().await.unwrap(), frozen);
        let err = client.register("p1", "127.0.0.1:9/", true).await.unwrap_err();
        assert!(err.to_string().contains("address already registered"), "{err}");

        shutdown.trigger();
        handle.stopped().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = AggregatorConfig { threshold_factor: 0.0, ..test_config() };
        let err = AggregatorService::new(config).start(&Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Config(_)));
    }
}
