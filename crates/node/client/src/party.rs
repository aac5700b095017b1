//! Client for the party-hosted methods.

use std::time::Duration;

use async_trait::async_trait;
use sigag_dkg::{DkgStatus, Round1Message, Round2Message};

use crate::{
    ClientError, DkgInitParams, DkgRound1Params, DkgRound2Params, NewEpochParams, Parties,
    PingResult, RpcClient,
};

/// Orchestration calls the aggregator issues to a party.
#[async_trait]
pub trait PartyApi: Send + Sync + std::fmt::Debug + 'static {
    /// Liveness probe.
    async fn ping(&self) -> Result<PingResult, ClientError>;

    /// Announce `epoch`.
    async fn new_epoch(&self, epoch: u64) -> Result<bool, ClientError>;

    /// Start the epoch's DKG over `parties` with `threshold`.
    async fn dkg_init(&self, parties: &Parties, threshold: u32) -> Result<bool, ClientError>;
}

/// RPC client bound to one party.
#[derive(Debug)]
pub struct PartyClient {
    id: String,
    rpc: RpcClient,
}

impl PartyClient {
    /// Client for party `id` serving at `url`.
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self { id: id.into(), rpc: RpcClient::new(url, timeout)? })
    }

    /// Party id and full URL.
    pub fn locate(&self) -> (&str, &str) {
        (&self.id, self.rpc.url())
    }

    /// Deliver a round-1 message.
    pub async fn dkg_round1(&self, msg: &Round1Message) -> Result<bool, ClientError> {
        self.rpc.call("dkg_round1", Some(DkgRound1Params(msg.clone()))).await
    }

    /// Deliver a round-2 message.
    pub async fn dkg_round2(&self, msg: &Round2Message) -> Result<bool, ClientError> {
        self.rpc.call("dkg_round2", Some(DkgRound2Params(msg.clone()))).await
    }

    /// Current DKG progress.
    pub async fn dkg_status(&self) -> Result<DkgStatus, ClientError> {
        self.rpc.call::<(), _>("dkg_status", None).await
    }
}

#[async_trait]
impl PartyApi for PartyClient {
    async fn ping(&self) -> Result<PingResult, ClientError> {
        self.rpc.call::<(), _>("ping", None).await
    }

    async fn new_epoch(&self, epoch: u64) -> Result<bool, ClientError> {
        self.rpc.call("new_epoch", Some(NewEpochParams { epoch })).await
    }

    async fn dkg_init(&self, parties: &Parties, threshold: u32) -> Result<bool, ClientError> {
        self.rpc
            .call("dkg_init", Some(DkgInitParams { parties: parties.clone(), threshold }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    };

    use serde_json::json;
    use sigag_rpc::{MethodRegistry, Params, RpcError, RpcServer, RpcServerConfig, Shutdown, codes};

    use super::*;

    async fn serve(registry: MethodRegistry) -> (Shutdown, String) {
        let shutdown = Shutdown::new();
        let server = RpcServer::new(registry, RpcServerConfig::default());
        let handle = server.start(shutdown.listener()).await.unwrap();
        (shutdown, handle.url())
    }

    fn fake_party() -> MethodRegistry {
        let current = Arc::new(AtomicU64::new(0));
        let mut registry = MethodRegistry::new();
        registry
            .register("ping", |_params: Params| async { Ok::<_, RpcError>(PingResult::pong()) })
            .unwrap();
        registry
            .register("new_epoch", move |params: Params| {
                let current = current.clone();
                async move {
                    let NewEpochParams { epoch } = params.parse()?;
                    let prev = current.load(Ordering::SeqCst);
                    if epoch <= prev {
                        return Err(RpcError::state_with(
                            codes::STALE_EPOCH,
                            "stale epoch",
                            json!({ "current": prev }),
                        ));
                    }
                    current.store(epoch, Ordering::SeqCst);
                    Ok::<_, RpcError>(true)
                }
            })
            .unwrap();
        registry
            .register("dkg_init", |params: Params| async move {
                let init: DkgInitParams = params.parse()?;
                Ok::<_, RpcError>(init.threshold as usize <= init.parties.len())
            })
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_party_calls_round_trip() {
        let (_shutdown, url) = serve(fake_party()).await;
        let client = PartyClient::new("8801", url.clone(), Duration::from_secs(2)).unwrap();

        assert_eq!(client.locate(), ("8801", url.as_str()));
        assert_eq!(client.ping().await.unwrap(), PingResult::pong());
        assert!(client.new_epoch(1).await.unwrap());

        let parties: Parties = [("8801".to_string(), url.clone())].into();
        assert!(client.dkg_init(&parties, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_epoch_surfaces_current() {
        let (_shutdown, url) = serve(fake_party()).await;
        let client = PartyClient::new("8801", url, Duration::from_secs(2)).unwrap();

        client.new_epoch(3).await.unwrap();
        let err = client.new_epoch(3).await.unwrap_err();
        assert_eq!(err.rpc_code(), Some(codes::STALE_EPOCH));
        assert_eq!(err.stale_epoch(), Some(3));
    }

    #[tokio::test]
    async fn test_validation_error_passed_through() {
        let (_shutdown, url) = serve(fake_party()).await;
        let client = PartyClient::new("8801", url, Duration::from_secs(2)).unwrap();

        let err = client.new_epoch(0).await.unwrap_err();
        assert_eq!(err.rpc_code(), Some(codes::INVALID_PARAMS));
        assert!(err.to_string().contains("field 'epoch' is required"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (_shutdown, url) = serve(fake_party()).await;
        let client = PartyClient::new("8801", url, Duration::from_secs(2)).unwrap();
        let err = client.dkg_status().await.unwrap_err();
        assert_eq!(err.rpc_code(), Some(codes::METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_unreachable_party_is_transport_error() {
        let client =
            PartyClient::new("9", "http://127.0.0.1:1/", Duration::from_millis(500)).unwrap();
        let err = client.ping().await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_slow_party_times_out() {
        let mut registry = MethodRegistry::new();
        registry
            .register("ping", |_params: Params| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, RpcError>(PingResult::pong())
            })
            .unwrap();
        let (_shutdown, url) = serve(registry).await;
        let client = PartyClient::new("8801", url, Duration::from_millis(100)).unwrap();

        let err = client.ping().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout { .. }), "unexpected error: {err}");
    }
}
