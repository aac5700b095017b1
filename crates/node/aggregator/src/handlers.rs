//! JSON-RPC methods served by the aggregator.

use std::{sync::Arc, time::Duration};

use sigag_client::{
    HealthResult, Parties, PartyApi, PartyClient, PingResult, RegisterParams, with_scheme,
};
use sigag_registry::PartyHandle;
use sigag_rpc::{MethodRegistry, Params, RegisterError, RpcError};
use sigag_store::EpochStore;
use tracing::{info, warn};

use crate::{AggregatorContext, RegistrationError};

/// How registrants are connected to.
#[derive(Debug, Clone, Copy)]
pub struct RegisterOptions {
    /// Timeout of every call made to a registered party.
    pub rpc_timeout: Duration,
    /// Ping the registrant before accepting it.
    pub ping_on_register: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self { rpc_timeout: sigag_client::DEFAULT_TIMEOUT, ping_on_register: true }
    }
}

impl From<RegistrationError> for RpcError {
    fn from(err: RegistrationError) -> Self {
        Self::state(err.to_string())
    }
}

/// Method table of the aggregator.
pub fn aggregator_methods(
    context: Arc<AggregatorContext>,
    store: EpochStore,
    options: RegisterOptions,
) -> Result<MethodRegistry, RegisterError> {
    let mut methods = MethodRegistry::new();

    methods.register("ping", |_params: Params| async { Ok::<_, RpcError>(PingResult::pong()) })?;
    methods
        .register("health", |_params: Params| async { Ok::<_, RpcError>(HealthResult::ok()) })?;

    let ctx = Arc::clone(&context);
    methods.register("register", move |params: Params| {
        let ctx = Arc::clone(&ctx);
        async move {
            let params: RegisterParams = params.parse()?;
            register(&ctx, params, options).await
        }
    })?;

    let ctx = Arc::clone(&context);
    methods.register_named("GetParties", move |_params: Params| {
        let parties = ctx.parties();
        async move { Ok::<_, RpcError>(parties) }
    })?;

    methods.register_named("GetEpochParties", move |_params: Params| {
        let parties: Result<Parties, RpcError> =
            store.get_parties().map_err(|e| RpcError::Internal(e.to_string()));
        async move { parties }
    })?;

    Ok(methods)
}

async fn register(
    ctx: &AggregatorContext,
    params: RegisterParams,
    options: RegisterOptions,
) -> Result<bool, RpcError> {
    let RegisterParams { address, url, no_tls } = params;
    ctx.check_registrable(&address)?;

    let url = with_scheme(&url, no_tls);
    let client = PartyClient::new(address.as_str(), url.as_str(), options.rpc_timeout)
        .map_err(|e| RpcError::Internal(e.to_string()))?;
    if options.ping_on_register {
        if let Err(e) = client.ping().await {
            warn!(id = %address, %url, error = %e, "registrant did not answer ping");
            return Err(RegistrationError::Unreachable { id: address, reason: e.to_string() }.into());
        }
    }

    let client: Arc<dyn PartyApi> = Arc::new(client);
    ctx.register(PartyHandle::new(address.as_str(), url.as_str(), client))?;
    info!(id = %address, %url, "party registered");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use sigag_rpc::{Request, RpcServer, RpcServerConfig, Shutdown, codes};
    use sigag_store::MemoryKv;

    use super::*;

    fn setup(ping_on_register: bool) -> (Arc<AggregatorContext>, EpochStore, MethodRegistry) {
        let ctx = Arc::new(AggregatorContext::new());
        let store = EpochStore::new(Arc::new(MemoryKv::new()));
        let options =
            RegisterOptions { rpc_timeout: Duration::from_millis(500), ping_on_register };
        let methods = aggregator_methods(Arc::clone(&ctx), store.clone(), options).unwrap();
        (ctx, store, methods)
    }

    async fn call(methods: &MethodRegistry, method: &str, params: Option<Value>) -> Value {
        let response = methods.dispatch(Request::new(method, params, json!(1))).await;
        serde_json::to_value(response).unwrap()
    }

    async fn pinged_party() -> (Shutdown, String) {
        let mut registry = MethodRegistry::new();
        registry
            .register("ping", |_params: Params| async { Ok::<_, RpcError>(PingResult::pong()) })
            .unwrap();
        let shutdown = Shutdown::new();
        let handle = RpcServer::new(registry, RpcServerConfig::default())
            .start(shutdown.listener())
            .await
            .unwrap();
        (shutdown, handle.url())
    }

    #[tokio::test]
    async fn test_ping_and_health() {
        let (_, _, methods) = setup(false);
        assert_eq!(call(&methods, "ping", None).await["result"], json!({ "message": "pong" }));
        assert_eq!(call(&methods, "health", None).await["result"], json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_register_then_get_parties() {
        let (ctx, _, methods) = setup(false);
        for port in ["8801", "8802"] {
            let params = json!({ "address": port, "url": format!("127.0.0.1:{port}/"), "noTLS": true });
            assert_eq!(call(&methods, "register", Some(params)).await["result"], json!(true));
        }

        let parties = call(&methods, "get_parties", None).await;
        assert_eq!(
            parties["result"],
            json!({ "8801": "http://127.0.0.1:8801/", "8802": "http://127.0.0.1:8802/" })
        );
        assert_eq!(ctx.len(), 2);
    }

    #[tokio::test]
    async fn test_register_tls_scheme() {
        let (ctx, _, methods) = setup(false);
        let params = json!({ "address": "p1", "url": "party.example/", "noTLS": false });
        call(&methods, "register", Some(params)).await;
        assert_eq!(ctx.parties()["p1"], "https://party.example/");
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (ctx, _, methods) = setup(false);
        let params = json!({ "address": "8801", "url": "127.0.0.1:8801/", "noTLS": true });
        call(&methods, "register", Some(params.clone())).await;

        let response = call(&methods, "register", Some(params)).await;
        assert_eq!(response["error"]["code"], json!(codes::STATE_CONFLICT));
        assert_eq!(response["error"]["message"], json!("address already registered"));
        assert_eq!(ctx.len(), 1);
    }

    #[tokio::test]
    async fn test_register_while_locked() {
        let (ctx, _, methods) = setup(false);
        let _lock = ctx.lock_registration();
        let params = json!({ "address": "8801", "url": "127.0.0.1:8801/", "noTLS": true });

        let response = call(&methods, "register", Some(params)).await;
        assert_eq!(
            response["error"]["message"],
            json!("registration is locked while an epoch transition is in progress")
        );
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn test_register_missing_field() {
        let (_, _, methods) = setup(false);
        let response =
            call(&methods, "register", Some(json!({ "address": "", "url": "x/" }))).await;
        assert_eq!(response["error"]["code"], json!(codes::INVALID_PARAMS));
        assert_eq!(
            response["error"]["message"],
            json!("field 'address' is required but missing or null in JSON")
        );
    }

    #[tokio::test]
    async fn test_register_pings_registrant() {
        let (ctx, _, methods) = setup(true);
        let (_shutdown, url) = pinged_party().await;

        let ok = call(&methods, "register", Some(json!({ "address": "live", "url": url }))).await;
        assert_eq!(ok["result"], json!(true));

        let dead = json!({ "address": "dead", "url": "127.0.0.1:1/", "noTLS": true });
        let response = call(&methods, "register", Some(dead)).await;
        assert_eq!(response["error"]["code"], json!(codes::STATE_CONFLICT));
        assert!(!ctx.parties().contains_key("dead"));
        assert!(ctx.parties().contains_key("live"));
    }

    #[tokio::test]
    async fn test_get_epoch_parties_reads_store() {
        let (_, store, methods) = setup(false);
        assert_eq!(call(&methods, "get_epoch_parties", None).await["result"], json!({}));

        let parties: Parties = [("8801".to_string(), "http://127.0.0.1:8801/".to_string())].into();
        store.put_parties(&parties).unwrap();
        assert_eq!(
            call(&methods, "get_epoch_parties", None).await["result"],
            json!({ "8801": "http://127.0.0.1:8801/" })
        );
    }
}
