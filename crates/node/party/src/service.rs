//! Party service: RPC server plus registration with the aggregator.

use std::{net::SocketAddr, sync::Arc};

use sigag_client::AggregatorClient;
use sigag_config::PartyConfig;
use sigag_dkg::DkgConfig;
use sigag_rpc::{RpcServer, RpcServerConfig, RpcServerHandle, ServerError, Shutdown};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{HttpTransport, PartyError, PartyNode, party_methods};

/// Builds and starts a party.
#[derive(Debug)]
pub struct PartyService {
    config: PartyConfig,
    register: bool,
}

impl PartyService {
    /// Service for `config`.
    pub const fn new(config: PartyConfig) -> Self {
        Self { config, register: true }
    }

    /// Do not register with the aggregator on start.
    #[must_use]
    pub const fn without_registration(mut self) -> Self {
        self.register = false;
        self
    }

    /// Bind the RPC server, then register with the aggregator.
    ///
    /// A listen port of `0` is resolved before the id and URL are derived,
    /// so ephemeral parties register under their bound port.
    pub async fn start(self, shutdown: &Shutdown) -> Result<PartyHandle, PartyError> {
        self.config.validate()?;
        let listener =
            TcpListener::bind(self.config.socket_addr()?).await.map_err(ServerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
        let config = PartyConfig { listen_addr: local_addr.to_string(), ..self.config };
        let id = config.party_id();

        let mut dkg = DkgConfig::default().with_deadline(config.round_deadline());
        if let Some(dir) = &config.data_dir {
            dkg = dkg.with_data_dir(dir.clone());
        }
        let transport = Arc::new(HttpTransport::new(config.rpc_timeout()));
        let node = Arc::new(PartyNode::new(id.as_str(), transport, dkg, shutdown.listener()));

        let methods = party_methods(Arc::clone(&node))?;
        let server = RpcServer::new(methods, RpcServerConfig::new(local_addr))
            .start_with_listener(listener, shutdown.listener())?;
        info!(id = %id, addr = %local_addr, "party started");

        if self.register {
            let url = config.registration_url();
            let registered =
                match AggregatorClient::new(&config.aggregator_url, config.rpc_timeout()) {
                    Ok(aggregator) => aggregator.register(&id, &url, config.no_tls).await,
                    Err(e) => Err(e),
                };
            if let Err(e) = registered {
                warn!(id = %id, aggregator = %config.aggregator_url, error = %e, "registration failed");
                server.abort();
                return Err(e.into());
            }
            info!(id = %id, %url, aggregator = %config.aggregator_url, "registered with aggregator");
        }

        Ok(PartyHandle { id, node, server })
    }
}

/// Handle of a running party.
#[derive(Debug)]
pub struct PartyHandle {
    id: String,
    node: Arc<PartyNode>,
    server: RpcServerHandle,
}

impl PartyHandle {
    /// Party id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bound RPC address.
    pub const fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Plain-HTTP URL of the RPC server.
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// The party's node.
    pub const fn node(&self) -> &Arc<PartyNode> {
        &self.node
    }

    /// Wait for the server to stop.
    pub async fn stopped(self) {
        self.server.stopped().await;
    }
}
