//! HTTP binding for the method registry.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response as HttpResponse},
    routing::post,
};
use serde_json::Value;
use thiserror::Error;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info};

use crate::{
    ErrorObject, MethodRegistry, Request, Response, ServerError, ShutdownListener, codes,
    config::{CorsConfig, RpcServerConfig},
    status_for_code,
};

/// Required content type prefix for inbound calls.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Reasons an HTTP body is rejected before any handler runs.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The content type header is absent or not JSON.
    #[error("jsonrpc: invalid content type: {0}")]
    InvalidContentType(String),
    /// The body is empty.
    #[error("jsonrpc: empty request")]
    Empty,
    /// The body is not a request or a batch of requests.
    #[error("jsonrpc: failed to decode request: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A decoded HTTP body.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A single request object.
    Single(Request),
    /// A JSON array of requests.
    Batch(Vec<Request>),
}

/// Decode an HTTP body into a single request or a batch.
///
/// A batch is recognised by `[` as the first non-whitespace byte.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Result<Incoming, DecodeError> {
    let content_type = content_type.unwrap_or_default();
    if !content_type.starts_with(CONTENT_TYPE_JSON) {
        return Err(DecodeError::InvalidContentType(content_type.to_string()));
    }

    let Some(first) = body.iter().find(|b| !b.is_ascii_whitespace()) else {
        return Err(DecodeError::Empty);
    };

    if *first == b'[' {
        Ok(Incoming::Batch(serde_json::from_slice(body)?))
    } else {
        Ok(Incoming::Single(serde_json::from_slice(body)?))
    }
}

/// Build a CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        return CorsLayer::new();
    }

    let mut layer = CorsLayer::new();

    if config.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> =
            config.allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer = layer.allow_origin(AllowOrigin::list(origins));
    }

    let methods: Vec<Method> =
        config.allowed_methods.iter().filter_map(|m| m.parse().ok()).collect();
    let headers: Vec<HeaderName> =
        config.allowed_headers.iter().filter_map(|h| h.parse().ok()).collect();

    layer.allow_methods(methods).allow_headers(headers).max_age(config.max_age)
}

/// JSON-RPC server serving a [`MethodRegistry`] on `POST /`.
pub struct RpcServer {
    registry: Arc<MethodRegistry>,
    config: RpcServerConfig,
}

impl std::fmt::Debug for RpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcServer")
            .field("addr", &self.config.addr)
            .field("methods", &self.registry.method_names())
            .finish()
    }
}

impl RpcServer {
    /// Create a server for `registry`.
    pub fn new(registry: MethodRegistry, config: RpcServerConfig) -> Self {
        Self { registry: Arc::new(registry), config }
    }

    /// The axum router, without binding a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(rpc_handler))
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(build_cors_layer(&self.config.cors))
            .layer(ConcurrencyLimitLayer::new(self.config.max_connections as usize))
            .with_state(Arc::clone(&self.registry))
    }

    /// Bind the listener and serve until `shutdown` fires.
    ///
    /// Returns once the socket is bound, so the reported address is usable
    /// immediately.
    pub async fn start(self, shutdown: ShutdownListener) -> Result<RpcServerHandle, ServerError> {
        let listener =
            tokio::net::TcpListener::bind(self.config.addr).await.map_err(ServerError::Bind)?;
        self.start_with_listener(listener, shutdown)
    }

    /// Serve on an already bound `listener`, ignoring the configured address.
    pub fn start_with_listener(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: ShutdownListener,
    ) -> Result<RpcServerHandle, ServerError> {
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
        let app = self.router();

        info!(addr = %local_addr, methods = ?self.registry.method_names(), "Starting RPC server");

        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.wait().await });
            if let Err(e) = serve.await {
                error!(error = %e, "RPC server error");
            }
            info!(addr = %local_addr, "RPC server stopped");
        });

        Ok(RpcServerHandle { local_addr, task })
    }
}

/// Handle for a running RPC server.
pub struct RpcServerHandle {
    local_addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for RpcServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcServerHandle").field("local_addr", &self.local_addr).finish_non_exhaustive()
    }
}

impl RpcServerHandle {
    /// The bound address.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Plain-HTTP URL of the server root.
    pub fn url(&self) -> String {
        format!("http://{}/", self.local_addr)
    }

    /// Wait for the server task to finish.
    pub async fn stopped(self) {
        let _ = self.task.await;
    }

    /// Abort the server task.
    pub fn abort(self) {
        self.task.abort();
    }
}

async fn rpc_handler(
    State(registry): State<Arc<MethodRegistry>>,
    headers: HeaderMap,
    body: Bytes,
) -> HttpResponse {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let incoming = match decode_body(content_type, &body) {
        Ok(incoming) => incoming,
        Err(e) => {
            let resp = Response::failure(Value::Null, ErrorObject::new(codes::PARSE_ERROR, e.to_string()));
            return (StatusCode::BAD_REQUEST, Json(resp)).into_response();
        }
    };

    match incoming {
        Incoming::Single(request) => {
            let resp = registry.dispatch(request).await;
            let status = resp.error.as_ref().map_or(StatusCode::OK, |e| status_for_code(e.code));
            (status, Json(resp)).into_response()
        }
        Incoming::Batch(requests) if requests.is_empty() => {
            let resp = Response::failure(
                Value::Null,
                ErrorObject::new(codes::INVALID_REQUEST, "jsonrpc: empty batch"),
            );
            (StatusCode::BAD_REQUEST, Json(resp)).into_response()
        }
        Incoming::Batch(requests) => {
            let resps = registry.dispatch_batch(requests).await;
            (StatusCode::OK, Json(resps)).into_response()
        }
    }
}
