//! RPC server configuration.

use std::{net::SocketAddr, time::Duration};

/// Default maximum request body size (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Configuration for the RPC server.
#[derive(Clone, Debug)]
pub struct RpcServerConfig {
    /// Address to listen on. Port `0` picks an ephemeral port.
    pub addr: SocketAddr,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Maximum number of concurrently served requests.
    pub max_connections: u32,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl RpcServerConfig {
    /// Create a configuration listening on `addr` with default limits.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            cors: CorsConfig::default(),
            max_connections: 100,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Set CORS configuration.
    #[must_use]
    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    /// Set maximum concurrent connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the request body limit.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 0)))
    }
}

/// CORS configuration for the RPC server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    /// Allowed origins. Empty means no CORS headers are sent; `["*"]` allows all.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed headers.
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache.
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CorsConfig {
    /// A config that sends no CORS headers.
    pub const fn none() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            max_age: Duration::ZERO,
        }
    }

    /// Allow every origin for the methods and headers JSON-RPC over HTTP needs.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec![
                "Origin".to_string(),
                "Authorization".to_string(),
                "Content-Type".to_string(),
            ],
            max_age: Duration::from_secs(3600),
        }
    }
}
