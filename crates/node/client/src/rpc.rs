//! JSON-RPC over HTTP POST.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use sigag_rpc::{Request, Response};
use tracing::trace;

use crate::ClientError;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Calls methods on one JSON-RPC endpoint.
#[derive(Debug)]
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Client for the endpoint at `url`, giving up on each call after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self { url: url.into(), http, timeout, next_id: AtomicU64::new(1) })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Per-call timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke `method` and decode its result.
    pub async fn call<P, R>(&self, method: &str, params: Option<P>) -> Result<R, ClientError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = params
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request::new(method, params, Value::from(id));
        trace!(url = %self.url, method, id, "sending RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_transport(e))?;
        let envelope: Response = serde_json::from_slice(&body)
            .map_err(|_| ClientError::Http { url: self.url.clone(), status: status.as_u16() })?;

        let result = envelope.into_result()?;
        serde_json::from_value(result).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn map_transport(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout { url: self.url.clone(), timeout: self.timeout }
        } else {
            ClientError::Transport { url: self.url.clone(), message: err.to_string() }
        }
    }
}
