//! Method table and request dispatch.

use std::{collections::BTreeMap, future::Future, sync::Arc, time::Instant};

use futures::{FutureExt, future::BoxFuture};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    ErrorObject, JSONRPC_VERSION, RegisterError, Request, RequiredFields, Response, RpcError,
    codes, to_snake_case,
};

/// Raw parameters of a call, decoded on demand by the handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Option<Value>);

impl Params {
    /// Wrap raw parameters. JSON `null` counts as absent.
    pub fn new(raw: Option<Value>) -> Self {
        Self(raw.filter(|v| !v.is_null()))
    }

    /// Returns `true` when the call carried no parameters.
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the raw parameters.
    pub const fn raw(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    /// Decode into `T` and check its required fields.
    pub fn parse<T>(self) -> Result<T, RpcError>
    where
        T: DeserializeOwned + RequiredFields,
    {
        let raw = self.0.ok_or(RpcError::MissingParams)?;
        let parsed: T =
            serde_json::from_value(raw).map_err(|e| RpcError::InvalidParams(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }
}

type Handler = Arc<dyn Fn(Params) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

/// Explicit method name to handler table.
///
/// Built once at startup and then shared read-only by the server.
#[derive(Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, Handler>,
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry").field("methods", &self.methods.keys()).finish()
    }
}

impl MethodRegistry {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`.
    ///
    /// Fails on an empty name or when the name is already taken.
    pub fn register<F, Fut, R>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<(), RegisterError>
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RpcError>> + Send + 'static,
        R: Serialize,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }
        if self.methods.contains_key(&name) {
            return Err(RegisterError::Duplicate(name));
        }

        let handler: Handler = Arc::new(move |params: Params| {
            handler(params)
                .map(|out| {
                    out.and_then(|value| {
                        serde_json::to_value(value).map_err(|e| RpcError::Internal(e.to_string()))
                    })
                })
                .boxed()
        });
        debug!(method = %name, "registered rpc method");
        self.methods.insert(name, handler);
        Ok(())
    }

    /// Register `handler` under the `snake_case` form of a `CamelCase` name.
    pub fn register_named<F, Fut, R>(&mut self, name: &str, handler: F) -> Result<(), RegisterError>
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RpcError>> + Send + 'static,
        R: Serialize,
    {
        self.register(to_snake_case(name), handler)
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Dispatch a single request.
    pub async fn dispatch(&self, request: Request) -> Response {
        let Some(id) = request.id else {
            return Response::failure(
                Value::Null,
                ErrorObject::new(codes::INVALID_REQUEST, "jsonrpc: id cannot be nil"),
            );
        };

        if request.method.is_empty() || request.jsonrpc != JSONRPC_VERSION {
            return Response::failure(
                id,
                ErrorObject::new(codes::INVALID_REQUEST, "jsonrpc: invalid request"),
            );
        }

        let Some(handler) = self.methods.get(&request.method).cloned() else {
            warn!(method = %request.method, "rpc method not found");
            return Response::failure(
                id,
                ErrorObject::new(codes::METHOD_NOT_FOUND, "jsonrpc: method not found"),
            );
        };

        let started = Instant::now();
        let outcome = handler(Params::new(request.params)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                debug!(method = %request.method, elapsed_ms, "rpc call served");
                Response::success(id, result)
            }
            Err(err) => {
                warn!(method = %request.method, elapsed_ms, error = %err, "rpc call failed");
                Response::failure(id, err.into())
            }
        }
    }

    /// Dispatch a batch element-wise, keeping input order.
    pub async fn dispatch_batch(&self, requests: Vec<Request>) -> Vec<Response> {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            responses.push(self.dispatch(request).await);
        }
        responses
    }
}
