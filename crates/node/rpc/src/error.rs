//! JSON-RPC error types and code conventions.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::{ErrorObject, ValidationError};

/// JSON-RPC error codes.
pub mod codes {
    /// Invalid JSON was received, or a handler failed.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;

    /// Server error (reserved range: -32000 to -32099).
    pub const SERVER_ERROR: i32 = -32000;
    /// The request conflicts with the node's current state.
    pub const STATE_CONFLICT: i32 = -32010;
    /// An announced epoch is not newer than the one already accepted.
    pub const STALE_EPOCH: i32 = -32011;
    /// A peer message failed cryptographic verification.
    pub const VERIFICATION_FAILED: i32 = -32012;
}

/// HTTP status used to answer a single (non-batch) call with the given code.
pub const fn status_for_code(code: i32) -> StatusCode {
    match code {
        codes::INVALID_REQUEST | codes::INVALID_PARAMS => StatusCode::BAD_REQUEST,
        codes::METHOD_NOT_FOUND => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Errors returned by method handlers.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The call carried no parameters but the method needs some.
    #[error("params is nil")]
    MissingParams,

    /// Parameters could not be decoded into the method's parameter type.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// A required parameter field was empty.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request is well formed but conflicts with node state.
    #[error("{message}")]
    State {
        /// Error code, in the server range.
        code: i32,
        /// Human readable message.
        message: String,
        /// Optional structured detail.
        data: Option<Value>,
    },

    /// Any other handler failure.
    #[error("{0}")]
    Internal(String),
}

impl RpcError {
    /// State conflict with the generic code.
    pub fn state(message: impl Into<String>) -> Self {
        Self::State { code: codes::STATE_CONFLICT, message: message.into(), data: None }
    }

    /// State conflict with a specific code and detail payload.
    pub fn state_with(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self::State { code, message: message.into(), data: Some(data) }
    }

    /// Wire code for this error.
    pub const fn code(&self) -> i32 {
        match self {
            Self::MissingParams | Self::InvalidParams(_) | Self::Validation(_) => {
                codes::INVALID_PARAMS
            }
            Self::State { code, .. } => *code,
            Self::Internal(_) => codes::PARSE_ERROR,
        }
    }
}

impl From<RpcError> for ErrorObject {
    fn from(err: RpcError) -> Self {
        let code = err.code();
        match err {
            RpcError::State { message, data, .. } => Self { code, message, data },
            other => Self::new(code, other.to_string()),
        }
    }
}

/// Errors raised while building the method table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// Method names must be non-empty.
    #[error("jsonrpc: method name should not be empty")]
    EmptyName,

    /// A handler is already registered under this name.
    #[error("jsonrpc: method already registered: {0}")]
    Duplicate(String),
}

/// Error type for RPC server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listener.
    #[error("failed to bind server: {0}")]
    Bind(std::io::Error),
    /// Failed to read the bound address.
    #[error("failed to read local address: {0}")]
    LocalAddr(std::io::Error),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(codes::INVALID_REQUEST, StatusCode::BAD_REQUEST)]
    #[case(codes::INVALID_PARAMS, StatusCode::BAD_REQUEST)]
    #[case(codes::METHOD_NOT_FOUND, StatusCode::NOT_FOUND)]
    #[case(codes::PARSE_ERROR, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(codes::STATE_CONFLICT, StatusCode::INTERNAL_SERVER_ERROR)]
    fn status_mapping(#[case] code: i32, #[case] status: StatusCode) {
        assert_eq!(status_for_code(code), status);
    }

    #[test]
    fn missing_params_display() {
        assert_eq!(RpcError::MissingParams.to_string(), "params is nil");
        assert_eq!(RpcError::MissingParams.code(), codes::INVALID_PARAMS);
    }

    #[test]
    fn validation_is_invalid_params() {
        let err: RpcError = ValidationError::Missing { field: "url" }.into();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
        assert_eq!(err.to_string(), "field 'url' is required but missing or null in JSON");
    }

    #[test]
    fn internal_uses_parse_error_class() {
        let err = RpcError::Internal("boom".into());
        let obj: ErrorObject = err.into();
        assert_eq!(obj.code, codes::PARSE_ERROR);
        assert_eq!(obj.message, "boom");
    }

    #[test]
    fn state_keeps_code_and_data() {
        let err = RpcError::state_with(codes::STALE_EPOCH, "stale", json!({ "current": 3 }));
        let obj: ErrorObject = err.into();
        assert_eq!(obj.code, codes::STALE_EPOCH);
        assert_eq!(obj.data, Some(json!({ "current": 3 })));
    }

    #[test]
    fn register_error_display() {
        assert_eq!(
            RegisterError::Duplicate("ping".into()).to_string(),
            "jsonrpc: method already registered: ping"
        );
        assert_eq!(RegisterError::EmptyName.to_string(), "jsonrpc: method name should not be empty");
    }
}
