#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/sigag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{CorsConfig, DEFAULT_MAX_BODY_BYTES, RpcServerConfig};

mod error;
pub use error::{RegisterError, RpcError, ServerError, codes, status_for_code};

mod naming;
pub use naming::to_snake_case;

mod registry;
pub use registry::{MethodRegistry, Params};

mod server;
pub use server::{CONTENT_TYPE_JSON, DecodeError, Incoming, RpcServer, RpcServerHandle, decode_body};

mod shutdown;
pub use shutdown::{Shutdown, ShutdownListener};

mod types;
pub use types::{ErrorObject, JSONRPC_VERSION, Request, Response};

mod validate;
pub use validate::{IsEmpty, RequiredFields, ValidationError};
