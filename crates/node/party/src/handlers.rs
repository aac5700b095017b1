//! JSON-RPC methods served by a party.

use std::sync::Arc;

use sigag_client::{DkgInitParams, DkgRound1Params, DkgRound2Params, NewEpochParams};
use sigag_dkg::PeerTransport;
use sigag_rpc::{MethodRegistry, Params, RegisterError, RpcError};

use crate::PartyNode;

/// Method table of `node`.
pub fn party_methods<T: PeerTransport>(
    node: Arc<PartyNode<T>>,
) -> Result<MethodRegistry, RegisterError> {
    let mut methods = MethodRegistry::new();

    let n = Arc::clone(&node);
    methods.register("ping", move |_params: Params| {
        let pong = n.ping();
        async move { Ok::<_, RpcError>(pong) }
    })?;

    let n = Arc::clone(&node);
    methods.register("new_epoch", move |params: Params| {
        let n = Arc::clone(&n);
        async move {
            let NewEpochParams { epoch } = params.parse()?;
            Ok::<_, RpcError>(n.new_epoch(epoch)?)
        }
    })?;

    let n = Arc::clone(&node);
    methods.register("dkg_init", move |params: Params| {
        let n = Arc::clone(&n);
        async move {
            let DkgInitParams { parties, threshold } = params.parse()?;
            Ok::<_, RpcError>(n.dkg_init(parties, threshold)?)
        }
    })?;

    let n = Arc::clone(&node);
    methods.register("dkg_round1", move |params: Params| {
        let n = Arc::clone(&n);
        async move {
            let DkgRound1Params(msg) = params.parse()?;
            Ok::<_, RpcError>(n.dkg_round1(msg)?)
        }
    })?;

    let n = Arc::clone(&node);
    methods.register("dkg_round2", move |params: Params| {
        let n = Arc::clone(&n);
        async move {
            let DkgRound2Params(msg) = params.parse()?;
            Ok::<_, RpcError>(n.dkg_round2(msg)?)
        }
    })?;

    methods.register("dkg_status", move |_params: Params| {
        let status = node.dkg_status();
        async move { Ok::<_, RpcError>(status) }
    })?;

    Ok(methods)
}
