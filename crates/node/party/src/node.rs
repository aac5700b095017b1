//! Party method implementations.

use std::{collections::BTreeMap, sync::Arc};

use rand_core::OsRng;
use sigag_client::{Parties, PingResult};
use sigag_dkg::{
    DkgCeremony, DkgConfig, DkgParticipant, DkgSession, DkgStatus, PeerTransport, Round1Message,
    Round2Message,
};
use sigag_rpc::ShutdownListener;
use tracing::{debug, info, warn};

use crate::{DkgStart, HttpTransport, PartyError, PartyState};

/// A party: its id, epoch state and the transport its DKG rounds use.
pub struct PartyNode<T = HttpTransport> {
    id: String,
    state: PartyState,
    transport: Arc<T>,
    dkg: DkgConfig,
    shutdown: ShutdownListener,
}

impl<T> std::fmt::Debug for PartyNode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartyNode")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: PeerTransport> PartyNode<T> {
    /// Node `id` delivering round messages over `transport`.
    ///
    /// Running rounds are abandoned once `shutdown` fires.
    pub fn new(
        id: impl Into<String>,
        transport: Arc<T>,
        dkg: DkgConfig,
        shutdown: ShutdownListener,
    ) -> Self {
        Self { id: id.into(), state: PartyState::new(), transport, dkg, shutdown }
    }

    /// Party id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Epoch and DKG state.
    pub const fn state(&self) -> &PartyState {
        &self.state
    }

    /// Liveness probe.
    pub fn ping(&self) -> PingResult {
        PingResult::pong()
    }

    /// Accept an epoch announcement.
    pub fn new_epoch(&self, epoch: u64) -> Result<bool, PartyError> {
        self.state.accept_epoch(epoch)?;
        info!(id = %self.id, epoch, "accepted new epoch");
        Ok(true)
    }

    /// Start the current epoch's DKG over `parties` in the background.
    pub fn dkg_init(self: &Arc<Self>, parties: Parties, threshold: u32) -> Result<bool, PartyError> {
        let start = self.state.begin_dkg(&parties, threshold, |epoch| {
            DkgParticipant::new(&self.id, epoch, parties.keys(), threshold, &mut OsRng)
                .map(DkgSession::new)
        })?;
        let session = match start {
            DkgStart::Started(session) => session,
            DkgStart::AlreadyStarted => {
                debug!(id = %self.id, "dkg_init repeated for running round");
                return Ok(true);
            }
        };

        let epoch = session.epoch();
        let peers: BTreeMap<String, String> =
            parties.into_iter().filter(|(id, _)| *id != self.id).collect();
        info!(id = %self.id, epoch, threshold, peers = peers.len(), "starting DKG");

        let ceremony =
            DkgCeremony::new(session, peers, Arc::clone(&self.transport), self.dkg.clone());
        let node = Arc::clone(self);
        let mut shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.wait() => debug!(epoch, "DKG abandoned on shutdown"),
                result = ceremony.run() => match result {
                    Ok(output) => info!(
                        id = %node.id,
                        epoch,
                        share_index = output.share_index,
                        "DKG complete"
                    ),
                    Err(e) => warn!(id = %node.id, epoch, error = %e, "DKG failed"),
                },
            }
            node.state.finish_dkg(epoch);
        });
        Ok(true)
    }

    /// Accept a peer's round-1 commitments.
    pub fn dkg_round1(&self, msg: Round1Message) -> Result<bool, PartyError> {
        let session = self.state.session().ok_or(PartyError::NoSession)?;
        let sender = msg.sender.clone();
        session.handle_round1(msg).inspect_err(|e| {
            debug!(id = %self.id, %sender, error = %e, "rejected round 1 message");
        })?;
        Ok(true)
    }

    /// Accept a peer's round-2 share.
    pub fn dkg_round2(&self, msg: Round2Message) -> Result<bool, PartyError> {
        let session = self.state.session().ok_or(PartyError::NoSession)?;
        let sender = msg.sender.clone();
        session.handle_round2(msg).inspect_err(|e| {
            debug!(id = %self.id, %sender, error = %e, "rejected round 2 message");
        })?;
        Ok(true)
    }

    /// Progress of the latest round.
    pub fn dkg_status(&self) -> DkgStatus {
        self.state.status()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use sigag_dkg::{DkgError, DkgPhase};
    use sigag_rpc::Shutdown;

    use super::*;

    /// Delivers nothing; rounds stall until their deadline.
    #[derive(Debug)]
    struct Unreachable;

    #[async_trait]
    impl PeerTransport for Unreachable {
        async fn send_round1(&self, _url: &str, _msg: &Round1Message) -> Result<(), DkgError> {
            Err(DkgError::Network("unreachable".into()))
        }

        async fn send_round2(&self, _url: &str, _msg: &Round2Message) -> Result<(), DkgError> {
            Err(DkgError::Network("unreachable".into()))
        }
    }

    fn parties(ids: &[&str]) -> Parties {
        ids.iter().map(|id| (id.to_string(), format!("http://127.0.0.1:{id}/"))).collect()
    }

    fn node(id: &str, deadline: Duration, shutdown: &Shutdown) -> Arc<PartyNode<Unreachable>> {
        let dkg = DkgConfig::default()
            .with_deadline(deadline)
            .with_backoff(Duration::from_millis(5), Duration::from_millis(20));
        Arc::new(PartyNode::new(id, Arc::new(Unreachable), dkg, shutdown.listener()))
    }

    #[tokio::test]
    async fn test_new_epoch_rejects_stale() {
        let shutdown = Shutdown::new();
        let node = node("8801", Duration::from_secs(1), &shutdown);
        assert!(node.new_epoch(1).unwrap());
        assert!(matches!(node.new_epoch(1), Err(PartyError::StaleEpoch { current: 1, .. })));
        assert!(node.new_epoch(2).unwrap());
    }

    #[tokio::test]
    async fn test_failed_round_releases_lock() {
        let shutdown = Shutdown::new();
        let node = node("8801", Duration::from_millis(100), &shutdown);
        node.new_epoch(1).unwrap();
        assert!(node.dkg_init(parties(&["8801", "8802"]), 2).unwrap());
        assert!(node.state().is_locked());
        assert!(matches!(node.new_epoch(2), Err(PartyError::Locked)));

        tokio::time::timeout(Duration::from_secs(5), async {
            while node.state().is_locked() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(node.dkg_status().phase, DkgPhase::Failed);
        assert!(node.new_epoch(2).unwrap());
    }

    #[tokio::test]
    async fn test_shutdown_abandons_round() {
        let shutdown = Shutdown::new();
        let node = node("8801", Duration::from_secs(60), &shutdown);
        node.new_epoch(1).unwrap();
        node.dkg_init(parties(&["8801", "8802"]), 2).unwrap();

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), async {
            while node.state().is_locked() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_single_party_round_completes() {
        let shutdown = Shutdown::new();
        let node = node("8801", Duration::from_secs(5), &shutdown);
        node.new_epoch(1).unwrap();
        node.dkg_init(parties(&["8801"]), 1).unwrap();

        let session = node.state().session().unwrap();
        let mut rx = session.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.phase == DkgPhase::Complete))
            .await
            .unwrap()
            .unwrap();
        assert!(node.dkg_status().group_public_key.is_some());
    }

    #[tokio::test]
    async fn test_init_validation() {
        let shutdown = Shutdown::new();
        let node = node("8801", Duration::from_secs(1), &shutdown);
        assert!(matches!(
            node.dkg_init(parties(&["8801", "8802"]), 1),
            Err(PartyError::NoEpoch)
        ));

        node.new_epoch(1).unwrap();
        assert!(matches!(
            node.dkg_init(parties(&["8802", "8803"]), 1),
            Err(PartyError::Dkg(DkgError::NotAParticipant { .. }))
        ));
        assert!(matches!(
            node.dkg_init(parties(&["8801", "8802"]), 3),
            Err(PartyError::Dkg(DkgError::InvalidThreshold { .. }))
        ));
        assert!(!node.state().is_locked());
    }

    #[tokio::test]
    async fn test_round_messages_need_a_round() {
        let shutdown = Shutdown::new();
        let node = node("8801", Duration::from_secs(1), &shutdown);
        let ids = vec!["8801".to_string(), "8802".to_string()];
        let peer = DkgParticipant::new("8802", 1, &ids, 2, &mut OsRng).unwrap();
        assert!(matches!(node.dkg_round1(peer.round1_message()), Err(PartyError::NoSession)));
    }

    #[tokio::test]
    async fn test_peer_round1_verified() {
        let shutdown = Shutdown::new();
        let node = node("8801", Duration::from_secs(5), &shutdown);
        node.new_epoch(1).unwrap();
        node.dkg_init(parties(&["8801", "8802"]), 2).unwrap();

        let ids = vec!["8801".to_string(), "8802".to_string()];
        let peer = DkgParticipant::new("8802", 1, &ids, 2, &mut OsRng).unwrap();
        let other = DkgParticipant::new("8802", 1, &ids, 2, &mut OsRng).unwrap();

        let mut forged = peer.round1_message();
        forged.proof = other.round1_message().proof;
        let err = node.dkg_round1(forged).unwrap_err();
        assert!(matches!(err, PartyError::Dkg(DkgError::InvalidProof { .. })));
        assert_eq!(node.dkg_status().commitments_received, 0);

        assert!(node.dkg_round1(peer.round1_message()).unwrap());
        assert!(node.dkg_round1(peer.round1_message()).unwrap());
        assert_eq!(node.dkg_status().commitments_received, 1);

        let err = node.dkg_round1(other.round1_message()).unwrap_err();
        assert!(matches!(err, PartyError::Dkg(DkgError::DuplicateSender { .. })));
        shutdown.trigger();
    }
}
