//! Drives one party's DKG round over a [`PeerTransport`].

use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use futures::future::try_join_all;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, info, warn};

use crate::{DkgConfig, DkgError, DkgOutput, DkgPhase, DkgSession, DkgStatus, PeerTransport};

/// DKG ceremony runner.
///
/// Inbound messages are fed into the shared [`DkgSession`] by whoever
/// receives them; the ceremony only sends and waits.
pub struct DkgCeremony<T> {
    session: Arc<DkgSession>,
    peers: BTreeMap<String, String>,
    transport: Arc<T>,
    config: DkgConfig,
}

impl<T> std::fmt::Debug for DkgCeremony<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DkgCeremony")
            .field("peers", &self.peers.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: PeerTransport> DkgCeremony<T> {
    /// Create a ceremony. `peers` maps every other party id to its URL.
    pub fn new(
        session: Arc<DkgSession>,
        peers: BTreeMap<String, String>,
        transport: Arc<T>,
        config: DkgConfig,
    ) -> Self {
        Self { session, peers, transport, config }
    }

    /// Shared session.
    pub const fn session(&self) -> &Arc<DkgSession> {
        &self.session
    }

    /// Run both rounds and derive the output.
    ///
    /// On any error the session is left in [`DkgPhase::Failed`].
    pub async fn run(&self) -> Result<DkgOutput, DkgError> {
        let deadline = Instant::now() + self.config.deadline;
        let epoch = self.session.epoch();
        info!(epoch, peers = self.peers.len(), deadline = ?self.config.deadline, "Starting DKG round");

        let result = match self.run_rounds(deadline).await {
            Ok(output) => self.persist(epoch, &output).map(|()| output),
            Err(e) => {
                warn!(epoch, error = %e, "DKG round failed");
                Err(e)
            }
        };
        match result {
            Ok(output) => {
                info!(
                    epoch,
                    share_index = output.share_index,
                    threshold = output.threshold,
                    "DKG round completed"
                );
                Ok(output)
            }
            Err(e) => {
                self.session.set_phase(DkgPhase::Failed);
                Err(e)
            }
        }
    }

    fn persist(&self, epoch: u64, output: &DkgOutput) -> Result<(), DkgError> {
        let Some(dir) = &self.config.data_dir else {
            return Ok(());
        };
        let dir = dir.join(format!("epoch-{epoch}"));
        output.save(&dir).inspect_err(|e| {
            warn!(epoch, dir = %dir.display(), error = %e, "Failed to persist DKG output");
        })
    }

    async fn run_rounds(&self, deadline: Instant) -> Result<DkgOutput, DkgError> {
        // Round 1: commitments and proof to every peer.
        let round1 = self.session.round1_message();
        try_join_all(self.peers.iter().map(|(id, url)| {
            let round1 = &round1;
            self.deliver(id, deadline, move || self.transport.send_round1(url, round1))
        }))
        .await?;
        self.session.set_phase(DkgPhase::AwaitingCommitments);
        self.wait_until(deadline, DkgStatus::round1_complete).await?;
        debug!("Round 1 complete");

        // Round 2: one private evaluation per peer.
        self.session.set_phase(DkgPhase::Round2Exchanging);
        let mut shares = Vec::with_capacity(self.peers.len());
        for (id, url) in &self.peers {
            shares.push((id, url, self.session.round2_message_for(id)?));
        }
        try_join_all(shares.iter().map(|(id, url, msg)| {
            self.deliver(id, deadline, move || self.transport.send_round2(url, msg))
        }))
        .await?;
        self.session.set_phase(DkgPhase::AwaitingShares);
        self.wait_until(deadline, DkgStatus::round2_complete).await?;
        debug!("Round 2 complete");

        self.session.finalize()
    }

    /// Send until the peer accepts or the deadline passes.
    async fn deliver<F, Fut>(&self, peer: &str, deadline: Instant, mut send: F) -> Result<(), DkgError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), DkgError>>,
    {
        let mut backoff = ExponentialBackoff::new(self.config.initial_backoff, self.config.max_backoff);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let err = match timeout_at(deadline, send()).await {
                Ok(Ok(())) => {
                    debug!(peer, attempts, "Delivered DKG message");
                    return Ok(());
                }
                Ok(Err(e)) => e,
                Err(_) => return Err(DkgError::Timeout),
            };
            let delay = backoff.next_delay();
            if Instant::now() + delay >= deadline {
                warn!(peer, attempts, error = %err, "Giving up on DKG message delivery");
                return Err(DkgError::Timeout);
            }
            debug!(peer, attempts, error = %err, retry_in = ?delay, "DKG message rejected, retrying");
            sleep(delay).await;
        }
    }

    async fn wait_until(
        &self,
        deadline: Instant,
        done: impl Fn(&DkgStatus) -> bool,
    ) -> Result<(), DkgError> {
        let mut rx = self.session.subscribe();
        let waited = timeout_at(deadline, async move { rx.wait_for(|s| done(s)).await.map(|_| ()) });
        match waited.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(DkgError::Network("status channel closed".to_string())),
            Err(_) => {
                let status = self.session.status();
                warn!(
                    phase = %status.phase,
                    commitments = status.commitments_received,
                    shares = status.shares_received,
                    peers = status.peers(),
                    "Timed out waiting for peers"
                );
                Err(DkgError::Timeout)
            }
        }
    }
}

/// Exponential backoff helper for retries.
#[derive(Debug)]
struct ExponentialBackoff {
    current: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    const fn new(initial: Duration, max: Duration) -> Self {
        Self { current: initial, max }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }
}
