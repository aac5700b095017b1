//! A participant shared between the ceremony and inbound message handlers.

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{
    DkgError, DkgOutput, DkgParticipant, DkgPhase, DkgStatus, Round1Message, Round2Message,
};

/// Shared handle on a running round.
///
/// Every mutation publishes a fresh [`DkgStatus`] so waiters can observe
/// progress without polling.
#[derive(Debug)]
pub struct DkgSession {
    participant: Mutex<DkgParticipant>,
    status: watch::Sender<DkgStatus>,
}

impl DkgSession {
    /// Wrap a freshly created participant.
    pub fn new(participant: DkgParticipant) -> Self {
        let (status, _rx) = watch::channel(participant.status());
        Self { participant: Mutex::new(participant), status }
    }

    fn with_participant<T>(&self, f: impl FnOnce(&mut DkgParticipant) -> T) -> T {
        let mut participant = self.participant.lock();
        let out = f(&mut participant);
        self.status.send_replace(participant.status());
        out
    }

    /// Epoch of the round.
    pub fn epoch(&self) -> u64 {
        self.participant.lock().epoch()
    }

    /// Current phase.
    pub fn phase(&self) -> DkgPhase {
        self.participant.lock().phase()
    }

    /// Move to `phase`.
    pub fn set_phase(&self, phase: DkgPhase) {
        self.with_participant(|p| p.set_phase(phase));
    }

    /// Latest progress snapshot.
    pub fn status(&self) -> DkgStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> watch::Receiver<DkgStatus> {
        self.status.subscribe()
    }

    /// Own round-1 message.
    pub fn round1_message(&self) -> Round1Message {
        self.participant.lock().round1_message()
    }

    /// Own round-2 message for `peer`.
    pub fn round2_message_for(&self, peer: &str) -> Result<Round2Message, DkgError> {
        self.participant.lock().round2_message_for(peer)
    }

    /// Feed an inbound round-1 message.
    pub fn handle_round1(&self, msg: Round1Message) -> Result<(), DkgError> {
        self.with_participant(|p| p.handle_round1(msg))
    }

    /// Feed an inbound round-2 message.
    pub fn handle_round2(&self, msg: Round2Message) -> Result<(), DkgError> {
        self.with_participant(|p| p.handle_round2(msg))
    }

    /// Derive the output.
    pub fn finalize(&self) -> Result<DkgOutput, DkgError> {
        self.with_participant(DkgParticipant::finalize)
    }

    /// Output, once complete.
    pub fn output(&self) -> Option<DkgOutput> {
        self.participant.lock().output().cloned()
    }
}
