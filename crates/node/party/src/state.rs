//! Epoch and DKG bookkeeping of a party.

use std::sync::Arc;

use parking_lot::Mutex;
use sigag_client::Parties;
use sigag_dkg::{DkgError, DkgPhase, DkgSession, DkgStatus};

use crate::PartyError;

#[derive(Debug, Default)]
struct Inner {
    epoch: u64,
    locked: bool,
    round: Option<Round>,
}

#[derive(Debug)]
struct Round {
    parties: Parties,
    threshold: u32,
    session: Arc<DkgSession>,
}

impl Round {
    fn matches(&self, epoch: u64, parties: &Parties, threshold: u32) -> bool {
        self.session.epoch() == epoch && self.threshold == threshold && &self.parties == parties
    }
}

/// Result of [`PartyState::begin_dkg`].
#[derive(Debug)]
pub enum DkgStart {
    /// A new round was created and the lock taken.
    Started(Arc<DkgSession>),
    /// An identical round for this epoch already exists.
    AlreadyStarted,
}

/// Current epoch, epoch lock and DKG round of a party.
#[derive(Debug, Default)]
pub struct PartyState {
    inner: Mutex<Inner>,
}

impl PartyState {
    /// Fresh state at epoch `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted epoch, `0` before any.
    pub fn current_epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    /// Returns `true` while a DKG round holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.lock().locked
    }

    /// Accept `epoch` if it is newer than the current one and no round is
    /// running.
    pub fn accept_epoch(&self, epoch: u64) -> Result<(), PartyError> {
        let mut inner = self.inner.lock();
        if epoch <= inner.epoch {
            return Err(PartyError::StaleEpoch { epoch, current: inner.epoch });
        }
        if inner.locked {
            return Err(PartyError::Locked);
        }
        inner.epoch = epoch;
        Ok(())
    }

    /// Take the lock and install the round built by `create`.
    ///
    /// A repeated init for the round already running, or already complete,
    /// is acknowledged without creating a new one.
    pub fn begin_dkg<F>(
        &self,
        parties: &Parties,
        threshold: u32,
        create: F,
    ) -> Result<DkgStart, PartyError>
    where
        F: FnOnce(u64) -> Result<DkgSession, DkgError>,
    {
        let mut inner = self.inner.lock();
        let epoch = inner.epoch;
        if epoch == 0 {
            return Err(PartyError::NoEpoch);
        }
        if let Some(round) = &inner.round {
            let failed = round.session.phase() == DkgPhase::Failed;
            if round.matches(epoch, parties, threshold) && !failed {
                return Ok(DkgStart::AlreadyStarted);
            }
        }
        if inner.locked {
            return Err(PartyError::Locked);
        }

        let session = Arc::new(create(epoch)?);
        inner.locked = true;
        inner.round =
            Some(Round { parties: parties.clone(), threshold, session: Arc::clone(&session) });
        Ok(DkgStart::Started(session))
    }

    /// Release the lock taken for `epoch`'s round.
    pub fn finish_dkg(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.round.as_ref().is_some_and(|r| r.session.epoch() == epoch) {
            inner.locked = false;
        }
    }

    /// Session of the latest round.
    pub fn session(&self) -> Option<Arc<DkgSession>> {
        self.inner.lock().round.as_ref().map(|r| Arc::clone(&r.session))
    }

    /// Status of the latest round, or an idle status for the current epoch.
    pub fn status(&self) -> DkgStatus {
        let inner = self.inner.lock();
        match &inner.round {
            Some(round) => round.session.status(),
            None => DkgStatus { epoch: inner.epoch, ..Default::default() },
        }
    }
}
