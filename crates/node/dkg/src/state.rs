//! DKG phase tracking and the externally visible status snapshot.

use serde::{Deserialize, Serialize};

/// Current phase of the DKG protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DkgPhase {
    /// No round in progress; waiting for `dkg_init`.
    #[default]
    Idle,
    /// Polynomial generated, sending commitments and proof to peers.
    Round1Broadcasting,
    /// Own round-1 message delivered, waiting for peers' commitments.
    AwaitingCommitments,
    /// All commitments verified, sending shares to peers.
    Round2Exchanging,
    /// Own shares delivered, waiting for peers' shares.
    AwaitingShares,
    /// Key share and group key derived.
    Complete,
    /// The round failed or timed out.
    Failed,
}

impl DkgPhase {
    /// Returns `true` while a round is in progress.
    pub const fn is_running(&self) -> bool {
        !matches!(self, Self::Idle | Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for DkgPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Round1Broadcasting => write!(f, "Round1Broadcasting"),
            Self::AwaitingCommitments => write!(f, "AwaitingCommitments"),
            Self::Round2Exchanging => write!(f, "Round2Exchanging"),
            Self::AwaitingShares => write!(f, "AwaitingShares"),
            Self::Complete => write!(f, "Complete"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Progress snapshot of a party's DKG round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkgStatus {
    /// Epoch the round belongs to, `0` before any round.
    pub epoch: u64,
    /// Current phase.
    pub phase: DkgPhase,
    /// Local participant index (1-based), `0` before any round.
    pub index: u32,
    /// Threshold of the round.
    pub threshold: u32,
    /// Number of parties in the round.
    pub participants: usize,
    /// Verified commitment sets received from peers.
    pub commitments_received: usize,
    /// Verified shares received from peers.
    pub shares_received: usize,
    /// Compressed group public key (hex), once complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_public_key: Option<String>,
}

impl DkgStatus {
    /// Number of peers every round waits on.
    pub const fn peers(&self) -> usize {
        self.participants.saturating_sub(1)
    }

    /// All peers' commitments verified.
    pub const fn round1_complete(&self) -> bool {
        self.participants > 0 && self.commitments_received >= self.peers()
    }

    /// All peers' shares verified.
    pub const fn round2_complete(&self) -> bool {
        self.participants > 0 && self.shares_received >= self.peers()
    }
}
