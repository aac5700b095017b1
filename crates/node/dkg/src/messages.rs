//! Peer-to-peer round messages.

use k256::Scalar;
use serde::{Deserialize, Serialize};

use crate::{Commitments, ProofOfKnowledge, encoding::scalar_hex};

/// Round 1: a dealer's commitments and proof of knowledge, sent to every peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round1Message {
    /// Sender party id.
    pub sender: String,
    /// Epoch the round belongs to.
    pub epoch: u64,
    /// Sender's participant index.
    pub index: u32,
    /// Commitments to the sender's coefficients.
    pub commitments: Commitments,
    /// Proof of knowledge of the sender's secret.
    pub proof: ProofOfKnowledge,
}

/// Round 2: the sender's polynomial evaluated at the recipient's index.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round2Message {
    /// Sender party id.
    pub sender: String,
    /// Epoch the round belongs to.
    pub epoch: u64,
    /// Sender's participant index.
    pub index: u32,
    /// Recipient's participant index.
    pub recipient: u32,
    /// `f_sender(recipient)`.
    #[serde(with = "scalar_hex")]
    pub share: Scalar,
}

impl std::fmt::Debug for Round2Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Round2Message")
            .field("sender", &self.sender)
            .field("epoch", &self.epoch)
            .field("index", &self.index)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}
