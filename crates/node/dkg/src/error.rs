use thiserror::Error;

/// Errors that can occur during a Distributed Key Generation (DKG) round.
#[derive(Debug, Error)]
pub enum DkgError {
    /// Invalid threshold for the given participant count.
    #[error("Threshold {threshold} is invalid for {participants} participants")]
    InvalidThreshold {
        /// Threshold value.
        threshold: u32,
        /// Number of participants.
        participants: usize,
    },

    /// The local party is not part of the announced party set.
    #[error("Party {id} is not in the party set")]
    NotAParticipant {
        /// Local party id.
        id: String,
    },

    /// Message from a sender outside the party set.
    #[error("Unknown sender: {sender}")]
    UnknownSender {
        /// Sender identifier.
        sender: String,
    },

    /// A sender delivered the same round message twice.
    #[error("Duplicate message from {sender}")]
    DuplicateSender {
        /// Sender identifier.
        sender: String,
    },

    /// A message's claimed index does not match the sender's assigned index.
    #[error("Sender {sender} claims index {claimed}, expected {expected}")]
    IndexMismatch {
        /// Sender identifier.
        sender: String,
        /// Index carried in the message.
        claimed: u32,
        /// Index assigned to the sender.
        expected: u32,
    },

    /// A share addressed to another participant.
    #[error("Share from {sender} is addressed to index {recipient}")]
    WrongRecipient {
        /// Sender identifier.
        sender: String,
        /// Index the share was computed for.
        recipient: u32,
    },

    /// A message belongs to another epoch.
    #[error("Epoch mismatch: expected {expected}, received {received}")]
    EpochMismatch {
        /// Local epoch.
        expected: u64,
        /// Epoch in the message.
        received: u64,
    },

    /// Commitment vector of the wrong length.
    #[error("Sender {sender} sent {actual} commitments, expected {expected}")]
    InvalidCommitmentCount {
        /// Sender identifier.
        sender: String,
        /// Expected count (the threshold).
        expected: usize,
        /// Received count.
        actual: usize,
    },

    /// Proof of knowledge of the secret failed to verify.
    #[error("Invalid proof of knowledge from {sender}")]
    InvalidProof {
        /// Sender identifier.
        sender: String,
    },

    /// A share is inconsistent with its sender's commitments.
    #[error("Invalid share from {sender}")]
    InvalidShare {
        /// Sender identifier.
        sender: String,
    },

    /// A share arrived before the sender's commitments.
    #[error("No commitments received from {sender} yet")]
    MissingCommitments {
        /// Sender identifier.
        sender: String,
    },

    /// Operation is not valid in the current phase.
    #[error("DKG is in phase {phase}, cannot {action}")]
    InvalidPhase {
        /// Current phase.
        phase: crate::DkgPhase,
        /// Attempted action.
        action: &'static str,
    },

    /// Not enough points to interpolate.
    #[error("Need at least {needed} shares, got {actual}")]
    InsufficientShares {
        /// Required count.
        needed: usize,
        /// Available count.
        actual: usize,
    },

    /// Two interpolation points share an index.
    #[error("Duplicate share index {0}")]
    DuplicateIndex(u32),

    /// Network communication error.
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for DKG completion.
    #[error("Timeout waiting for DKG completion")]
    Timeout,
}

impl DkgError {
    /// Returns `true` for failures attributable to a peer's cryptographic material.
    pub const fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidProof { .. } | Self::InvalidShare { .. } | Self::InvalidCommitmentCount { .. }
        )
    }
}

impl From<serde_json::Error> for DkgError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DkgPhase;

    #[test]
    fn test_invalid_threshold_display() {
        let err = DkgError::InvalidThreshold { threshold: 10, participants: 5 };
        assert_eq!(err.to_string(), "Threshold 10 is invalid for 5 participants");
    }

    #[test]
    fn test_not_a_participant_display() {
        let err = DkgError::NotAParticipant { id: "p9".into() };
        assert_eq!(err.to_string(), "Party p9 is not in the party set");
    }

    #[test]
    fn test_index_mismatch_display() {
        let err = DkgError::IndexMismatch { sender: "p2".into(), claimed: 5, expected: 2 };
        assert_eq!(err.to_string(), "Sender p2 claims index 5, expected 2");
    }

    #[test]
    fn test_invalid_commitment_count_display() {
        let err =
            DkgError::InvalidCommitmentCount { sender: "p1".into(), expected: 3, actual: 2 };
        assert_eq!(err.to_string(), "Sender p1 sent 2 commitments, expected 3");
    }

    #[test]
    fn test_invalid_phase_display() {
        let err = DkgError::InvalidPhase { phase: DkgPhase::Complete, action: "accept shares" };
        assert_eq!(err.to_string(), "DKG is in phase Complete, cannot accept shares");
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DkgError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: DkgError = json_err.into();
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_verification_failures() {
        assert!(DkgError::InvalidProof { sender: "a".into() }.is_verification_failure());
        assert!(DkgError::InvalidShare { sender: "a".into() }.is_verification_failure());
        assert!(!DkgError::Timeout.is_verification_failure());
        assert!(!DkgError::MissingCommitments { sender: "a".into() }.is_verification_failure());
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(DkgError::Timeout.to_string(), "Timeout waiting for DKG completion");
    }
}
