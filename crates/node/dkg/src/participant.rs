//! Per-party DKG state machine.
//!
//! Each party acts as a dealer (it generates a polynomial, commits to it and
//! hands every peer an evaluation) and as a receiver (it verifies peers'
//! commitments and shares). The participant performs no I/O; the ceremony
//! drives it and the RPC layer feeds it inbound messages.

use std::collections::BTreeMap;

use k256::Scalar;
use rand_core::{CryptoRng, RngCore};
use tracing::debug;

use crate::{
    Commitments, DkgError, DkgOutput, DkgPhase, DkgStatus, ProofOfKnowledge, Round1Message,
    Round2Message, SecretPolynomial, encoding::point_to_hex,
};

/// Assigns 1-based indices by ascending party id.
///
/// Every party derives the same mapping from the same party set.
pub fn assign_indices<'a>(ids: impl IntoIterator<Item = &'a String>) -> BTreeMap<String, u32> {
    let mut sorted: Vec<&String> = ids.into_iter().collect();
    sorted.sort();
    sorted.dedup();
    sorted.into_iter().enumerate().map(|(i, id)| (id.clone(), i as u32 + 1)).collect()
}

/// One party's view of a DKG round.
pub struct DkgParticipant {
    id: String,
    epoch: u64,
    threshold: u32,
    index: u32,
    indices: BTreeMap<String, u32>,
    polynomial: SecretPolynomial,
    commitments: Commitments,
    proof: ProofOfKnowledge,
    received_commitments: BTreeMap<String, Commitments>,
    received_shares: BTreeMap<String, Scalar>,
    phase: DkgPhase,
    output: Option<DkgOutput>,
}

impl std::fmt::Debug for DkgParticipant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DkgParticipant")
            .field("id", &self.id)
            .field("epoch", &self.epoch)
            .field("index", &self.index)
            .field("threshold", &self.threshold)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl DkgParticipant {
    /// Start a round for `id` over `party_ids`.
    ///
    /// Generates a fresh polynomial with `threshold` coefficients, its
    /// commitments and a proof of knowledge of the secret.
    pub fn new<'a, R: RngCore + CryptoRng>(
        id: &str,
        epoch: u64,
        party_ids: impl IntoIterator<Item = &'a String>,
        threshold: u32,
        rng: &mut R,
    ) -> Result<Self, DkgError> {
        let indices = assign_indices(party_ids);
        if threshold == 0 || threshold as usize > indices.len() {
            return Err(DkgError::InvalidThreshold { threshold, participants: indices.len() });
        }
        let index =
            *indices.get(id).ok_or_else(|| DkgError::NotAParticipant { id: id.to_string() })?;

        let polynomial = SecretPolynomial::random(threshold, rng)?;
        let commitments = polynomial.commit();
        let proof = ProofOfKnowledge::prove(polynomial.secret(), epoch, index, rng);

        debug!(id, epoch, index, threshold, n = indices.len(), "generated dealer polynomial");

        Ok(Self {
            id: id.to_string(),
            epoch,
            threshold,
            index,
            indices,
            polynomial,
            commitments,
            proof,
            received_commitments: BTreeMap::new(),
            received_shares: BTreeMap::new(),
            phase: DkgPhase::Round1Broadcasting,
            output: None,
        })
    }

    /// Local party id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Epoch of this round.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Local participant index.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Round threshold.
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Current phase.
    pub const fn phase(&self) -> DkgPhase {
        self.phase
    }

    /// Move to `phase`.
    pub fn set_phase(&mut self, phase: DkgPhase) {
        debug!(id = %self.id, from = %self.phase, to = %phase, "DKG phase transition");
        self.phase = phase;
    }

    /// Total number of parties, including this one.
    pub fn total_participants(&self) -> usize {
        self.indices.len()
    }

    /// Index assigned to `id`.
    pub fn index_of(&self, id: &str) -> Option<u32> {
        self.indices.get(id).copied()
    }

    /// Every other party id with its index.
    pub fn peers(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.indices.iter().filter(|(id, _)| **id != self.id).map(|(id, i)| (id.as_str(), *i))
    }

    /// Own commitments.
    pub const fn commitments(&self) -> &Commitments {
        &self.commitments
    }

    /// Round-1 message broadcast to every peer.
    pub fn round1_message(&self) -> Round1Message {
        Round1Message {
            sender: self.id.clone(),
            epoch: self.epoch,
            index: self.index,
            commitments: self.commitments.clone(),
            proof: self.proof.clone(),
        }
    }

    /// Round-2 message carrying `f_self(peer)` for `peer`.
    pub fn round2_message_for(&self, peer: &str) -> Result<Round2Message, DkgError> {
        let recipient = self
            .index_of(peer)
            .filter(|_| peer != self.id)
            .ok_or_else(|| DkgError::UnknownSender { sender: peer.to_string() })?;
        Ok(Round2Message {
            sender: self.id.clone(),
            epoch: self.epoch,
            index: self.index,
            recipient,
            share: self.polynomial.share_for(recipient),
        })
    }

    fn check_sender(&self, sender: &str, epoch: u64, index: u32) -> Result<(), DkgError> {
        if epoch != self.epoch {
            return Err(DkgError::EpochMismatch { expected: self.epoch, received: epoch });
        }
        let expected = self
            .index_of(sender)
            .filter(|_| sender != self.id)
            .ok_or_else(|| DkgError::UnknownSender { sender: sender.to_string() })?;
        if expected != index {
            return Err(DkgError::IndexMismatch { sender: sender.to_string(), claimed: index, expected });
        }
        Ok(())
    }

    fn ensure_accepting(&self, action: &'static str) -> Result<(), DkgError> {
        if matches!(self.phase, DkgPhase::Complete | DkgPhase::Failed | DkgPhase::Idle) {
            return Err(DkgError::InvalidPhase { phase: self.phase, action });
        }
        Ok(())
    }

    /// Verify and store a peer's commitments.
    ///
    /// Re-delivery of an identical message is accepted so that senders can
    /// retry after a lost response.
    pub fn handle_round1(&mut self, msg: Round1Message) -> Result<(), DkgError> {
        self.check_sender(&msg.sender, msg.epoch, msg.index)?;
        if let Some(existing) = self.received_commitments.get(&msg.sender) {
            if *existing == msg.commitments {
                return Ok(());
            }
            return Err(DkgError::DuplicateSender { sender: msg.sender });
        }
        self.ensure_accepting("accept commitments")?;

        if msg.commitments.len() != self.threshold as usize {
            return Err(DkgError::InvalidCommitmentCount {
                sender: msg.sender,
                expected: self.threshold as usize,
                actual: msg.commitments.len(),
            });
        }
        let verified = msg
            .commitments
            .secret_commitment()
            .is_some_and(|c0| msg.proof.verify(c0, msg.epoch, msg.index));
        if !verified {
            return Err(DkgError::InvalidProof { sender: msg.sender });
        }

        debug!(id = %self.id, sender = %msg.sender, "verified round 1 commitments");
        self.received_commitments.insert(msg.sender, msg.commitments);
        Ok(())
    }

    /// Verify and store a peer's share against its commitments.
    pub fn handle_round2(&mut self, msg: Round2Message) -> Result<(), DkgError> {
        self.check_sender(&msg.sender, msg.epoch, msg.index)?;
        if msg.recipient != self.index {
            return Err(DkgError::WrongRecipient { sender: msg.sender, recipient: msg.recipient });
        }
        if let Some(existing) = self.received_shares.get(&msg.sender) {
            if *existing == msg.share {
                return Ok(());
            }
            return Err(DkgError::DuplicateSender { sender: msg.sender });
        }
        self.ensure_accepting("accept shares")?;

        let commitments = self
            .received_commitments
            .get(&msg.sender)
            .ok_or_else(|| DkgError::MissingCommitments { sender: msg.sender.clone() })?;
        if !commitments.verify_share(self.index, &msg.share) {
            return Err(DkgError::InvalidShare { sender: msg.sender });
        }

        debug!(id = %self.id, sender = %msg.sender, "verified round 2 share");
        self.received_shares.insert(msg.sender, msg.share);
        Ok(())
    }

    /// Commitments from every peer verified.
    pub fn has_all_commitments(&self) -> bool {
        self.received_commitments.len() + 1 >= self.indices.len()
    }

    /// Shares from every peer verified.
    pub fn has_all_shares(&self) -> bool {
        self.received_shares.len() + 1 >= self.indices.len()
    }

    /// Derive the key share and group key once every share is held.
    pub fn finalize(&mut self) -> Result<DkgOutput, DkgError> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        if !self.has_all_commitments() || !self.has_all_shares() {
            return Err(DkgError::InsufficientShares {
                needed: self.indices.len() - 1,
                actual: self.received_shares.len(),
            });
        }

        let key_share = self
            .received_shares
            .values()
            .fold(self.polynomial.share_for(self.index), |acc, share| acc + share);

        let mut dealers = BTreeMap::new();
        dealers.insert(self.id.clone(), (self.index, self.commitments.clone()));
        for (sender, commitments) in &self.received_commitments {
            let index = self.index_of(sender).unwrap_or_default();
            dealers.insert(sender.clone(), (index, commitments.clone()));
        }
        let group_public_key = dealers
            .values()
            .filter_map(|(_, c)| c.secret_commitment())
            .fold(k256::ProjectivePoint::IDENTITY, |acc, c0| acc + c0);

        let output = DkgOutput {
            epoch: self.epoch,
            threshold: self.threshold,
            share_index: self.index,
            key_share,
            group_public_key,
            dealers,
        };
        self.output = Some(output.clone());
        self.set_phase(DkgPhase::Complete);
        Ok(output)
    }

    /// Output, once complete.
    pub const fn output(&self) -> Option<&DkgOutput> {
        self.output.as_ref()
    }

    /// Progress snapshot.
    pub fn status(&self) -> DkgStatus {
        DkgStatus {
            epoch: self.epoch,
            phase: self.phase,
            index: self.index,
            threshold: self.threshold,
            participants: self.indices.len(),
            commitments_received: self.received_commitments.len(),
            shares_received: self.received_shares.len(),
            group_public_key: self.output.as_ref().map(|o| point_to_hex(&o.group_public_key)),
        }
    }
}
