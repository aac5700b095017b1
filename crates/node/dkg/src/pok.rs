//! Schnorr proof of knowledge of a dealer's secret coefficient.

use k256::{
    FieldBytes, ProjectivePoint, Scalar, U256,
    elliptic_curve::{Field, group::GroupEncoding, ops::Reduce},
};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::encoding::{point_hex, scalar_hex};

/// Domain separation tag for the challenge hash.
const POK_DOMAIN: &[u8] = b"sigag-dkg-pok-v1";

/// Proof `(R, z)` that the sender knows `a_0` for `C_0 = a_0 * G`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfKnowledge {
    /// Nonce commitment `R = k * G`.
    #[serde(with = "point_hex")]
    pub r: ProjectivePoint,
    /// Response `z = k + c * a_0`.
    #[serde(with = "scalar_hex")]
    pub z: Scalar,
}

fn challenge(epoch: u64, index: u32, c0: &ProjectivePoint, r: &ProjectivePoint) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(POK_DOMAIN);
    hasher.update(epoch.to_be_bytes());
    hasher.update(index.to_be_bytes());
    hasher.update(c0.to_bytes());
    hasher.update(r.to_bytes());
    let digest: FieldBytes = hasher.finalize();
    <Scalar as Reduce<U256>>::reduce_bytes(&digest)
}

impl ProofOfKnowledge {
    /// Prove knowledge of `secret`, bound to the epoch and the dealer's index.
    pub fn prove<R: RngCore + CryptoRng>(
        secret: &Scalar,
        epoch: u64,
        index: u32,
        rng: &mut R,
    ) -> Self {
        let k = Scalar::random(&mut *rng);
        let r = ProjectivePoint::GENERATOR * k;
        let c0 = ProjectivePoint::GENERATOR * secret;
        let c = challenge(epoch, index, &c0, &r);
        Self { r, z: k + c * secret }
    }

    /// Check the proof against the secret commitment `c0`.
    pub fn verify(&self, c0: &ProjectivePoint, epoch: u64, index: u32) -> bool {
        let c = challenge(epoch, index, c0, &self.r);
        ProjectivePoint::GENERATOR * self.z == self.r + *c0 * c
    }
}
