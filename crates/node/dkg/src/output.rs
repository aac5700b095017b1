use std::{collections::BTreeMap, path::Path};

use k256::{ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};

use crate::{
    Commitments, DkgError,
    encoding::{point_from_hex, point_to_hex, scalar_from_hex, scalar_to_hex},
};

/// Output of a completed DKG round: the local key share and the group key.
#[derive(Clone, PartialEq, Eq)]
pub struct DkgOutput {
    /// Epoch the key belongs to.
    pub epoch: u64,
    /// Minimum number of shares needed to reconstruct the group secret.
    pub threshold: u32,
    /// This participant's index (1-based).
    pub share_index: u32,
    /// This participant's secret key share, `sum_i f_i(share_index)`.
    pub key_share: Scalar,
    /// Group public key, `sum_i C_{i,0}`.
    pub group_public_key: ProjectivePoint,
    /// Index and commitments of every dealer, keyed by party id.
    pub dealers: BTreeMap<String, (u32, Commitments)>,
}

impl std::fmt::Debug for DkgOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DkgOutput")
            .field("epoch", &self.epoch)
            .field("threshold", &self.threshold)
            .field("share_index", &self.share_index)
            .field("group_public_key", &point_to_hex(&self.group_public_key))
            .field("participants", &self.dealers.len())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize, Deserialize)]
struct DealerJson {
    index: u32,
    commitments: Commitments,
}

#[derive(Serialize, Deserialize)]
struct OutputJson {
    epoch: u64,
    group_public_key: String,
    threshold: u32,
    dealers: BTreeMap<String, DealerJson>,
}

#[derive(Serialize, Deserialize)]
struct ShareJson {
    index: u32,
    secret: String,
}

impl DkgOutput {
    /// Number of participants in the round.
    pub fn participants(&self) -> usize {
        self.dealers.len()
    }

    /// Public verification share of this participant, `key_share * G`.
    pub fn verification_key(&self) -> ProjectivePoint {
        ProjectivePoint::GENERATOR * self.key_share
    }

    /// Public verification share of any participant, computed from the dealers' commitments.
    pub fn verification_key_for(&self, index: u32) -> ProjectivePoint {
        self.dealers
            .values()
            .fold(ProjectivePoint::IDENTITY, |acc, (_, c)| acc + c.evaluate(index))
    }

    /// Persists the output to `output.json` and the secret share to `share.key` in `data_dir`.
    pub fn save(&self, data_dir: &Path) -> Result<(), DkgError> {
        std::fs::create_dir_all(data_dir)?;

        let output_json = OutputJson {
            epoch: self.epoch,
            group_public_key: point_to_hex(&self.group_public_key),
            threshold: self.threshold,
            dealers: self
                .dealers
                .iter()
                .map(|(id, (index, commitments))| {
                    (id.clone(), DealerJson { index: *index, commitments: commitments.clone() })
                })
                .collect(),
        };
        let output_path = data_dir.join("output.json");
        std::fs::write(&output_path, serde_json::to_string_pretty(&output_json)?)?;

        let share_json = ShareJson { index: self.share_index, secret: scalar_to_hex(&self.key_share) };
        let share_path = data_dir.join("share.key");
        std::fs::write(&share_path, serde_json::to_string_pretty(&share_json)?)?;

        Ok(())
    }

    /// Loads an output from `output.json` and `share.key` in `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self, DkgError> {
        let output_str = std::fs::read_to_string(data_dir.join("output.json"))?;
        let output: OutputJson = serde_json::from_str(&output_str)?;

        let share_str = std::fs::read_to_string(data_dir.join("share.key"))?;
        let share: ShareJson = serde_json::from_str(&share_str)?;

        Ok(Self {
            epoch: output.epoch,
            threshold: output.threshold,
            share_index: share.index,
            key_share: scalar_from_hex(&share.secret)?,
            group_public_key: point_from_hex(&output.group_public_key)?,
            dealers: output
                .dealers
                .into_iter()
                .map(|(id, d)| (id, (d.index, d.commitments)))
                .collect(),
        })
    }

    /// Returns `true` if both `output.json` and `share.key` exist in `data_dir`.
    pub fn exists(data_dir: &Path) -> bool {
        data_dir.join("output.json").exists() && data_dir.join("share.key").exists()
    }
}
