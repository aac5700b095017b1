//! Epoch membership on top of a [`KvStore`].
//!
//! Party entries are stored as `id -> url`. The epoch number and threshold
//! live under [`META_PREFIX`], which party ids may not use.

use std::{collections::BTreeMap, str::FromStr, sync::Arc};

use tracing::debug;

use crate::{KvStore, StorageError, WriteBatch};

/// Reserved key prefix for metadata.
pub const META_PREFIX: &str = "__meta/";

const EPOCH_KEY: &str = "__meta/epoch";
const THRESHOLD_KEY: &str = "__meta/threshold";

/// Recovered state of the last persisted epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochRecord {
    /// Epoch number.
    pub epoch: u64,
    /// Threshold computed for the epoch.
    pub threshold: u32,
    /// Frozen party set.
    pub parties: BTreeMap<String, String>,
}

/// Durable store of the latest frozen party set.
#[derive(Debug, Clone)]
pub struct EpochStore {
    kv: Arc<dyn KvStore>,
}

impl EpochStore {
    /// Store over `kv`.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Replace the party set in one atomic batch.
    ///
    /// Entries of the previous set are deleted in the same batch.
    pub fn put_parties(&self, parties: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(id) = parties.keys().find(|id| id.starts_with(META_PREFIX)) {
            return Err(StorageError::ReservedKey(id.clone()));
        }

        let mut batch = WriteBatch::new();
        for (key, _) in self.kv.scan()? {
            if !key.starts_with(META_PREFIX) && !parties.contains_key(&key) {
                batch.delete(key);
            }
        }
        for (id, url) in parties {
            batch.put(id.clone(), url.clone());
        }
        self.kv.write_batch(&batch)?;
        debug!(parties = parties.len(), ops = batch.len(), "persisted epoch parties");
        Ok(())
    }

    /// Party set of the last persisted epoch.
    pub fn get_parties(&self) -> Result<BTreeMap<String, String>, StorageError> {
        Ok(self.kv.scan()?.into_iter().filter(|(key, _)| !key.starts_with(META_PREFIX)).collect())
    }

    /// Record the threshold computed for `epoch`.
    pub fn put_threshold(&self, threshold: u32, epoch: u64) -> Result<(), StorageError> {
        let mut batch = WriteBatch::new();
        batch.put(THRESHOLD_KEY, threshold.to_string()).put(EPOCH_KEY, epoch.to_string());
        self.kv.write_batch(&batch)
    }

    /// Epoch of the last recorded threshold.
    pub fn latest_epoch(&self) -> Result<Option<u64>, StorageError> {
        self.meta(EPOCH_KEY)
    }

    /// Last recorded threshold.
    pub fn threshold(&self) -> Result<Option<u32>, StorageError> {
        self.meta(THRESHOLD_KEY)
    }

    /// Epoch, threshold and parties of the last completed persist, if any.
    pub fn recover(&self) -> Result<Option<EpochRecord>, StorageError> {
        let (Some(epoch), Some(threshold)) = (self.latest_epoch()?, self.threshold()?) else {
            return Ok(None);
        };
        Ok(Some(EpochRecord { epoch, threshold, parties: self.get_parties()? }))
    }

    fn meta<T: FromStr>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(value) = self.kv.get(key)? else {
            return Ok(None);
        };
        value
            .parse()
            .map(Some)
            .map_err(|_| StorageError::Corrupt { key: key.to_string(), value })
    }
}
