use crate::{StorageError, WriteBatch};

/// Key-value engine backing the epoch store.
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Apply every operation of `batch` or none of them.
    ///
    /// A concurrent [`KvStore::scan`] observes either the state before the
    /// batch or the state after it.
    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StorageError>;

    /// Every entry, ordered by key.
    fn scan(&self) -> Result<Vec<(String, String)>, StorageError>;

    /// Value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.scan()?.into_iter().find(|(k, _)| k == key).map(|(_, v)| v))
    }
}
