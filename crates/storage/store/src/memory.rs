use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::{KvStore, StorageError, WriteBatch};

/// In-memory engine.
#[derive(Debug, Default)]
pub struct MemoryKv {
    map: RwLock<BTreeMap<String, String>>,
}

impl MemoryKv {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StorageError> {
        batch.apply_to(&mut self.map.write());
        Ok(())
    }

    fn scan(&self) -> Result<Vec<(String, String)>, StorageError> {
        Ok(self.map.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.read().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_is_ordered() {
        let kv = MemoryKv::new();
        let mut batch = WriteBatch::new();
        batch.put("c", "3").put("a", "1").put("b", "2");
        kv.write_batch(&batch).unwrap();

        let keys: Vec<_> = kv.scan().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(kv.get("b").unwrap().as_deref(), Some("2"));
        assert_eq!(kv.get("z").unwrap(), None);
    }
}
