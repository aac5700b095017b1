use std::{
    collections::BTreeMap,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use parking_lot::RwLock;
use tracing::debug;

use crate::{KvStore, StorageError, WriteBatch};

/// File-backed engine.
///
/// The full image lives in memory. Each batch is committed by writing the
/// new image to `<path>.tmp`, syncing it and renaming it over `path`; the
/// in-memory image is only replaced after the rename succeeds.
#[derive(Debug)]
pub struct FileKv {
    path: PathBuf,
    map: RwLock<BTreeMap<String, String>>,
}

impl FileKv {
    /// Open the store at `path`, loading the last committed image if present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let bytes = std::fs::read(&path)?;
            serde_json::from_slice(&bytes)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = map.len(), "opened file store");
        Ok(Self { path, map: RwLock::new(map) })
    }

    /// Path of the committed image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, image: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&serde_json::to_vec_pretty(image)?)?;
            file.sync_all()?;
        }
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileKv {
    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StorageError> {
        let mut map = self.map.write();
        let mut next = map.clone();
        batch.apply_to(&mut next);
        self.persist(&next)?;
        *map = next;
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
    fn test_reopen_reads_committed_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epoch.json");

        let kv = FileKv::open(&path).unwrap();
        let mut batch = WriteBatch::new();
        batch.put("p1", "http://a/").put("p2", "http://b/");
        kv.write_batch(&batch).unwrap();
        drop(kv);

        let reopened = FileKv::open(&path).unwrap();
        assert_eq!(reopened.scan().unwrap().len(), 2);
        assert_eq!(reopened.get("p2").unwrap().as_deref(), Some("http://b/"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let kv = FileKv::open(&path).unwrap();
        let mut batch = WriteBatch::new();
        batch.put("k", "v");
        kv.write_batch(&batch).unwrap();
        assert!(path.exists());
        assert_eq!(kv.path(), path.as_path());
    }

    #[test]
    fn test_failed_commit_leaves_image_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let kv = FileKv::open(&path).unwrap();
        let mut batch = WriteBatch::new();
        batch.put("p1", "http://a/");
        kv.write_batch(&batch).unwrap();

        // A directory where the temp file should go makes the commit fail.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        let mut batch = WriteBatch::new();
        batch.delete("p1").put("p2", "http://b/");
        assert!(matches!(kv.write_batch(&batch), Err(StorageError::Io(_))));

        assert_eq!(kv.scan().unwrap(), vec![("p1".to_string(), "http://a/".to_string())]);
        let reopened = FileKv::open(&path).unwrap();
        assert_eq!(reopened.scan().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_image_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(FileKv::open(&path), Err(StorageError::Encoding(_))));
    }
}
