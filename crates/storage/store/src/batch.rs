//! Batched key-value operations.

/// Operations applied atomically by [`crate::KvStore::write_batch`].
///
/// A `None` value deletes the key. Later operations on the same key win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<(String, Option<String>)>,
}

impl WriteBatch {
    /// Empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.ops.push((key.into(), Some(value.into())));
        self
    }

    /// Delete `key`.
    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push((key.into(), None));
        self
    }

    /// Returns `true` if the batch holds no operations.
    pub const fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub const fn len(&self) -> usize {
        self.ops.len()
    }

    /// Operations in insertion order.
    pub fn ops(&self) -> &[(String, Option<String>)] {
        &self.ops
    }

    /// Apply every operation to `map`.
    pub fn apply_to(&self, map: &mut std::collections::BTreeMap<String, String>) {
        for (key, value) in &self.ops {
            match value {
                Some(value) => {
                    map.insert(key.clone(), value.clone());
                }
                None => {
                    map.remove(key);
                }
            }
        }
    }
}
