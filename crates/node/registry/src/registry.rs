use std::collections::HashMap;

use sigag_client::Parties;

use crate::{PartyHandle, RegistryError};

/// Registered parties, deduplicated by id, enumerated in insertion order.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    index: HashMap<String, PartyHandle>,
    order: Vec<String>,
}

impl PeerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handle`. Fails if its id is already registered.
    pub fn add(&mut self, handle: PartyHandle) -> Result<(), RegistryError> {
        if self.index.contains_key(handle.id()) {
            return Err(RegistryError::Duplicate { id: handle.id().to_string() });
        }
        self.order.push(handle.id().to_string());
        self.index.insert(handle.id().to_string(), handle);
        Ok(())
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Remove the party registered under `id`.
    pub fn remove(&mut self, id: &str) -> Result<PartyHandle, RegistryError> {
        let handle =
            self.index.remove(id).ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
        self.order.retain(|entry| entry != id);
        Ok(handle)
    }

    /// Owned copy of every handle, in insertion order.
    pub fn snapshot(&self) -> Vec<PartyHandle> {
        self.order.iter().filter_map(|id| self.index.get(id)).cloned().collect()
    }

    /// Number of registered parties.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no party is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Id to URL map of every registered party.
    pub fn to_parties(&self) -> Parties {
        self.index.values().map(|h| (h.id().to_string(), h.url().to_string())).collect()
    }
}
