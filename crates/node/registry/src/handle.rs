use std::sync::Arc;

use sigag_client::PartyApi;

/// A registered party: its id, location and an RPC capability.
///
/// Equality is by id only.
#[derive(Clone)]
pub struct PartyHandle {
    id: String,
    url: String,
    client: Arc<dyn PartyApi>,
}

impl PartyHandle {
    /// Create a handle.
    pub fn new(id: impl Into<String>, url: impl Into<String>, client: Arc<dyn PartyApi>) -> Self {
        Self { id: id.into(), url: url.into(), client }
    }

    /// Party id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full URL, including scheme.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Party id and full URL.
    pub fn locate(&self) -> (&str, &str) {
        (&self.id, &self.url)
    }

    /// RPC capability.
    pub fn client(&self) -> &Arc<dyn PartyApi> {
        &self.client
    }
}

impl PartialEq for PartyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PartyHandle {}

impl std::fmt::Debug for PartyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartyHandle").field("id", &self.id).field("url", &self.url).finish_non_exhaustive()
    }
}
