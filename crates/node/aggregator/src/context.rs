//! Shared aggregator state.

use parking_lot::RwLock;
use sigag_client::Parties;
use sigag_registry::{PartyHandle, PeerRegistry, RegistryError};
use tracing::debug;

use crate::RegistrationError;

#[derive(Debug, Default)]
struct Inner {
    registry: PeerRegistry,
    locked: bool,
}

/// Party registry and registration lock, guarded together.
///
/// Passed by `Arc` to the RPC handlers and the orchestrator.
#[derive(Debug, Default)]
pub struct AggregatorContext {
    inner: RwLock<Inner>,
}

impl AggregatorContext {
    /// Empty, unlocked context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handle` unless registration is locked or its id is taken.
    pub fn register(&self, handle: PartyHandle) -> Result<(), RegistrationError> {
        let mut inner = self.inner.write();
        if inner.locked {
            return Err(RegistrationError::Locked);
        }
        inner.registry.add(handle)?;
        Ok(())
    }

    /// Add a party recovered from the epoch store, bypassing the lock.
    pub fn restore(&self, handle: PartyHandle) -> Result<(), RegistryError> {
        self.inner.write().registry.add(handle)
    }

    /// Fails early if `id` could not currently be registered.
    pub fn check_registrable(&self, id: &str) -> Result<(), RegistrationError> {
        let inner = self.inner.read();
        if inner.locked {
            return Err(RegistrationError::Locked);
        }
        if inner.registry.contains(id) {
            return Err(RegistryError::Duplicate { id: id.to_string() }.into());
        }
        Ok(())
    }

    /// Remove the party registered under `id`.
    pub fn evict(&self, id: &str) -> Result<PartyHandle, RegistryError> {
        self.inner.write().registry.remove(id)
    }

    /// Ordered copy of the registered handles.
    pub fn snapshot(&self) -> Vec<PartyHandle> {
        self.inner.read().registry.snapshot()
    }

    /// Id to URL map of the registry.
    pub fn parties(&self) -> Parties {
        self.inner.read().registry.to_parties()
    }

    /// Number of registered parties.
    pub fn len(&self) -> usize {
        self.inner.read().registry.len()
    }

    /// Returns `true` if nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().registry.is_empty()
    }

    /// Returns `true` while an epoch transition holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.read().locked
    }

    /// Lock registration until the returned guard is dropped.
    pub fn lock_registration(&self) -> RegistrationLock<'_> {
        self.inner.write().locked = true;
        debug!("registration locked");
        RegistrationLock { context: self }
    }
}

/// Holds the registration lock. Dropping it unlocks.
#[derive(Debug)]
pub struct RegistrationLock<'a> {
    context: &'a AggregatorContext,
}

impl Drop for RegistrationLock<'_> {
    fn drop(&mut self) {
        self.context.inner.write().locked = false;
        debug!("registration unlocked");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use sigag_client::{ClientError, PartyApi, PingResult};

    use super::*;

    #[derive(Debug)]
    struct NoopParty;

    #[async_trait]
    impl PartyApi for NoopParty {
        async fn ping(&self) -> Result<PingResult, ClientError> {
            Ok(PingResult::pong())
        }

        async fn new_epoch(&self, _epoch: u64) -> Result<bool, ClientError> {
            Ok(true)
        }

        async fn dkg_init(&self, _parties: &Parties, _threshold: u32) -> Result<bool, ClientError> {
            Ok(true)
        }
    }

    fn handle(id: &str) -> PartyHandle {
        PartyHandle::new(id, format!("http://127.0.0.1:{id}/"), Arc::new(NoopParty))
    }

    #[test]
    fn test_register_and_snapshot() {
        let ctx = AggregatorContext::new();
        ctx.register(handle("8801")).unwrap();
        ctx.register(handle("8802")).unwrap();

        let ids: Vec<_> = ctx.snapshot().iter().map(|h| h.id().to_string()).collect();
        assert_eq!(ids, vec!["8801", "8802"]);
        assert_eq!(ctx.parties()["8802"], "http://127.0.0.1:8802/");
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_duplicate_rejected() {
        let ctx = AggregatorContext::new();
        ctx.register(handle("8801")).unwrap();
        assert_eq!(
            ctx.check_registrable("8801").unwrap_err().to_string(),
            "address already registered"
        );
        let err = ctx.register(handle("8801")).unwrap_err();
        assert_eq!(err, RegistrationError::Registry(RegistryError::Duplicate { id: "8801".into() }));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_lock_rejects_until_dropped() {
        let ctx = AggregatorContext::new();
        {
            let _lock = ctx.lock_registration();
            assert!(ctx.is_locked());
            assert_eq!(ctx.check_registrable("8801"), Err(RegistrationError::Locked));
            assert_eq!(ctx.register(handle("8801")), Err(RegistrationError::Locked));
            assert!(ctx.is_empty());
        }
        assert!(!ctx.is_locked());
        ctx.register(handle("8801")).unwrap();
    }

    #[test]
    fn test_lock_released_on_early_return() {
        fn failing_cycle(ctx: &AggregatorContext) -> Result<(), RegistryError> {
            let _lock = ctx.lock_registration();
            ctx.evict("missing")?;
            Ok(())
        }

        let ctx = AggregatorContext::new();
        assert!(failing_cycle(&ctx).is_err());
        assert!(!ctx.is_locked());
    }

    #[test]
    fn test_evict() {
        let ctx = AggregatorContext::new();
        ctx.register(handle("8801")).unwrap();
        assert_eq!(ctx.evict("8801").unwrap().id(), "8801");
        assert!(ctx.evict("8801").is_err());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_restore_ignores_lock_but_not_duplicates() {
        let ctx = AggregatorContext::new();
        let _lock = ctx.lock_registration();
        ctx.restore(handle("8801")).unwrap();
        assert_eq!(ctx.restore(handle("8801")), Err(RegistryError::Duplicate { id: "8801".into() }));
        assert_eq!(ctx.len(), 1);
    }
}
