//! The epoch cycle.
//!
//! Each cycle locks registration, announces the next epoch to every
//! registered party, evicts the ones that fail, persists the survivors,
//! computes the threshold and asks every survivor to start the DKG. The
//! registration lock is released when the cycle ends, however it ends.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use sigag_client::Parties;
use sigag_config::AggregatorConfig;
use sigag_registry::PartyHandle;
use sigag_rpc::ShutdownListener;
use sigag_store::EpochStore;
use tracing::{debug, error, info, warn};

use crate::{AggregatorContext, AggregatorError, compute_threshold};

/// Timing and threshold parameters of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    /// Delay before the first cycle.
    pub initial_tick: Duration,
    /// Delay between cycles.
    pub epoch_duration: Duration,
    /// Divisor of the party count when computing the threshold.
    pub threshold_factor: f64,
}

impl From<&AggregatorConfig> for OrchestratorConfig {
    fn from(config: &AggregatorConfig) -> Self {
        Self {
            initial_tick: config.initial_tick(),
            epoch_duration: config.epoch_duration(),
            threshold_factor: config.threshold_factor,
        }
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every survivor accepted `dkg_init`. The epoch advances.
    Completed {
        /// Epoch that was started.
        epoch: u64,
        /// Threshold sent to the survivors.
        threshold: u32,
        /// Frozen party set.
        parties: Parties,
    },
    /// No party acknowledged the epoch.
    Empty {
        /// Epoch that was announced.
        epoch: u64,
    },
    /// A survivor refused `dkg_init`. The epoch is retried.
    Aborted {
        /// Epoch that was announced.
        epoch: u64,
        /// Party whose `dkg_init` failed.
        party: String,
    },
}

impl CycleOutcome {
    /// Returns `true` if the epoch counter advances after this cycle.
    pub const fn advances(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Drives parties through successive epochs.
#[derive(Debug)]
pub struct EpochOrchestrator {
    context: Arc<AggregatorContext>,
    store: EpochStore,
    config: OrchestratorConfig,
    epoch: u64,
}

impl EpochOrchestrator {
    /// Orchestrator starting after the last epoch recorded in `store`, or at 1.
    pub fn new(
        context: Arc<AggregatorContext>,
        store: EpochStore,
        config: OrchestratorConfig,
    ) -> Result<Self, AggregatorError> {
        let epoch = match store.latest_epoch()? {
            Some(last) => {
                info!(last, "recovered epoch from store");
                last + 1
            }
            None => 1,
        };
        Ok(Self { context, store, config, epoch })
    }

    /// Next epoch to announce.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Run cycles until `shutdown` fires or a fatal error occurs.
    pub async fn run(mut self, mut shutdown: ShutdownListener) -> Result<(), AggregatorError> {
        info!(
            epoch = self.epoch,
            initial_tick = ?self.config.initial_tick,
            epoch_duration = ?self.config.epoch_duration,
            "epoch orchestrator started"
        );

        tokio::select! {
            _ = shutdown.wait() => return self.stopped(),
            _ = tokio::time::sleep(self.config.initial_tick) => {}
        }

        loop {
            let outcome = tokio::select! {
                _ = shutdown.wait() => return self.stopped(),
                outcome = self.run_cycle() => outcome,
            };
            let outcome = outcome.inspect_err(|e| error!(error = %e, "epoch cycle failed"))?;

            tokio::select! {
                _ = shutdown.wait() => return self.stopped(),
                _ = tokio::time::sleep(self.config.epoch_duration) => {}
            }
            if outcome.advances() {
                self.epoch += 1;
            }
        }
    }

    /// Run one cycle for the current epoch without sleeping or advancing.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, AggregatorError> {
        let epoch = self.epoch;
        let _lock = self.context.lock_registration();

        let survivors = self.announce(epoch).await?;
        let parties: Parties =
            survivors.iter().map(|h| (h.id().to_string(), h.url().to_string())).collect();
        self.store.put_parties(&parties)?;

        let Some(threshold) = compute_threshold(parties.len(), self.config.threshold_factor) else {
            info!(epoch, "no parties acknowledged the epoch");
            return Ok(CycleOutcome::Empty { epoch });
        };
        self.store.put_threshold(threshold, epoch)?;
        info!(epoch, parties = parties.len(), threshold, "epoch parties frozen");

        for handle in &survivors {
            if let Err(e) = handle.client().dkg_init(&parties, threshold).await {
                warn!(epoch, id = handle.id(), error = %e, "dkg_init failed, aborting cycle");
                return Ok(CycleOutcome::Aborted { epoch, party: handle.id().to_string() });
            }
            debug!(epoch, id = handle.id(), "dkg_init accepted");
        }

        info!(epoch, threshold, "dkg initiated");
        Ok(CycleOutcome::Completed { epoch, threshold, parties })
    }

    /// Announce `epoch` to every registered party and evict the failures.
    async fn announce(&self, epoch: u64) -> Result<Vec<PartyHandle>, AggregatorError> {
        let snapshot = self.context.snapshot();
        let results =
            join_all(snapshot.iter().map(|handle| handle.client().new_epoch(epoch))).await;

        let mut survivors = Vec::with_capacity(snapshot.len());
        for (handle, result) in snapshot.into_iter().zip(results) {
            match result {
                Ok(_) => survivors.push(handle),
                Err(e) if e.stale_epoch() == Some(epoch) => {
                    debug!(epoch, id = handle.id(), "party already at epoch");
                    survivors.push(handle);
                }
                Err(e) => {
                    warn!(epoch, id = handle.id(), url = handle.url(), error = %e, "evicting party");
                    self.context.evict(handle.id())?;
                }
            }
        }
        Ok(survivors)
    }

    fn stopped(&self) -> Result<(), AggregatorError> {
        info!(epoch = self.epoch, "epoch orchestrator stopped");
        Ok(())
    }
}
