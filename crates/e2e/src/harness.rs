//! Boots an aggregator and parties on localhost and observes them over RPC.

use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use k256::ProjectivePoint;
use sigag_aggregator::{AggregatorError, AggregatorHandle, AggregatorService};
use sigag_client::{AggregatorClient, ClientError, Parties, PartyClient};
use sigag_dkg::{DkgError, DkgOutput, DkgPhase, interpolate_at_zero};
use sigag_party::{PartyError, PartyHandle, PartyService};
use sigag_rpc::Shutdown;
use sigag_store::MemoryKv;
use thiserror::Error;
use tracing::{debug, info};

use crate::TestConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from harness setup or checks.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The aggregator failed to start or stopped with an error.
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
    /// A party failed to start.
    #[error(transparent)]
    Party(#[from] PartyError),
    /// An RPC call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// Key material could not be checked.
    #[error(transparent)]
    Dkg(#[from] DkgError),
    /// A condition did not hold within the configured timeout.
    #[error("timed out waiting for {0}")]
    Timeout(String),
    /// Parties disagree about the DKG result.
    #[error("divergent DKG outputs: {0}")]
    Divergence(String),
    /// No party with this id is running.
    #[error("unknown party {0}")]
    UnknownParty(String),
}

/// Agreed result of one epoch's DKG.
#[derive(Debug, Clone)]
pub struct DkgOutcome {
    /// Epoch of the round.
    pub epoch: u64,
    /// Threshold of the round.
    pub threshold: u32,
    /// Group public key every party derived.
    pub group_public_key: ProjectivePoint,
    /// Output of every party, by id.
    pub outputs: BTreeMap<String, DkgOutput>,
}

struct RunningParty {
    shutdown: Shutdown,
    handle: PartyHandle,
}

/// A running aggregator and its parties.
pub struct TestHarness {
    config: TestConfig,
    shutdown: Shutdown,
    aggregator: AggregatorHandle,
    client: AggregatorClient,
    parties: BTreeMap<String, RunningParty>,
}

impl std::fmt::Debug for TestHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestHarness")
            .field("aggregator", &self.aggregator.url())
            .field("parties", &self.parties.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TestHarness {
    /// Start the aggregator, then each party, which registers on start.
    pub async fn start(config: TestConfig) -> Result<Self, HarnessError> {
        let shutdown = Shutdown::new();
        let aggregator = AggregatorService::new(config.aggregator())
            .with_store(Arc::new(MemoryKv::new()))
            .with_orchestrator(config.orchestrator())
            .start(&shutdown)
            .await?;
        let client = AggregatorClient::new(aggregator.url(), config.rpc_timeout)?;
        info!(url = %aggregator.url(), parties = config.parties, "harness aggregator started");

        let mut harness =
            Self { config, shutdown, aggregator, client, parties: BTreeMap::new() };
        for i in 1..=harness.config.parties {
            harness.add_party(i).await?;
        }
        Ok(harness)
    }

    async fn add_party(&mut self, i: usize) -> Result<(), HarnessError> {
        let shutdown = Shutdown::new();
        let config = self.config.party(i, &self.aggregator.url());
        let handle = PartyService::new(config).start(&shutdown).await?;
        debug!(id = handle.id(), url = %handle.url(), "harness party started");
        self.parties.insert(handle.id().to_string(), RunningParty { shutdown, handle });
        Ok(())
    }

    /// Client for the aggregator.
    pub const fn aggregator(&self) -> &AggregatorClient {
        &self.client
    }

    /// Aggregator handle, for direct inspection.
    pub const fn aggregator_handle(&self) -> &AggregatorHandle {
        &self.aggregator
    }

    /// Ids of the running parties.
    pub fn party_ids(&self) -> Vec<String> {
        self.parties.keys().cloned().collect()
    }

    /// URL party `id` serves on.
    pub fn party_url(&self, id: &str) -> Option<String> {
        self.parties.get(id).map(|party| party.handle.url())
    }

    /// Stop party `id` so every later call to it fails.
    pub async fn stop_party(&mut self, id: &str) -> Result<(), HarnessError> {
        let party =
            self.parties.remove(id).ok_or_else(|| HarnessError::UnknownParty(id.to_string()))?;
        party.shutdown.trigger();
        party.handle.stopped().await;
        info!(id, "harness party stopped");
        Ok(())
    }

    /// Wait until the persisted epoch party set satisfies `done`.
    pub async fn wait_for_epoch_parties(
        &self,
        done: impl Fn(&Parties) -> bool,
    ) -> Result<Parties, HarnessError> {
        let (client, done) = (&self.client, &done);
        self.poll("epoch parties", move || async move {
            let parties = client.get_epoch_parties().await?;
            Ok(done(&parties).then_some(parties))
        })
        .await
    }

    /// Wait until the registry satisfies `done`.
    pub async fn wait_for_parties(
        &self,
        done: impl Fn(&Parties) -> bool,
    ) -> Result<Parties, HarnessError> {
        let (client, done) = (&self.client, &done);
        self.poll("registry", move || async move {
            let parties = client.get_parties().await?;
            Ok(done(&parties).then_some(parties))
        })
        .await
    }

    /// Wait until every member of `parties` completes `epoch`'s DKG, then
    /// check that their outputs agree.
    pub async fn wait_for_dkg(
        &self,
        epoch: u64,
        parties: &Parties,
    ) -> Result<DkgOutcome, HarnessError> {
        for (id, url) in parties {
            let client = PartyClient::new(id.as_str(), url.as_str(), self.config.rpc_timeout)?;
            let client = &client;
            self.poll(&format!("{id} to complete epoch {epoch}"), move || async move {
                let status = client.dkg_status().await?;
                Ok((status.epoch == epoch && status.phase == DkgPhase::Complete).then_some(()))
            })
            .await?;
        }

        let mut outputs = BTreeMap::new();
        for id in parties.keys() {
            let party =
                self.parties.get(id).ok_or_else(|| HarnessError::UnknownParty(id.clone()))?;
            let output = party
                .handle
                .node()
                .state()
                .session()
                .and_then(|session| session.output())
                .ok_or_else(|| HarnessError::Divergence(format!("{id} has no output")))?;
            outputs.insert(id.clone(), output);
        }
        check_outputs(epoch, outputs)
    }

    /// Stop everything and surface the orchestrator's exit status.
    pub async fn shutdown(self) -> Result<(), HarnessError> {
        for party in self.parties.into_values() {
            party.shutdown.trigger();
            party.handle.stopped().await;
        }
        self.shutdown.trigger();
        self.aggregator.stopped().await?;
        Ok(())
    }

    async fn poll<T, F, Fut>(&self, what: &str, mut check: F) -> Result<T, HarnessError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, HarnessError>>,
    {
        let waited = tokio::time::timeout(self.config.timeout, async {
            loop {
                if let Some(value) = check().await? {
                    return Ok::<_, HarnessError>(value);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        });
        waited.await.map_err(|_| HarnessError::Timeout(what.to_string()))?
    }
}

/// Every output must agree on the group key, and every `threshold` key
/// shares must interpolate to the group secret.
fn check_outputs(
    epoch: u64,
    outputs: BTreeMap<String, DkgOutput>,
) -> Result<DkgOutcome, HarnessError> {
    let first = outputs
        .values()
        .next()
        .ok_or_else(|| HarnessError::Divergence("no outputs".to_string()))?;
    let (threshold, group_public_key) = (first.threshold, first.group_public_key);

    for (id, output) in &outputs {
        if output.epoch != epoch || output.threshold != threshold {
            return Err(HarnessError::Divergence(format!("{id} ran a different round")));
        }
        if output.group_public_key != group_public_key {
            return Err(HarnessError::Divergence(format!("{id} derived another group key")));
        }
        if output.verification_key() != first.verification_key_for(output.share_index) {
            return Err(HarnessError::Divergence(format!("{id} has an inconsistent key share")));
        }
    }

    let shares: Vec<_> = outputs.values().map(|o| (o.share_index, o.key_share)).collect();
    for window in shares.windows(threshold as usize) {
        let secret = interpolate_at_zero(window)?;
        if ProjectivePoint::GENERATOR * secret != group_public_key {
            return Err(HarnessError::Divergence("shares do not reconstruct the group key".into()));
        }
    }

    Ok(DkgOutcome { epoch, threshold, group_public_key, outputs })
}
