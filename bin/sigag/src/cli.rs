use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sigag_aggregator::AggregatorService;
use sigag_config::{NodeConfig, PartyConfig};
use sigag_party::{PartyHandle, PartyService};
use sigag_rpc::Shutdown;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sigag")]
#[command(about = "Signature aggregator: epoch orchestrator and DKG party nodes")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE", global = true, env = "SIGAG_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,

    /// Root directory for persisted state.
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run the aggregator.
    Aggregator(AggregatorArgs),
    /// Run one party.
    Party(PartyArgs),
    /// Run an aggregator and several parties in one process.
    Local(LocalArgs),
}

#[derive(clap::Args, Debug)]
pub(crate) struct AggregatorArgs {
    /// Address to serve RPC on.
    #[arg(long)]
    pub(crate) listen: Option<String>,

    /// Seconds before the first epoch.
    #[arg(long)]
    pub(crate) initial_tick: Option<u64>,

    /// Seconds between epochs.
    #[arg(long)]
    pub(crate) epoch_duration: Option<u64>,

    /// Threshold is `floor(parties / factor) + 1`.
    #[arg(long)]
    pub(crate) threshold_factor: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct PartyArgs {
    /// Party id; defaults to the listen port.
    #[arg(long)]
    pub(crate) id: Option<String>,

    /// Address to serve RPC on.
    #[arg(long)]
    pub(crate) listen: Option<String>,

    /// Aggregator URL.
    #[arg(long, env = "SIGAG_AGGREGATOR_URL")]
    pub(crate) aggregator: Option<String>,

    /// Ask the aggregator to reach this party over HTTPS.
    #[arg(long)]
    pub(crate) tls: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct LocalArgs {
    /// Number of parties.
    #[arg(long, default_value_t = 5)]
    pub(crate) parties: u16,

    /// Port of the first party; the others follow.
    #[arg(long, default_value_t = 8801)]
    pub(crate) base_port: u16,

    #[command(flatten)]
    pub(crate) aggregator: AggregatorArgs,
}

impl Cli {
    pub(crate) fn load_config(&self) -> eyre::Result<NodeConfig> {
        let mut config = NodeConfig::load_or_default(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.aggregator.data_dir = dir.join("aggregator");
            config.party.data_dir = Some(dir.join("party"));
        }
        Ok(config)
    }

    pub(crate) fn run(self) -> eyre::Result<()> {
        let config = self.load_config()?;
        let rt = tokio::runtime::Runtime::new()?;
        match self.command {
            Commands::Aggregator(args) => rt.block_on(run_aggregator(args.apply(config))),
            Commands::Party(args) => rt.block_on(run_party(args.apply(config))),
            Commands::Local(args) => {
                let config = args.aggregator.apply(config);
                rt.block_on(run_local(config, args.parties, args.base_port, self.data_dir))
            }
        }
    }
}

impl AggregatorArgs {
    fn apply(&self, mut config: NodeConfig) -> NodeConfig {
        let agg = &mut config.aggregator;
        if let Some(listen) = &self.listen {
            agg.listen_addr = listen.clone();
        }
        if let Some(secs) = self.initial_tick {
            agg.initial_tick_secs = secs;
        }
        if let Some(secs) = self.epoch_duration {
            agg.epoch_duration_secs = secs;
        }
        if let Some(factor) = self.threshold_factor {
            agg.threshold_factor = factor;
        }
        config
    }
}

impl PartyArgs {
    fn apply(self, mut config: NodeConfig) -> NodeConfig {
        let party = &mut config.party;
        if self.id.is_some() {
            party.id = self.id;
        }
        if let Some(listen) = self.listen {
            party.listen_addr = listen;
        }
        if let Some(url) = self.aggregator {
            party.aggregator_url = url;
        }
        if self.tls {
            party.no_tls = false;
        }
        config
    }
}

async fn run_aggregator(config: NodeConfig) -> eyre::Result<()> {
    let shutdown = Shutdown::new();
    let handle = AggregatorService::new(config.aggregator).start(&shutdown).await?;
    info!(url = %handle.url(), "aggregator running, press ctrl-c to stop");

    wait_for_exit(&shutdown).await?;
    handle.stopped().await?;
    Ok(())
}

async fn run_party(config: NodeConfig) -> eyre::Result<()> {
    let shutdown = Shutdown::new();
    let handle = PartyService::new(config.party).start(&shutdown).await?;
    info!(id = handle.id(), url = %handle.url(), "party running, press ctrl-c to stop");

    wait_for_exit(&shutdown).await?;
    handle.stopped().await;
    Ok(())
}

async fn run_local(
    config: NodeConfig,
    parties: u16,
    base_port: u16,
    data_dir: Option<PathBuf>,
) -> eyre::Result<()> {
    let shutdown = Shutdown::new();
    let aggregator = AggregatorService::new(config.aggregator).start(&shutdown).await?;
    info!(url = %aggregator.url(), parties, "local aggregator running");

    let mut handles: Vec<PartyHandle> = Vec::with_capacity(parties.into());
    for offset in 0..parties {
        let port = base_port
            .checked_add(offset)
            .ok_or_else(|| eyre::eyre!("party port overflows past {base_port}"))?;
        let mut party = PartyConfig { no_tls: true, ..PartyConfig::local(port) }
            .with_aggregator_url(aggregator.url());
        party.rpc_timeout_ms = config.party.rpc_timeout_ms;
        party.round_deadline_secs = config.party.round_deadline_secs;
        party.data_dir = data_dir.as_ref().map(|dir| dir.join(port.to_string()));
        match PartyService::new(party).start(&shutdown).await {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                shutdown.trigger();
                return Err(e.into());
            }
        }
    }
    info!(parties = handles.len(), "local parties registered, press ctrl-c to stop");

    wait_for_exit(&shutdown).await?;
    for handle in handles {
        handle.stopped().await;
    }
    aggregator.stopped().await?;
    Ok(())
}

/// Resolves on ctrl-c or once something else triggered `shutdown`, which is
/// triggered on return.
async fn wait_for_exit(shutdown: &Shutdown) -> eyre::Result<()> {
    let mut listener = shutdown.listener();
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("ctrl-c received, shutting down");
        }
        _ = listener.wait() => {}
    }
    shutdown.trigger();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_local() {
        let cli =
            Cli::parse_from(["sigag", "-v", "local", "--parties", "3", "--epoch-duration", "10"]);
        assert!(cli.verbose);
        let Commands::Local(args) = cli.command else { panic!("expected local") };
        assert_eq!(args.parties, 3);
        assert_eq!(args.base_port, 8801);
        assert_eq!(args.aggregator.epoch_duration, Some(10));
    }

    #[test]
    fn test_party_overrides() {
        let cli = Cli::parse_from([
            "sigag",
            "party",
            "--listen",
            "127.0.0.1:9901",
            "--aggregator",
            "http://10.0.0.1:8080/",
            "--tls",
        ]);
        let Commands::Party(args) = cli.command else { panic!("expected party") };
        let config = args.apply(NodeConfig::default());
        assert_eq!(config.party.listen_addr, "127.0.0.1:9901");
        assert_eq!(config.party.party_id(), "9901");
        assert_eq!(config.party.aggregator_url, "http://10.0.0.1:8080/");
        assert!(!config.party.no_tls);
    }

    #[test]
    fn test_aggregator_overrides() {
        let cli = Cli::parse_from([
            "sigag",
            "aggregator",
            "--initial-tick",
            "1",
            "--threshold-factor",
            "3",
        ]);
        let Commands::Aggregator(args) = cli.command else { panic!("expected aggregator") };
        let config = args.apply(NodeConfig::default());
        assert_eq!(config.aggregator.initial_tick_secs, 1);
        assert_eq!(config.aggregator.threshold_factor, 3.0);
        assert_eq!(config.aggregator.epoch_duration_secs, 100);
    }

    #[test]
    fn test_data_dir_splits_roles() {
        let cli = Cli::parse_from(["sigag", "--data-dir", "/var/sigag", "aggregator"]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.aggregator.data_dir, PathBuf::from("/var/sigag/aggregator"));
        assert_eq!(config.party.data_dir, Some(PathBuf::from("/var/sigag/party")));
    }
}
