use crate::command::AgentArgs;
use anyhow::Context;
use std::sync::Arc;
use tokio::{sync::broadcast, task::JoinSet};
use wgapi_client::{PeeringOutcome, Provisioner};
use wgapi_crypto::KeyStore;
use wgapi_lib::{
    util::{ensure_dir, init_logging, shutdown_signal_handler},
    AgentKind, Config,
};
use wgapi_proto::{ApiClient, WgCli};
use wgapi_server::{Server, ServerIdentity};

/// Logging, config and state directory: everything both modes need before
/// they touch the control plane.
pub async fn init(args: &AgentArgs) -> anyhow::Result<Config> {
    init_logging()?;

    let mut config = Config::try_from(&args.config)
        .with_context(|| format!("Could not load config {}", args.config.display()))?;
    if let Some(interval) = args.interval {
        config = config.with_refresh_interval(interval)?;
    }
    tracing::info!("Configuration: {config:?}");

    ensure_dir(config.state_dir()).await.with_context(|| {
        format!("Could not create state dir {}", config.state_dir().display())
    })?;

    Ok(config)
}

pub async fn run(config: Config, args: &AgentArgs) -> anyhow::Result<()> {
    let kind = config.kind();
    run_as(kind, config, args).await
}

pub async fn run_as(kind: AgentKind, config: Config, args: &AgentArgs) -> anyhow::Result<()> {
    tracing::info!("Starting {kind} agent");
    let tool = Arc::new(WgCli::new(&args.wg, &args.wg_quick));
    match kind {
        AgentKind::Server => run_server(config, tool).await,
        AgentKind::Client => run_client(config, tool).await,
    }
}

async fn run_server(config: Config, tool: Arc<WgCli>) -> anyhow::Result<()> {
    let section = config
        .server()
        .context("Server mode needs a `server` section")?;

    let keystore = KeyStore::new(config.state_dir(), tool.clone());
    let keypair = keystore.ensure(&section.name).await?;
    let identity = ServerIdentity::new(section, keypair);
    let api = ApiClient::try_from(config.api_server())?;

    let server = Server::new(
        identity,
        api,
        tool,
        config.wireguard_dir(),
        config.refresh_interval(),
    );

    let (tx, rx) = broadcast::channel::<()>(1);
    let signal = shutdown_signal_handler()?;

    let mut subsystems: JoinSet<()> = JoinSet::new();
    subsystems.spawn(async move {
        signal.await;
        if let Err(e) = tx.send(()) {
            tracing::error!("Failed to send shutdown signal: {e}");
        }
    });

    let result = server.run(rx).await;
    subsystems.shutdown().await;

    result?;
    Ok(())
}

async fn run_client(config: Config, tool: Arc<WgCli>) -> anyhow::Result<()> {
    if config.name().is_empty() {
        anyhow::bail!("Client mode needs a `name`");
    }

    let keystore = KeyStore::new(config.state_dir(), tool);
    let api = ApiClient::try_from(config.api_server())?;
    let provisioner = Provisioner::new(config.name(), api, keystore, config.wireguard_dir());

    let report = provisioner.run(config.peering_list()).await?;
    for (server_name, outcome) in &report.entries {
        match outcome {
            PeeringOutcome::Provisioned => tracing::info!("{server_name}: provisioned"),
            PeeringOutcome::AlreadyProvisioned => {
                tracing::info!("{server_name}: already provisioned")
            }
            PeeringOutcome::Abandoned(reason) => {
                tracing::warn!("{server_name}: abandoned ({reason})")
            }
        }
    }

    Ok(())
}
