use crate::{config::ServerIdentity, interface::Interface, ServerError, ServerResult};
use std::{path::Path, time::Duration};
use tokio::sync::broadcast;
use wgapi_lib::util::short_digest;
use wgapi_proto::{ControlPlane, WireGuardTool};

/// The last config content that was successfully hot-synced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot(Option<String>);

impl Snapshot {
    pub fn content(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn matches(&self, content: &str) -> bool {
        self.0.as_deref() == Some(content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied,
    Unchanged,
    FetchFailed,
    WriteFailed,
    SyncFailed,
}

/// Result of one reconcile pass: the snapshot to carry into the next pass
/// and what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub snapshot: Snapshot,
    pub outcome: CycleOutcome,
}

pub struct Server<C, T> {
    identity: ServerIdentity,
    api: C,
    interface: Interface<T>,
    refresh_interval: Duration,
}

impl<C, T> Server<C, T>
where
    C: ControlPlane,
    T: WireGuardTool,
{
    pub fn new(
        identity: ServerIdentity,
        api: C,
        tool: T,
        wireguard_dir: impl AsRef<Path>,
        refresh_interval: Duration,
    ) -> Self {
        let interface = Interface::new(identity.name().clone(), wireguard_dir, tool);
        Self {
            identity,
            api,
            interface,
            refresh_interval,
        }
    }

    /// Registers this server unless the control plane already knows it.
    pub async fn ensure_registered(&self) -> ServerResult<()> {
        let name = self.identity.name().as_str();
        if self.api.server_exists(name).await {
            tracing::info!("Server {name} already registered");
            return Ok(());
        }

        tracing::info!("Registering server {name}");
        self.api
            .register_server(&self.identity.registration_request())
            .await
            .map_err(|source| ServerError::Registration {
                server: name.to_string(),
                source,
            })?;
        tracing::info!(
            "Registered server {name} with public key {}",
            self.identity.public_key()
        );
        Ok(())
    }

    /// Writes the initial config (with the interface address) and brings the
    /// interface up. A failed `up` is logged and otherwise ignored, unless
    /// `wg-quick` is missing.
    pub async fn bring_up(&self) -> ServerResult<()> {
        let name = self.identity.name().as_str();
        let tunnel_ip = self.api.fetch_server_address(name).await?;
        let peers = self.api.fetch_server_config(name).await?;

        let content = self.identity.render_initial(&tunnel_ip, &peers);
        self.interface.write_config(&content).await?;
        tracing::info!(
            "Wrote initial config {} ({}) with {} peers",
            self.interface.config_path().display(),
            short_digest(&content),
            peers.peers.len()
        );

        if let Err(e) = self.interface.bring_up().await {
            if e.is_fatal() {
                tracing::error!("Cannot bring {name} up: {e}");
                return Err(e);
            }
        }
        Ok(())
    }

    /// One fetch, render, compare, apply pass. Only an unauthorized control
    /// plane or missing wireguard-tools is an error; every other failure
    /// keeps the previous snapshot.
    pub async fn reconcile(&self, snapshot: Snapshot) -> ServerResult<Cycle> {
        let name = self.identity.name().as_str();

        let peers = match self.api.fetch_server_config(name).await {
            Ok(peers) => peers,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Failed to fetch peers for {name}: {e}");
                return Ok(Cycle {
                    snapshot,
                    outcome: CycleOutcome::FetchFailed,
                });
            }
        };

        let content = self.identity.render_sync(&peers);
        if snapshot.matches(&content) {
            tracing::debug!("Config {} unchanged", short_digest(&content));
            return Ok(Cycle {
                snapshot,
                outcome: CycleOutcome::Unchanged,
            });
        }

        if let Err(e) = self.interface.write_config(&content).await {
            tracing::error!(
                "Failed to write {}: {e}",
                self.interface.config_path().display()
            );
            return Ok(Cycle {
                snapshot,
                outcome: CycleOutcome::WriteFailed,
            });
        }

        if let Err(e) = self.interface.hot_sync().await {
            if e.is_fatal() {
                tracing::error!("Cannot sync {name}: {e}");
                return Err(e);
            }
            tracing::error!("Failed to sync {name}: {e}");
            return Ok(Cycle {
                snapshot,
                outcome: CycleOutcome::SyncFailed,
            });
        }

        tracing::info!(
            "Applied config {} with {} peers to {name}",
            short_digest(&content),
            peers.peers.len()
        );
        Ok(Cycle {
            snapshot: Snapshot(Some(content)),
            outcome: CycleOutcome::Applied,
        })
    }

    /// Registers, brings the interface up, then reconciles every
    /// `refresh_interval` until `shutdown` fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> ServerResult<()> {
        self.ensure_registered().await?;
        self.bring_up().await?;

        let mut snapshot = Snapshot::default();
        loop {
            snapshot = self.reconcile(snapshot).await?.snapshot;

            tokio::select! {
                _ = tokio::time::sleep(self.refresh_interval) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Stopping server {}", self.identity.name());
                    break;
                }
            }
        }

        Ok(())
    }
}
