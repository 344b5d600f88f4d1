use crate::{ClientError, ClientResult};
use std::{io::ErrorKind, path::PathBuf};
use strum::{AsRefStr, Display};
use wgapi_crypto::{KeyStore, Keypair};
use wgapi_lib::{types::InterfaceName, util::write_private_file, PeeringEntry};
use wgapi_proto::{
    wireguard::endpoint, ControlPlane, PeeringLease, PeeringRequest, WireGuardConfigBuilder,
    WireGuardPeer, WireGuardTool,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PeeringState {
    Absent,
    Requested,
    Provisioned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeeringOutcome {
    Provisioned,
    AlreadyProvisioned,
    Abandoned(String),
}

/// Per-peering result of one provisioning pass, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub entries: Vec<(String, PeeringOutcome)>,
}

impl Report {
    pub fn outcome(&self, server_name: &str) -> Option<&PeeringOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| name == server_name)
            .map(|(_, outcome)| outcome)
    }

    pub fn abandoned(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, PeeringOutcome::Abandoned(_)))
            .count()
    }
}

/// Drives each configured peering from `Absent` to `Provisioned`. A peering
/// is provisioned once its config file exists; it is never touched again.
pub struct Provisioner<C, T> {
    client_name: String,
    api: C,
    keystore: KeyStore<T>,
    wireguard_dir: PathBuf,
}

impl<C, T> Provisioner<C, T>
where
    C: ControlPlane,
    T: WireGuardTool,
{
    pub fn new(
        client_name: impl Into<String>,
        api: C,
        keystore: KeyStore<T>,
        wireguard_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            api,
            keystore,
            wireguard_dir: wireguard_dir.into(),
        }
    }

    pub fn config_path(&self, server_name: &str) -> PathBuf {
        InterfaceName::from(server_name).config_path(&self.wireguard_dir)
    }

    /// Only a config file that is known not to exist counts as `Absent`;
    /// any other lookup failure is an error.
    pub async fn state(&self, server_name: &str) -> ClientResult<PeeringState> {
        match tokio::fs::metadata(self.config_path(server_name)).await {
            Ok(_) => Ok(PeeringState::Provisioned),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(PeeringState::Absent),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn provision(&self, server_name: &str) -> ClientResult<PeeringOutcome> {
        if self.state(server_name).await? == PeeringState::Provisioned {
            tracing::debug!("Peering with {server_name} already provisioned");
            return Ok(PeeringOutcome::AlreadyProvisioned);
        }

        // The peering keypair is named after the server it peers with.
        let keypair = self.keystore.ensure(server_name).await?;

        let request = PeeringRequest {
            client_name: self.client_name.clone(),
            server_name: server_name.to_string(),
            public_key: keypair.public_key().to_string(),
        };
        self.api
            .register_client(&request)
            .await
            .map_err(|source| ClientError::Registration {
                server: server_name.to_string(),
                source,
            })?;
        transition(server_name, PeeringState::Absent, PeeringState::Requested);

        let lease = self
            .api
            .fetch_peering_lease(&self.client_name, server_name)
            .await
            .map_err(|source| ClientError::Lease {
                server: server_name.to_string(),
                source,
            })?;

        let path = self.config_path(server_name);
        write_private_file(&path, render(&keypair, &lease)).await?;
        transition(server_name, PeeringState::Requested, PeeringState::Provisioned);
        tracing::info!(
            "Wrote {} with address {}",
            path.display(),
            lease.subnet.lease
        );

        Ok(PeeringOutcome::Provisioned)
    }

    /// Provisions every peering in order. A failed peering is abandoned for
    /// this pass; an unauthorized control plane or missing wireguard-tools
    /// stops the pass early.
    pub async fn run(&self, peerings: &[PeeringEntry]) -> ClientResult<Report> {
        let mut report = Report::default();

        for entry in peerings {
            let server_name = entry.server_name.as_str();
            let outcome = match self.provision(server_name).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => {
                    tracing::error!("Stopping provisioning at {server_name}: {e}");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Abandoning peering with {server_name}: {e}");
                    PeeringOutcome::Abandoned(e.to_string())
                }
            };
            report.entries.push((server_name.to_string(), outcome));
        }

        tracing::info!(
            "Provisioning pass for {} done: {} peerings, {} abandoned",
            self.client_name,
            report.entries.len(),
            report.abandoned()
        );
        Ok(report)
    }
}

fn transition(server_name: &str, from: PeeringState, to: PeeringState) {
    tracing::info!("Peering with {server_name}: {from} -> {to}");
}

fn render(keypair: &Keypair, lease: &PeeringLease) -> String {
    WireGuardConfigBuilder::builder(keypair.private_key().clone())
        .address(lease.subnet.lease.clone())
        .peer(WireGuardPeer {
            public_key: lease.server.public_key.clone(),
            allowed_ips: lease.subnet.allowed_ips.clone(),
            endpoint: Some(endpoint(
                &lease.server.endpoint_address,
                lease.server.endpoint_port,
            )),
        })
        .build()
        .render()
}
