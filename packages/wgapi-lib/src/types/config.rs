use crate::{
    constant::{DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_STATE_DIR, DEFAULT_WIREGUARD_DIR},
    types::Secret,
    LibError, LibResult,
};
use serde::Deserialize;
use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};
use strum::Display;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgentKind {
    Server,
    Client,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiServer {
    pub address: String,
    pub username: String,
    pub password: Secret,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SubnetSection {
    pub network_address: String,
    pub network_mask: u8,
    pub num_reserved_ips: u32,
    pub allowed_ips: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    pub name: String,
    pub subnet: SubnetSection,
    pub endpoint_address: String,
    pub endpoint_port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PeeringEntry {
    pub server_name: String,
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_wireguard_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WIREGUARD_DIR)
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_DIR)
}

/// Static agent descriptor, loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: AgentKind,
    api_server: ApiServer,
    #[serde(default)]
    server: Option<ServerSection>,
    #[serde(default)]
    peering_list: Vec<PeeringEntry>,
    #[serde(default = "default_refresh_interval")]
    refresh_interval: u64,
    #[serde(default = "default_wireguard_dir")]
    wireguard_dir: PathBuf,
    #[serde(default = "default_state_dir")]
    state_dir: PathBuf,
}

impl Config {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn api_server(&self) -> &ApiServer {
        &self.api_server
    }

    pub fn server(&self) -> Option<&ServerSection> {
        self.server.as_ref()
    }

    pub fn peering_list(&self) -> &[PeeringEntry] {
        &self.peering_list
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn wireguard_dir(&self) -> &Path {
        &self.wireguard_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> LibResult<Self> {
        self.refresh_interval = interval.as_secs();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> LibResult<()> {
        if self.refresh_interval == 0 {
            return Err(LibError::InvalidConfig(
                "refresh_interval must be at least one second".to_string(),
            ));
        }

        match self.kind {
            AgentKind::Server => {
                if self.server.is_none() {
                    return Err(LibError::InvalidConfig(
                        "`server` section required when type is server".to_string(),
                    ));
                }
            }
            AgentKind::Client => {
                if self.name.is_empty() {
                    return Err(LibError::InvalidConfig(
                        "`name` required when type is client".to_string(),
                    ));
                }
                if self.peering_list.is_empty() {
                    tracing::warn!("Client {} has an empty peering list", self.name);
                }
            }
        }

        Ok(())
    }
}

impl TryFrom<&PathBuf> for Config {
    type Error = LibError;
    fn try_from(p: &PathBuf) -> LibResult<Self> {
        Config::try_from(p.as_path())
    }
}

impl TryFrom<&Path> for Config {
    type Error = LibError;
    fn try_from(p: &Path) -> LibResult<Self> {
        let file = File::open(p)?;
        let content: serde_yaml::Value = serde_yaml::from_reader(file)?;
        let config: Config = serde_yaml::from_value(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&str> for Config {
    type Error = LibError;
    fn try_from(s: &str) -> LibResult<Self> {
        let content: serde_yaml::Value = serde_yaml::from_str(s)?;
        let config: Config = serde_yaml::from_value(content)?;
        config.validate()?;
        Ok(config)
    }
}
