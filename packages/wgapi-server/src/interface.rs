use crate::ServerResult;
use std::path::{Path, PathBuf};
use wgapi_lib::{types::InterfaceName, util::write_private_file};
use wgapi_proto::{ToolError, WireGuardTool};

/// A local WireGuard interface driven through its on-disk config file.
#[derive(Debug)]
pub struct Interface<T> {
    name: InterfaceName,
    config_path: PathBuf,
    tool: T,
}

impl<T: WireGuardTool> Interface<T> {
    pub fn new(name: InterfaceName, wireguard_dir: impl AsRef<Path>, tool: T) -> Self {
        let config_path = name.config_path(wireguard_dir);
        Self {
            name,
            config_path,
            tool,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub async fn write_config(&self, content: &str) -> ServerResult<()> {
        write_private_file(&self.config_path, content).await?;
        Ok(())
    }

    /// `wg-quick up`. An interface that is already up fails the same way a
    /// real error does, so callers log the failure and carry on. A missing
    /// `wg-quick` is reported as is.
    pub async fn bring_up(&self) -> ServerResult<()> {
        match self.tool.up(&self.config_path).await {
            Ok(()) => {
                tracing::info!("Interface {} is up", self.name);
                Ok(())
            }
            Err(e @ ToolError::NotFound(_)) => Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    "Failed to bring interface {} up, it may already exist: {e}",
                    self.name
                );
                Err(e.into())
            }
        }
    }

    /// Replaces the running peer set with the on-disk config without
    /// dropping the interface.
    pub async fn hot_sync(&self) -> ServerResult<()> {
        self.tool
            .syncconf(self.name.as_str(), &self.config_path)
            .await?;
        Ok(())
    }
}
