use crate::{ToolError, ToolResult};
use async_trait::async_trait;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};
use tokio::{io::AsyncWriteExt, process::Command};
use wgapi_lib::types::Secret;

/// Key and interface primitives provided by wireguard-tools.
#[async_trait]
pub trait WireGuardTool: Send + Sync {
    /// `wg genkey`
    async fn genkey(&self) -> ToolResult<Secret>;

    /// `wg pubkey`
    async fn pubkey(&self, private_key: &Secret) -> ToolResult<String>;

    /// `wg-quick up <config>`
    async fn up(&self, config: &Path) -> ToolResult<()>;

    /// `wg syncconf <interface> <config>`: replaces the peer set of a running
    /// interface without tearing it down.
    async fn syncconf(&self, interface: &str, config: &Path) -> ToolResult<()>;
}

#[async_trait]
impl<T: WireGuardTool + ?Sized> WireGuardTool for Arc<T> {
    async fn genkey(&self) -> ToolResult<Secret> {
        (**self).genkey().await
    }

    async fn pubkey(&self, private_key: &Secret) -> ToolResult<String> {
        (**self).pubkey(private_key).await
    }

    async fn up(&self, config: &Path) -> ToolResult<()> {
        (**self).up(config).await
    }

    async fn syncconf(&self, interface: &str, config: &Path) -> ToolResult<()> {
        (**self).syncconf(interface, config).await
    }
}

#[derive(Debug, Clone)]
pub struct WgCli {
    wg: PathBuf,
    wg_quick: PathBuf,
}

impl Default for WgCli {
    fn default() -> Self {
        Self::new("wg", "wg-quick")
    }
}

impl WgCli {
    pub fn new(wg: impl Into<PathBuf>, wg_quick: impl Into<PathBuf>) -> Self {
        Self {
            wg: wg.into(),
            wg_quick: wg_quick.into(),
        }
    }

    async fn exec(
        &self,
        program: &Path,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> ToolResult<String> {
        let name = program.display().to_string();
        tracing::debug!("Running {name} {}", args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolError::NotFound(name.clone()),
                _ => ToolError::Io(e),
            })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input).await?;
            // Closing stdin lets the child see EOF.
            drop(pipe);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                program: name,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|_| ToolError::InvalidOutput(name))
    }
}

#[async_trait]
impl WireGuardTool for WgCli {
    async fn genkey(&self) -> ToolResult<Secret> {
        let key = self.exec(&self.wg, &["genkey"], None).await?;
        if key.is_empty() {
            return Err(ToolError::InvalidOutput(self.wg.display().to_string()));
        }
        Ok(Secret::from(key))
    }

    async fn pubkey(&self, private_key: &Secret) -> ToolResult<String> {
        let input = format!("{}\n", private_key.expose());
        let key = self
            .exec(&self.wg, &["pubkey"], Some(input.as_bytes()))
            .await?;
        if key.is_empty() {
            return Err(ToolError::InvalidOutput(self.wg.display().to_string()));
        }
        Ok(key)
    }

    async fn up(&self, config: &Path) -> ToolResult<()> {
        let config = config.display().to_string();
        self.exec(&self.wg_quick, &["up", &config], None).await?;
        Ok(())
    }

    async fn syncconf(&self, interface: &str, config: &Path) -> ToolResult<()> {
        let config = config.display().to_string();
        self.exec(&self.wg, &["syncconf", interface, &config], None)
            .await?;
        Ok(())
    }
}
