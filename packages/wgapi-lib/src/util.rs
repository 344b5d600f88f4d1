use sha2::{Digest, Sha256};
use std::{env, os::unix::fs::PermissionsExt, path::Path, str::FromStr};
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    signal::unix::{signal, Signal, SignalKind},
};
use tracing_subscriber::filter::EnvFilter;

const RUST_LOG: &str = "RUST_LOG";
const HUMAN_LOGGING: &str = "HUMAN_LOGGING";

pub fn init_logging() -> anyhow::Result<()> {
    let filter = match env::var_os(RUST_LOG) {
        Some(_) => EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid `RUST_LOG` provided: {e}"))?,
        None => EnvFilter::new("info"),
    };

    let human_logging = match env::var(HUMAN_LOGGING) {
        Ok(s) => bool::from_str(&s).map_err(|_| {
            anyhow::anyhow!(
                "Expected `true` or `false` to be provided for `HUMAN_LOGGING`"
            )
        })?,
        Err(_) => true,
    };

    let sub = tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    if human_logging {
        sub.with_ansi(true)
            .with_level(true)
            .with_line_number(true)
            .init();
    } else {
        sub.with_ansi(false)
            .with_level(true)
            .with_line_number(true)
            .json()
            .init();
    }
    Ok(())
}

pub fn shutdown_signal_handler() -> std::io::Result<impl futures::Future<Output = ()>> {
    let mut sighup: Signal = signal(SignalKind::hangup())?;
    let mut sigterm: Signal = signal(SignalKind::terminate())?;
    let mut sigint: Signal = signal(SignalKind::interrupt())?;

    let future = async move {
        tokio::select! {
            _ = sighup.recv() => {
                tracing::info!("Received SIGHUP. Stopping services.");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM. Stopping services.");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT. Stopping services.");
            }
        }
    };

    Ok(future)
}

pub fn sha256(input: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Short digest used to refer to rendered configs in logs without printing
/// the private key they contain.
pub fn short_digest(input: impl AsRef<[u8]>) -> String {
    let mut digest = sha256(input);
    digest.truncate(12);
    digest
}

/// Writes `content` to `path` readable and writable by the owner only,
/// replacing any previous content.
pub async fn write_private_file(
    path: impl AsRef<Path>,
    content: impl AsRef<[u8]>,
) -> std::io::Result<()> {
    let path = path.as_ref();

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.write_all(content.as_ref()).await?;
    file.flush().await?;

    // `mode` only applies on creation.
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;

    Ok(())
}

/// Creates `dir` (mode 0755) if it does not exist yet.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> std::io::Result<()> {
    let dir = dir.as_ref();
    if fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(());
    }

    tracing::info!("Creating directory {}", dir.display());
    fs::create_dir_all(dir).await?;

    fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}
