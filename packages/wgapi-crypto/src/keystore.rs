use crate::{CryptoError, CryptoResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use wgapi_lib::{types::Secret, util::write_private_file};
use wgapi_proto::WireGuardTool;

const KEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair {
    public_key: String,
    private_key: Secret,
}

impl Keypair {
    pub fn new(public_key: impl Into<String>, private_key: Secret) -> Self {
        Self {
            public_key: public_key.into(),
            private_key,
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &Secret {
        &self.private_key
    }
}

fn is_wireguard_key(key: &str) -> bool {
    base64::decode(key)
        .map(|b| b.len() == KEY_LEN)
        .unwrap_or(false)
}

async fn is_file(p: &Path) -> bool {
    fs::metadata(p).await.map(|m| m.is_file()).unwrap_or(false)
}

/// Named WireGuard keypairs cached on disk as `.<name>.priv` and
/// `<name>.pub`. A keypair is generated at most once; afterwards it is only
/// ever re-read.
#[derive(Debug)]
pub struct KeyStore<T> {
    dir: PathBuf,
    tool: T,
}

impl<T: WireGuardTool> KeyStore<T> {
    pub fn new(dir: impl Into<PathBuf>, tool: T) -> Self {
        Self {
            dir: dir.into(),
            tool,
        }
    }

    pub fn private_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{name}.priv"))
    }

    pub fn public_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.pub"))
    }

    /// Loads the keypair called `name`, generating it if neither file
    /// exists. A pair with only one file present is an error and is left
    /// untouched.
    pub async fn ensure(&self, name: &str) -> CryptoResult<Keypair> {
        let private_path = self.private_path(name);
        let public_path = self.public_path(name);

        match (is_file(&private_path).await, is_file(&public_path).await) {
            (true, true) => self.load(name, &private_path, &public_path).await,
            (false, false) => self.generate(name, &private_path, &public_path).await,
            (true, false) => Err(CryptoError::HalfWritten {
                name: name.to_string(),
                missing: public_path.display().to_string(),
            }),
            (false, true) => Err(CryptoError::HalfWritten {
                name: name.to_string(),
                missing: private_path.display().to_string(),
            }),
        }
    }

    async fn load(
        &self,
        name: &str,
        private_path: &Path,
        public_path: &Path,
    ) -> CryptoResult<Keypair> {
        let private_key = read_key(private_path).await?;
        let public_key = read_key(public_path).await?;

        if !is_wireguard_key(&private_key) {
            return Err(CryptoError::MalformedKey {
                name: name.to_string(),
                which: "private",
            });
        }
        if !is_wireguard_key(&public_key) {
            return Err(CryptoError::MalformedKey {
                name: name.to_string(),
                which: "public",
            });
        }

        tracing::debug!("Loaded keypair {name} from {}", self.dir.display());

        Ok(Keypair {
            public_key,
            private_key: Secret::from(private_key),
        })
    }

    async fn generate(
        &self,
        name: &str,
        private_path: &Path,
        public_path: &Path,
    ) -> CryptoResult<Keypair> {
        let private_key = self.tool.genkey().await?;
        if !is_wireguard_key(private_key.expose()) {
            return Err(CryptoError::MalformedKey {
                name: name.to_string(),
                which: "private",
            });
        }

        let public_key = self.tool.pubkey(&private_key).await?;
        if !is_wireguard_key(&public_key) {
            return Err(CryptoError::MalformedKey {
                name: name.to_string(),
                which: "public",
            });
        }

        write_key(private_path, private_key.expose()).await?;
        write_key(public_path, &public_key).await?;

        tracing::info!("Generated keypair {name} with public key {public_key}");

        Ok(Keypair {
            public_key,
            private_key,
        })
    }
}

async fn read_key(p: &Path) -> CryptoResult<String> {
    let content = fs::read_to_string(p)
        .await
        .map_err(|source| CryptoError::Io {
            path: p.display().to_string(),
            source,
        })?;
    Ok(content.trim().to_string())
}

async fn write_key(p: &Path, key: &str) -> CryptoResult<()> {
    write_private_file(p, key)
        .await
        .map_err(|source| CryptoError::Io {
            path: p.display().to_string(),
            source,
        })
}
