pub mod config;

use crate::constant::WIREGUARD_CONFIG_EXT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of a local WireGuard interface. Server mode uses the server name,
/// client mode uses the name of the remote server being peered with.
#[derive(Debug, Serialize, Deserialize, Hash, Eq, PartialEq, Clone)]
pub struct InterfaceName(String);

impl InterfaceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<dir>/<name>.conf`
    pub fn config_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref()
            .join(format!("{}.{}", self.0, WIREGUARD_CONFIG_EXT))
    }
}

impl std::fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InterfaceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for InterfaceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for InterfaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A value that must never end up in logs: API passwords and WireGuard
/// private keys.
#[derive(Serialize, Deserialize, Hash, Eq, PartialEq, Clone, Default)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Secret(<redacted>)")
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self(s)
    }
}
