use thiserror::Error;
use wgapi_crypto::CryptoError;
use wgapi_proto::{ApiError, ToolError};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keypair error: {0}")]
    Keypair(#[from] CryptoError),

    #[error("Could not register with server {server}: {source}")]
    Registration {
        server: String,
        #[source]
        source: ApiError,
    },

    #[error("Could not fetch peering lease from server {server}: {source}")]
    Lease {
        server: String,
        #[source]
        source: ApiError,
    },
}

impl ClientError {
    /// Whether the whole provisioning pass has to stop, rather than just the
    /// peering that failed.
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Registration { source, .. } | ClientError::Lease { source, .. } => {
                source.is_fatal()
            }
            ClientError::Keypair(CryptoError::KeyGeneration(ToolError::NotFound(_))) => true,
            _ => false,
        }
    }
}
