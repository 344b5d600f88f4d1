use thiserror::Error;
use wgapi_proto::{ApiError, ToolError};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not register server {server}: {source}")]
    Registration {
        server: String,
        #[source]
        source: ApiError,
    },

    #[error("Control plane error: {0}")]
    Api(#[from] ApiError),

    #[error("WireGuard tool error: {0}")]
    Tool(#[from] ToolError),
}

impl ServerError {
    /// Errors the server loop cannot recover from by waiting for the next
    /// cycle: rejected credentials and missing wireguard-tools.
    pub fn is_fatal(&self) -> bool {
        match self {
            ServerError::Api(e) => e.is_fatal(),
            ServerError::Tool(ToolError::NotFound(_)) => true,
            _ => false,
        }
    }
}
