use thiserror::Error;

/// Outcome of a control-plane call that did not succeed. Transport failures
/// are folded into this taxonomy at the client boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("API server rejected credentials")]
    Unauthorized,

    #[error("Malformed request or unknown entity")]
    RequestFormat,

    #[error("API server error")]
    ApiServer,

    #[error("Peering lease unavailable")]
    LeaseUnavailable,

    #[error("Unexpected status code {0}")]
    Unknown(u16),

    #[error("API server unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Retrying will not help; the owning loop should stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("`{0}` not found, is wireguard-tools installed?")]
    NotFound(String),

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("`{0}` produced no usable output")]
    InvalidOutput(String),

    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
}
