pub mod api;
pub mod command;
pub mod control;
pub(crate) mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod wireguard;

pub type ApiResult<T> = core::result::Result<T, error::ApiError>;
pub type ToolResult<T> = core::result::Result<T, error::ToolError>;

pub use api::{NewServerRequest, Peer, PeerList, PeeringLease, PeeringRequest};
pub use command::{WgCli, WireGuardTool};
pub use control::{ApiClient, ControlPlane, Operation};
pub use error::{ApiError, ToolError};
pub use wireguard::{WireGuardConfig, WireGuardConfigBuilder, WireGuardPeer};
