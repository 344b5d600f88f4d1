pub(crate) mod error;
pub(crate) mod peering;

pub type ClientResult<T> = core::result::Result<T, error::ClientError>;

pub use error::ClientError;
pub use peering::{PeeringOutcome, PeeringState, Provisioner, Report};
