pub mod constant;
pub(crate) mod error;
pub mod types;
pub mod util;

pub type LibResult<T> = core::result::Result<T, error::LibError>;

pub use error::LibError;
pub use types::config::{
    AgentKind, ApiServer, Config, PeeringEntry, ServerSection, SubnetSection,
};
