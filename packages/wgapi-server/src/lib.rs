pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod interface;
pub(crate) mod server;

pub type ServerResult<T> = core::result::Result<T, error::ServerError>;

pub use config::ServerIdentity;
pub use error::ServerError;
pub use interface::Interface;
pub use server::{Cycle, CycleOutcome, Server, Snapshot};
