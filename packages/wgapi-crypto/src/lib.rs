pub(crate) mod error;
pub mod keystore;

pub use crate::error::CryptoError;
pub use crate::keystore::{KeyStore, Keypair};

pub type CryptoResult<T> = core::result::Result<T, CryptoError>;
