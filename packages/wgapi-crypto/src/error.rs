use thiserror::Error;
use wgapi_proto::ToolError;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Keypair {name} is half-written: {missing} is missing")]
    HalfWritten { name: String, missing: String },

    #[error("Keypair {name} holds a malformed {which} key")]
    MalformedKey { name: String, which: &'static str },

    #[error("Key generation failed: {0}")]
    KeyGeneration(#[from] ToolError),
}
