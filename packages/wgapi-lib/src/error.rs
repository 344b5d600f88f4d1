use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
