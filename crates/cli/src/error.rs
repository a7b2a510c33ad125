#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Generic(String),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    StorageError(#[from] slotscope_storage::Error),
    #[error("Server error: {0}")]
    ServerError(#[from] slotscope_server::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] slotscope_config::error::Error),
}
