/// Error type for the HTTP server
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server could not bind or stopped with an I/O error
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
    /// The storage service could not be built
    #[error("Storage error: {0}")]
    Storage(#[from] slotscope_storage::Error),
    /// The configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] slotscope_config::error::Error),
    /// A server task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}
