use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The provided storage key is malformed.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    /// More keys were passed to a batch call than the backend accepts.
    #[error("batch of {actual} keys exceeds the per-call limit of {limit}")]
    BatchTooLarge { actual: usize, limit: usize },
    /// The remote store rejected or failed the request.
    #[error("remote store error ({code}): {message}")]
    Remote { code: String, message: String },
    /// The backend could not be configured.
    #[error("storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }
}
