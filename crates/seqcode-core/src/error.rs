use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("code already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("invalid storage identifier: {0}")]
    InvalidIdentifier(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors returned while generating an entity code.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// The request was malformed. Raised before any storage access, except
    /// when the allocated value outgrows the configured width.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Every attempt inside the retry ceiling hit a code already in use.
    #[error("no free code for sequence '{sequence}' after {attempts} attempts (last tried {last_code})")]
    Exhausted {
        sequence: String,
        attempts: u32,
        last_code: String,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GenerateError {
    /// Returns `true` when the failure came from the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, GenerateError::Storage(_))
    }
}
