use crate::data_stores::sqlite::errors::SqliteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Data Store Error: {0}")]
    DataStoreError(#[from] SqliteError),

    #[error("Input/Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl Error {
    /// errors in the arguments given to the helper
    pub fn invalid_arguments<T: ToString>(message: T) -> Self {
        Error::InvalidArguments(message.to_string())
    }
}
