use crate::storage::StorageError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Revisions index at {0} is not a valid revisions document")]
    CorruptIndex(String),
    #[error("Revisions index contains a malformed revision value: {0:?}")]
    BadRevision(String),
    #[error("Could not acquire the lock on {0} before the current lease lapsed")]
    LockUnavailable(String),
    #[error("Failed to find the resource")]
    NotFound,
    #[error("Encountered uncategorized error")]
    ServiceError(#[from] anyhow::Error),
}

impl From<StorageError> for IndexError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::ServiceError(e) => Self::ServiceError(e),
        }
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(error: serde_json::Error) -> Self {
        IndexError::ServiceError(error.into())
    }
}

impl IntoResponse for IndexError {
    fn into_response(self) -> Response {
        let code = match &self {
            IndexError::CorruptIndex(path) => {
                tracing::error!(path, "Revisions index is corrupt");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            IndexError::BadRevision(value) => {
                tracing::error!(value, "Revisions index holds a malformed revision");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            IndexError::LockUnavailable(key) => {
                tracing::warn!(key, "Lock acquisition failed");
                StatusCode::SERVICE_UNAVAILABLE
            }
            IndexError::NotFound => StatusCode::NOT_FOUND,
            IndexError::ServiceError(error) => {
                tracing::error!(?error, "Encountered service error in index operation");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (code, self.to_string()).into_response()
    }
}
