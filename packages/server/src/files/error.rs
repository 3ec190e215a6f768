use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

use super::mapping::FileRole;

/// Errors raised by the file lifecycle core.
#[derive(Debug, Error)]
pub enum FileError {
    /// Referenced file ids are not present in the record store.
    #[error("{operation}: unknown file ids {missing:?}")]
    Validation {
        operation: &'static str,
        missing: Vec<i64>,
    },
    /// The role's cardinality does not match the operation.
    #[error("{operation}: role '{role}' is not a {expected} role")]
    RoleMismatch {
        operation: &'static str,
        role: FileRole,
        expected: &'static str,
    },
    /// A record looked up directly does not exist.
    #[error("file {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] DbErr),
}
