use std::fmt;

use bookshelf_db::DbError;
use bookshelf_http::error::AppError;
use thiserror::Error;

/// Record store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    List,
    Create,
    Update,
    Delete,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            StoreOperation::List => "failed to list books",
            StoreOperation::Create => "failed to insert book",
            StoreOperation::Update => "failed to update book",
            StoreOperation::Delete => "failed to delete book",
        };
        f.write_str(message)
    }
}

/// The only error the record store returns: a failed statement, tagged with
/// the operation that issued it.
#[derive(Debug, Error)]
#[error("{operation}: {source}")]
pub struct DataAccessError {
    operation: StoreOperation,
    #[source]
    source: DbError,
}

impl DataAccessError {
    pub fn new(operation: StoreOperation, source: DbError) -> Self {
        Self { operation, source }
    }

    pub fn operation(&self) -> StoreOperation {
        self.operation
    }
}

impl From<DataAccessError> for AppError {
    fn from(err: DataAccessError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}
