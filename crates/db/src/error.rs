//! Error types for the connection pool.

use thiserror::Error;

pub use sqlx::Error as SqlxError;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("statement execution failed: {0}")]
    Execution(#[from] sqlx::Error),

    #[error("column '{column}' has unsupported type {type_name}")]
    UnsupportedColumn { column: String, type_name: String },

    #[error("column '{column}' is missing or not of type {expected}")]
    ColumnMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("invalid database url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl DbError {
    pub fn connect(target: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Connect {
            target: target.into(),
            source,
        }
    }

    pub fn column_mismatch(column: impl Into<String>, expected: &'static str) -> Self {
        Self::ColumnMismatch {
            column: column.into(),
            expected,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
