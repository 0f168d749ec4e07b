//! The execution capability handed to data-access code.

use async_trait::async_trait;

use crate::error::DbResult;
use crate::value::{Row, SqlValue};

/// Metadata returned by a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Auto-increment id assigned by an `INSERT`; 0 when none was generated.
    pub last_insert_id: u64,
}

/// Runs fixed statement text with out-of-band parameters.
///
/// Placeholders are positional `?`. Implementations must bind `params`
/// through the driver and never splice them into `sql`.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run a statement that yields rows.
    async fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>>;

    /// Run a statement for its side effect.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<ExecOutcome>;
}
