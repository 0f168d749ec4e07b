//! Connection pool for the bookshelf service.
//!
//! Callers only see [`StatementExecutor`]: fixed statement text plus an
//! out-of-band parameter list. [`DbPool`] implements it for MySQL and SQLite.

pub mod error;
pub mod executor;
pub mod module;
pub mod pool;
pub mod value;

pub use error::{DbError, DbResult, SqlxError};
pub use executor::{ExecOutcome, StatementExecutor};
pub use module::{create_module, DbModule};
pub use pool::DbPool;
pub use value::{Row, SqlValue};
