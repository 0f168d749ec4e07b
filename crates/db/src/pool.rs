//! Connection pool management.
//!
//! One pool per process, built from [`DatabaseSettings`] at startup. MySQL is
//! the production backend; SQLite is selected by a `sqlite:` url for local runs
//! and tests.

use std::str::FromStr;

use async_trait::async_trait;
use bookshelf_kernel::settings::DatabaseSettings;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, MySql, MySqlPool, Row as _, Sqlite, SqlitePool, TypeInfo};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::executor::{ExecOutcome, StatementExecutor};
use crate::value::{Row, SqlValue};

/// Database-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    /// Build the pool and open its first connection.
    ///
    /// Connectivity and authentication failures are returned as
    /// [`DbError::Connect`]; nothing is retried.
    pub async fn connect(settings: &DatabaseSettings) -> DbResult<Self> {
        let target = settings.redacted_target();

        let pool = match settings.url.as_deref() {
            Some(url) if url.starts_with("sqlite:") => {
                let options = SqliteConnectOptions::from_str(url)
                    .map_err(|e| DbError::InvalidUrl {
                        url: target.clone(),
                        reason: e.to_string(),
                    })?
                    .create_if_missing(true);

                let mut pool_options =
                    SqlitePoolOptions::new().max_connections(settings.max_connections);
                if url.contains(":memory:") {
                    // The in-memory database dies with its last connection.
                    pool_options = pool_options
                        .max_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                }

                let pool = pool_options
                    .connect_with(options)
                    .await
                    .map_err(|e| DbError::connect(target.clone(), e))?;
                DbPool::Sqlite(pool)
            }
            Some(url) if url.starts_with("mysql:") => {
                let options =
                    MySqlConnectOptions::from_str(url).map_err(|e| DbError::InvalidUrl {
                        url: target.clone(),
                        reason: e.to_string(),
                    })?;
                Self::connect_mysql(options, settings.max_connections, &target).await?
            }
            Some(_) => {
                return Err(DbError::InvalidUrl {
                    url: target,
                    reason: "expected a mysql: or sqlite: url".to_string(),
                })
            }
            None => {
                let options = MySqlConnectOptions::new()
                    .host(&settings.host)
                    .port(settings.port)
                    .username(&settings.user)
                    .password(&settings.password)
                    .database(&settings.database);
                Self::connect_mysql(options, settings.max_connections, &target).await?
            }
        };

        info!(
            db = %target,
            backend = pool.backend(),
            max_connections = settings.max_connections,
            "database connection pool created"
        );

        Ok(pool)
    }

    async fn connect_mysql(
        options: MySqlConnectOptions,
        max_connections: u32,
        target: &str,
    ) -> DbResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DbError::connect(target, e))?;
        Ok(DbPool::MySql(pool))
    }

    pub fn backend(&self) -> &'static str {
        match self {
            DbPool::MySql(_) => "mysql",
            DbPool::Sqlite(_) => "sqlite",
        }
    }

    /// Open connections, idle or in use.
    pub fn size(&self) -> u32 {
        match self {
            DbPool::MySql(pool) => pool.size(),
            DbPool::Sqlite(pool) => pool.size(),
        }
    }

    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Sqlite(pool) => pool.close().await,
        }
        info!(backend = self.backend(), "database connection pool closed");
    }
}

#[async_trait]
impl StatementExecutor for DbPool {
    async fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        debug!(sql, params = params.len(), "fetching rows");

        match self {
            DbPool::MySql(pool) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_mysql(query, param);
                }
                let rows = query.fetch_all(pool).await?;
                rows.iter().map(decode_mysql_row).collect()
            }
            DbPool::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_sqlite(query, param);
                }
                let rows = query.fetch_all(pool).await?;
                rows.iter().map(decode_sqlite_row).collect()
            }
        }
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<ExecOutcome> {
        debug!(sql, params = params.len(), "executing statement");

        match self {
            DbPool::MySql(pool) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_mysql(query, param);
                }
                let result = query.execute(pool).await?;
                Ok(ExecOutcome {
                    rows_affected: result.rows_affected(),
                    last_insert_id: result.last_insert_id(),
                })
            }
            DbPool::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_sqlite(query, param);
                }
                let result = query.execute(pool).await?;
                Ok(ExecOutcome {
                    rows_affected: result.rows_affected(),
                    last_insert_id: u64::try_from(result.last_insert_rowid()).unwrap_or(0),
                })
            }
        }
    }
}

fn bind_mysql<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    param: &'q SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match param {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
    }
}

fn bind_sqlite<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
    }
}

fn decode_mysql_row(row: &MySqlRow) -> DbResult<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            v.map(SqlValue::Int)
        } else if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            // BIGINT UNSIGNED beyond i64::MAX cannot be represented.
            match v.map(i64::try_from).transpose() {
                Ok(v) => v.map(SqlValue::Int),
                Err(_) => return Err(unsupported(column)),
            }
        } else if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            v.map(SqlValue::Text)
        } else {
            return Err(unsupported(column));
        };
        decoded.push(column.name(), value.unwrap_or(SqlValue::Null));
    }
    Ok(decoded)
}

fn decode_sqlite_row(row: &SqliteRow) -> DbResult<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            v.map(SqlValue::Int)
        } else if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            v.map(SqlValue::Text)
        } else {
            return Err(unsupported(column));
        };
        decoded.push(column.name(), value.unwrap_or(SqlValue::Null));
    }
    Ok(decoded)
}

fn unsupported<C: Column>(column: &C) -> DbError {
    DbError::UnsupportedColumn {
        column: column.name().to_string(),
        type_name: column.type_info().name().to_string(),
    }
}
