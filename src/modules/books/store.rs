//! Record store for the `book` table.
//!
//! Every operation is one fixed statement; caller data only ever travels as
//! bound parameters.

use std::sync::Arc;

use bookshelf_db::{DbError, Row, SqlValue, StatementExecutor};

use super::error::{DataAccessError, StoreOperation};
use super::models::{Book, InsertResult, WriteResult};

// No ORDER BY: rows come back in whatever order the engine returns them.
const LIST_ALL_SQL: &str = "SELECT id, title, author FROM book";
const INSERT_SQL: &str = "INSERT INTO book (title, author) VALUES (?, ?)";
const UPDATE_SQL: &str = "UPDATE book SET title = ?, author = ? WHERE id = ?";
const DELETE_SQL: &str = "DELETE FROM book WHERE id = ?";

/// CRUD over the `book` table through an injected executor.
#[derive(Clone)]
pub struct BookStore {
    executor: Arc<dyn StatementExecutor>,
}

impl BookStore {
    pub fn new(executor: Arc<dyn StatementExecutor>) -> Self {
        Self { executor }
    }

    pub async fn list_all(&self) -> Result<Vec<Book>, DataAccessError> {
        let fail = |e| DataAccessError::new(StoreOperation::List, e);

        let rows = self.executor.fetch_all(LIST_ALL_SQL, &[]).await.map_err(fail)?;
        rows.iter()
            .map(book_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(fail)
    }

    pub async fn create(&self, title: &str, author: &str) -> Result<InsertResult, DataAccessError> {
        let outcome = self
            .executor
            .execute(INSERT_SQL, &[title.into(), author.into()])
            .await
            .map_err(|e| DataAccessError::new(StoreOperation::Create, e))?;

        tracing::info!(book_id = outcome.last_insert_id, "book inserted");

        Ok(InsertResult {
            insert_id: outcome.last_insert_id,
            affected_rows: outcome.rows_affected,
        })
    }

    /// Replace title and author of book `id`. A missing id is not an error.
    pub async fn update(
        &self,
        id: i64,
        title: &str,
        author: &str,
    ) -> Result<WriteResult, DataAccessError> {
        let outcome = self
            .executor
            .execute(UPDATE_SQL, &[title.into(), author.into(), SqlValue::Int(id)])
            .await
            .map_err(|e| DataAccessError::new(StoreOperation::Update, e))?;

        tracing::info!(book_id = id, affected_rows = outcome.rows_affected, "book updated");

        Ok(WriteResult {
            affected_rows: outcome.rows_affected,
        })
    }

    /// Delete book `id`. A missing id is not an error.
    pub async fn delete(&self, id: i64) -> Result<WriteResult, DataAccessError> {
        let outcome = self
            .executor
            .execute(DELETE_SQL, &[SqlValue::Int(id)])
            .await
            .map_err(|e| DataAccessError::new(StoreOperation::Delete, e))?;

        tracing::info!(book_id = id, affected_rows = outcome.rows_affected, "book deleted");

        Ok(WriteResult {
            affected_rows: outcome.rows_affected,
        })
    }
}

fn book_from_row(row: &Row) -> Result<Book, DbError> {
    Ok(Book {
        id: row.get_i64("id")?,
        title: row.get_text("title")?,
        author: row.get_text("author")?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use bookshelf_db::{DbPool, DbResult, ExecOutcome, SqlxError};
    use bookshelf_kernel::settings::DatabaseSettings;
    use std::sync::Mutex;

    const CREATE_TABLE_SQL: &str =
        "CREATE TABLE book (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, author TEXT)";

    /// Store over a fresh in-memory SQLite `book` table.
    pub(crate) async fn sqlite_store() -> BookStore {
        let settings = DatabaseSettings {
            url: Some("sqlite::memory:".to_string()),
            ..DatabaseSettings::default()
        };
        let pool = DbPool::connect(&settings).await.unwrap();
        pool.execute(CREATE_TABLE_SQL, &[]).await.unwrap();
        BookStore::new(Arc::new(pool))
    }

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<(String, Vec<SqlValue>)>>,
        rows: Vec<Row>,
        outcome: ExecOutcome,
    }

    impl RecordingExecutor {
        fn calls(&self) -> Vec<(String, Vec<SqlValue>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatementExecutor for RecordingExecutor {
        async fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            Ok(self.rows.clone())
        }

        async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<ExecOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            Ok(self.outcome)
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl StatementExecutor for FailingExecutor {
        async fn fetch_all(&self, _sql: &str, _params: &[SqlValue]) -> DbResult<Vec<Row>> {
            Err(DbError::Execution(sqlx_pool_timeout()))
        }

        async fn execute(&self, _sql: &str, _params: &[SqlValue]) -> DbResult<ExecOutcome> {
            Err(DbError::Execution(sqlx_pool_timeout()))
        }
    }

    fn sqlx_pool_timeout() -> SqlxError {
        SqlxError::PoolTimedOut
    }

    #[tokio::test]
    async fn statements_are_fixed_and_parameters_out_of_band() {
        let executor = Arc::new(RecordingExecutor {
            outcome: ExecOutcome {
                rows_affected: 1,
                last_insert_id: 9,
            },
            ..RecordingExecutor::default()
        });
        let store = BookStore::new(executor.clone());
        let title = "x'); DROP TABLE book; --";

        store.list_all().await.unwrap();
        let inserted = store.create(title, "Herbert").await.unwrap();
        store.update(9, "Dune Messiah", "Herbert").await.unwrap();
        store.delete(9).await.unwrap();

        assert_eq!(
            inserted,
            InsertResult {
                insert_id: 9,
                affected_rows: 1
            }
        );
        assert_eq!(
            executor.calls(),
            vec![
                (LIST_ALL_SQL.to_string(), vec![]),
                (
                    INSERT_SQL.to_string(),
                    vec![SqlValue::from(title), SqlValue::from("Herbert")]
                ),
                (
                    UPDATE_SQL.to_string(),
                    vec![
                        SqlValue::from("Dune Messiah"),
                        SqlValue::from("Herbert"),
                        SqlValue::Int(9)
                    ]
                ),
                (DELETE_SQL.to_string(), vec![SqlValue::Int(9)]),
            ]
        );
    }

    #[tokio::test]
    async fn list_all_maps_rows_to_books() {
        let executor = Arc::new(RecordingExecutor {
            rows: vec![Row::new()
                .with("id", 1_i64)
                .with("title", "Dune")
                .with("author", "Herbert")],
            ..RecordingExecutor::default()
        });
        let store = BookStore::new(executor);

        let books = store.list_all().await.unwrap();
        assert_eq!(
            books,
            vec![Book {
                id: 1,
                title: Some("Dune".to_string()),
                author: Some("Herbert".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn malformed_rows_are_data_access_errors() {
        let executor = Arc::new(RecordingExecutor {
            rows: vec![Row::new().with("id", "one").with("title", "Dune")],
            ..RecordingExecutor::default()
        });
        let store = BookStore::new(executor);

        let err = store.list_all().await.unwrap_err();
        assert_eq!(err.operation(), StoreOperation::List);
        assert!(err.to_string().starts_with("failed to list books: "));
    }

    #[tokio::test]
    async fn execution_failures_name_the_operation() {
        let store = BookStore::new(Arc::new(FailingExecutor));

        let list = store.list_all().await.unwrap_err();
        let create = store.create("Dune", "Herbert").await.unwrap_err();
        let update = store.update(1, "Dune", "Herbert").await.unwrap_err();
        let delete = store.delete(1).await.unwrap_err();

        assert_eq!(list.operation(), StoreOperation::List);
        assert_eq!(create.operation(), StoreOperation::Create);
        assert_eq!(update.operation(), StoreOperation::Update);
        assert_eq!(delete.operation(), StoreOperation::Delete);
        assert!(create.to_string().starts_with("failed to insert book: "));
        assert!(update.to_string().starts_with("failed to update book: "));
        assert!(delete.to_string().starts_with("failed to delete book: "));
        assert!(std::error::Error::source(&delete).is_some());
    }

    #[tokio::test]
    async fn create_update_delete_lifecycle() {
        let store = sqlite_store().await;

        let created = store.create("Dune", "Herbert").await.unwrap();
        assert_eq!(
            created,
            InsertResult {
                insert_id: 1,
                affected_rows: 1
            }
        );
        assert_eq!(
            store.list_all().await.unwrap(),
            vec![Book {
                id: 1,
                title: Some("Dune".to_string()),
                author: Some("Herbert".to_string()),
            }]
        );

        let updated = store.update(1, "Dune Messiah", "Herbert").await.unwrap();
        assert_eq!(updated.affected_rows, 1);
        let books = store.list_all().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, 1);
        assert_eq!(books[0].title.as_deref(), Some("Dune Messiah"));

        let deleted = store.delete(1).await.unwrap();
        assert_eq!(deleted.affected_rows, 1);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_adds_exactly_one_record_with_fresh_id() {
        let store = sqlite_store().await;
        store.create("Emma", "Austen").await.unwrap();
        let before = store.list_all().await.unwrap();

        let created = store.create("Emma", "Austen").await.unwrap();
        let after = store.list_all().await.unwrap();

        assert_eq!(after.len(), before.len() + 1);
        let new_id = created.insert_id as i64;
        assert!(before.iter().all(|book| book.id != new_id));
        let added: Vec<_> = after.iter().filter(|book| book.id == new_id).collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].title.as_deref(), Some("Emma"));
        assert_eq!(added[0].author.as_deref(), Some("Austen"));
    }

    #[tokio::test]
    async fn missing_ids_affect_zero_rows() {
        let store = sqlite_store().await;
        store.create("Dune", "Herbert").await.unwrap();

        let updated = store.update(42, "Ghost", "Nobody").await.unwrap();
        let deleted = store.delete(42).await.unwrap();

        assert_eq!(updated.affected_rows, 0);
        assert_eq!(deleted.affected_rows, 0);
        let books = store.list_all().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title.as_deref(), Some("Dune"));
    }

    #[tokio::test]
    async fn deleted_id_never_returns() {
        let store = sqlite_store().await;
        let first = store.create("Dune", "Herbert").await.unwrap();
        store.create("Emma", "Austen").await.unwrap();

        store.delete(first.insert_id as i64).await.unwrap();

        let books = store.list_all().await.unwrap();
        assert_eq!(books.len(), 1);
        assert!(books.iter().all(|book| book.id != first.insert_id as i64));
    }

    #[tokio::test]
    async fn injection_attempt_is_stored_literally() {
        let store = sqlite_store().await;
        let title = "x'); DROP TABLE book; --";

        let created = store.create(title, "Mallory").await.unwrap();
        assert_eq!(created.affected_rows, 1);

        // Table still exists and holds the literal text.
        let books = store.list_all().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title.as_deref(), Some(title));
        store.create("Dune", "Herbert").await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn null_columns_list_as_none() {
        let settings = DatabaseSettings {
            url: Some("sqlite::memory:".to_string()),
            ..DatabaseSettings::default()
        };
        let pool = DbPool::connect(&settings).await.unwrap();
        pool.execute(CREATE_TABLE_SQL, &[]).await.unwrap();
        pool.execute(
            "INSERT INTO book (title, author) VALUES (?, ?)",
            &[SqlValue::from("Anonymous Verses"), SqlValue::Null],
        )
        .await
        .unwrap();
        let store = BookStore::new(Arc::new(pool));

        let books = store.list_all().await.unwrap();

        assert_eq!(books[0].title.as_deref(), Some("Anonymous Verses"));
        assert_eq!(books[0].author, None);
        assert_eq!(
            serde_json::to_value(&books[0]).unwrap(),
            serde_json::json!({"id": 1, "title": "Anonymous Verses", "author": null})
        );
    }

    #[tokio::test]
    async fn missing_table_is_a_data_access_error() {
        let settings = DatabaseSettings {
            url: Some("sqlite::memory:".to_string()),
            ..DatabaseSettings::default()
        };
        let pool = DbPool::connect(&settings).await.unwrap();
        let store = BookStore::new(Arc::new(pool));

        let err = store.list_all().await.unwrap_err();
        assert!(err.to_string().contains("failed to list books"));
        assert!(err.to_string().contains("no such table"));
    }
}
