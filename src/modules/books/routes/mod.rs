use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use bookshelf_http::error::AppError;

use super::models::{Book, BookInput, InsertResult, WriteResult};
use super::store::BookStore;

/// Book routes, mounted under `/api/books`.
pub fn router(store: BookStore) -> Router {
    Router::new()
        .route("/", get(list_books))
        .route("/insertItem", post(insert_book))
        .route("/updateItem/{id}", put(update_book))
        .route("/deleteItem/{id}", delete(delete_book))
        .route("/health", get(health_check))
        .with_state(store)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(store): State<BookStore>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(store.list_all().await?))
}

async fn insert_book(
    State(store): State<BookStore>,
    input: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<InsertResult>), AppError> {
    let Json(input) = input?;
    let result = store.create(&input.title, &input.author).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn update_book(
    State(store): State<BookStore>,
    id: Result<Path<i64>, PathRejection>,
    input: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<WriteResult>, AppError> {
    let Path(id) = id?;
    let Json(input) = input?;
    Ok(Json(store.update(id, &input.title, &input.author).await?))
}

async fn delete_book(
    State(store): State<BookStore>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<WriteResult>, AppError> {
    let Path(id) = id?;
    Ok(Json(store.delete(id).await?))
}
