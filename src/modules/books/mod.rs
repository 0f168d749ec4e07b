pub mod error;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

pub use error::{DataAccessError, StoreOperation};
pub use store::BookStore;

/// Book catalog: CRUD over the `book` table
pub struct BooksModule {
    store: BookStore,
}

impl BooksModule {
    pub fn new(store: BookStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    /// Browser clients call `/`, `/insertItem`, ... on the server root.
    fn mount_at_root(&self) -> bool {
        true
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn error_response() -> serde_json::Value {
    json_response(
        "Data access error",
        json!({ "$ref": "#/components/schemas/ErrorResponse" }),
    )
}

fn id_parameter() -> serde_json::Value {
    json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    }])
}

fn book_input_body() -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let write_result = json!({ "$ref": "#/components/schemas/WriteResult" });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response(
                            "Every book, in storage order",
                            json!({ "type": "array", "items": { "$ref": "#/components/schemas/Book" } }),
                        ),
                        "500": error_response()
                    }
                }
            },
            "/insertItem": {
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_input_body(),
                    "responses": {
                        "201": json_response(
                            "Insert result",
                            json!({ "$ref": "#/components/schemas/InsertResult" }),
                        ),
                        "500": error_response()
                    }
                }
            },
            "/updateItem/{id}": {
                "put": {
                    "summary": "Replace title and author of a book",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "requestBody": book_input_body(),
                    "responses": {
                        "200": json_response("Rows changed (0 when the id is unknown)", write_result.clone()),
                        "500": error_response()
                    }
                }
            },
            "/deleteItem/{id}": {
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "responses": {
                        "200": json_response("Rows removed (0 when the id is unknown)", write_result),
                        "500": error_response()
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": ["string", "null"] },
                        "author": { "type": ["string", "null"] }
                    },
                    "required": ["id", "title", "author"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" }
                    },
                    "required": ["title", "author"]
                },
                "InsertResult": {
                    "type": "object",
                    "properties": {
                        "insertId": { "type": "integer", "format": "int64" },
                        "affectedRows": { "type": "integer", "format": "int64" }
                    },
                    "required": ["insertId", "affectedRows"]
                },
                "WriteResult": {
                    "type": "object",
                    "properties": {
                        "affectedRows": { "type": "integer", "format": "int64" }
                    },
                    "required": ["affectedRows"]
                }
            }
        }
    })
}

/// Create the books module around an injected store
pub fn create_module(store: BookStore) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn openapi_fragment_documents_every_route() {
        let module = BooksModule::new(store::tests::sqlite_store().await);
        let doc = module.openapi().unwrap();

        for path in ["/", "/insertItem", "/updateItem/{id}", "/deleteItem/{id}", "/health"] {
            assert!(doc["paths"].get(path).is_some(), "missing {path}");
        }
        assert!(doc["components"]["schemas"]["InsertResult"].is_object());
        assert_eq!(module.name(), "books");
    }
}
