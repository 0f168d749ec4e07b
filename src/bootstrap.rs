//! Process wiring: pool, module registry, HTTP server.

use std::sync::Arc;

use anyhow::Context;
use bookshelf_db::{DbPool, StatementExecutor};
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, books::BookStore};

/// Connect the pool configured in `settings`.
pub async fn connect_pool(settings: &Settings) -> anyhow::Result<DbPool> {
    DbPool::connect(&settings.database)
        .await
        .with_context(|| "failed to create database connection pool")
}

/// Record store over a freshly connected pool, for one-shot callers.
pub async fn connect_store(settings: &Settings) -> anyhow::Result<(BookStore, DbPool)> {
    let pool = connect_pool(settings).await?;
    let executor: Arc<dyn StatementExecutor> = Arc::new(pool.clone());
    Ok((BookStore::new(executor), pool))
}

/// Core `db` module plus every feature module, all sharing `pool`.
pub fn build_registry(pool: DbPool) -> ModuleRegistry {
    let executor: Arc<dyn StatementExecutor> = Arc::new(pool.clone());

    let mut registry = ModuleRegistry::new();
    registry.register_core(bookshelf_db::create_module(pool));
    modules::register_all(&mut registry, executor);
    registry
}

/// Run the HTTP service until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let pool = connect_pool(&settings).await?;
    let registry = build_registry(pool);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.boot(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;

    registry.shutdown().await?;
    tracing::info!("bookshelf shutdown complete");
    served
}
