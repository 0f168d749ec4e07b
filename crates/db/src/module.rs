use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_kernel::{InitCtx, Module};

use crate::pool::DbPool;

/// Core module that owns the process-wide pool and closes it on shutdown.
pub struct DbModule {
    pool: DbPool,
}

impl DbModule {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Module for DbModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            backend = self.pool.backend(),
            db = %ctx.settings.database.redacted_target(),
            open_connections = self.pool.size(),
            "database module initialized"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Create the core database module around an already connected pool
pub fn create_module(pool: DbPool) -> Arc<dyn Module> {
    Arc::new(DbModule::new(pool))
}
