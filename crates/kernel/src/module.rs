use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Lifecycle contract implemented by every bookshelf module
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    /// Routes will be mounted under `/api/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Also serve `routes()` at the server root, alongside `/api/{module_name}`
    fn mount_at_root(&self) -> bool {
        false
    }

    /// OpenAPI fragment (`paths` and `components`) for this module's routes,
    /// merged into the server document with paths prefixed by the mount point
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Start background work, called once every module is initialized
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Release resources held by the module
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
