use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization and startup.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Core module trait implemented by every folio module.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module.
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context.
    /// Called during application startup, before the HTTP server binds.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes.
    /// Paths are absolute; module routers are merged into the root router.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return an OpenAPI specification fragment for this module as JSON.
    /// Will be merged with other modules' fragments.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Start background work for this module, after all modules initialized.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Stop the module and clean up resources during shutdown.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
