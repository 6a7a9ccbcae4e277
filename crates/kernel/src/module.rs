use async_trait::async_trait;
use axum::Router;
use bookshelf_db::Database;

pub use bookshelf_db::Migration;

/// Shared handles a module sees while it starts up and builds its routes.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    pub db: &'a Database,
}

/// One catalog resource: its routes, its tables and its share of the API document.
///
/// The registry drives the lifecycle: `migrations` first, then `init`, `routes`
/// and `start` in registration order, and `stop` in reverse on shutdown.
#[async_trait]
pub trait Module: Sync + Send {
    /// Stable identifier, also used to tag applied migrations.
    fn name(&self) -> &'static str;

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes relative to the API prefix, e.g. `/books/{id}`.
    fn routes(&self, _ctx: &InitCtx<'_>) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with unprefixed `paths` and `components.schemas`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Schema changes, applied in the order returned.
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
