//! Bookshelf catalog service.
//!
//! Books, genres and contributors are each a kernel [`Module`] contributing
//! routes, OpenAPI paths and migrations. This crate wires them together; the
//! binaries in `src/main.rs` and `crates/cli` only load settings and call in.
//!
//! [`Module`]: bookshelf_kernel::Module

pub mod error;
pub mod import;
pub mod modules;
pub mod query;
pub mod validation;

use anyhow::Context;
use bookshelf_db::Database;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use error::{CatalogError, CatalogResult, FieldError};
pub use import::{import_genres, ImportSummary};

/// A registry holding every catalog module in dependency order.
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Apply every pending module migration. Returns how many ran.
pub async fn migrate(db: &Database, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    db.migrate(&registry.collect_migrations())
        .await
        .context("failed to apply migrations")
}

/// Connect, migrate and serve HTTP until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let db = Database::connect(&settings.database)
        .await
        .context("failed to open database")?;
    let registry = registry();

    let applied = migrate(&db, &registry).await?;
    tracing::info!(applied, "migrations up to date");

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &ctx).await;

    registry.stop_modules().await?;
    db.close().await;
    served
}
