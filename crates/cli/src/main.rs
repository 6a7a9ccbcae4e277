use std::path::PathBuf;

use anyhow::Context;
use bookshelf_db::Database;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// bookshelf - book catalog service
#[derive(Parser, Debug)]
#[command(
    name = "bookshelf",
    version,
    about = "Book catalog service: HTTP API, migrations and data import"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply migrations and serve the HTTP API
    Serve,

    /// Apply pending migrations and exit
    Migrate,

    /// Import genres from a .csv (header `id,name`) or .json file
    ImportGenres {
        /// Path to the source file
        path: PathBuf,

        /// Records committed per transaction
        #[arg(long, default_value_t = bookshelf_app::import::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => bookshelf_app::serve(settings).await,
        Command::Migrate => migrate(&settings).await,
        Command::ImportGenres { path, batch_size } => {
            import_genres(&settings, path, batch_size).await
        }
    }
}

async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let db = Database::connect(&settings.database).await?;
    let applied = bookshelf_app::migrate(&db, &bookshelf_app::registry()).await?;
    db.close().await;

    tracing::info!(applied, "migrations complete");
    Ok(())
}

async fn import_genres(settings: &Settings, path: PathBuf, batch_size: usize) -> anyhow::Result<()> {
    anyhow::ensure!(path.is_file(), "file not found: {}", path.display());
    anyhow::ensure!(batch_size > 0, "--batch-size must be at least 1");
    tracing::info!(file = %path.display(), batch_size, "importing genres");

    let db = Database::connect(&settings.database).await?;
    bookshelf_app::migrate(&db, &bookshelf_app::registry()).await?;

    let summary = bookshelf_app::import_genres(&db, &path, batch_size).await;
    db.close().await;
    let summary = summary?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
