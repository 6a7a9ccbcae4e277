//! Bulk genre import from CSV or JSON files.
//!
//! Records are validated up front; invalid ones are counted and skipped.
//! Valid records are upserted in batches, one transaction per batch. Inside a
//! batch a failing record is counted and the rest carry on; a batch whose
//! commit fails is counted as errors in full.

use std::path::Path;

use anyhow::Context;
use bookshelf_db::Database;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::modules::genres::models::{Genre, GenreName};
use crate::modules::genres::repository::GenreRepository;

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub invalid: usize,
    pub errors: usize,
}

impl ImportSummary {
    fn absorb(&mut self, batch: ImportSummary) {
        self.created += batch.created;
        self.updated += batch.updated;
        self.invalid += batch.invalid;
        self.errors += batch.errors;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => anyhow::bail!(
                "unsupported file format for {}: expected .csv or .json",
                path.display()
            ),
        }
    }
}

/// A record as it appears in the source file, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawGenre {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub id: Uuid,
    pub name: GenreName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upserted {
    Created,
    Updated,
}

/// Parse `content` into validated records plus the number of rejected ones.
pub fn parse_records(format: SourceFormat, content: &str) -> anyhow::Result<(Vec<ImportRecord>, usize)> {
    let raw: Vec<Option<RawGenre>> = match format {
        SourceFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::Headers)
                .from_reader(content.as_bytes());
            reader
                .deserialize::<RawGenre>()
                .enumerate()
                .map(|(idx, row)| {
                    row.map_err(|err| {
                        tracing::warn!(record = idx + 1, error = %err, "unreadable csv record")
                    })
                    .ok()
                })
                .collect()
        }
        SourceFormat::Json => {
            let values: Vec<serde_json::Value> =
                serde_json::from_str(content).context("expected a JSON array of genres")?;
            values
                .into_iter()
                .enumerate()
                .map(|(idx, value)| {
                    serde_json::from_value::<RawGenre>(value)
                        .map_err(|err| {
                            tracing::warn!(record = idx + 1, error = %err, "malformed json record")
                        })
                        .ok()
                })
                .collect()
        }
    };

    let mut records = Vec::with_capacity(raw.len());
    let mut invalid = 0;
    for (idx, raw) in raw.into_iter().enumerate() {
        match raw.map(|raw| validate(idx + 1, &raw)) {
            Some(Some(record)) => records.push(record),
            _ => invalid += 1,
        }
    }

    Ok((records, invalid))
}

fn validate(position: usize, raw: &RawGenre) -> Option<ImportRecord> {
    let id = match Uuid::parse_str(raw.id.trim()) {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!(record = position, id = %raw.id, error = %err, "invalid genre id");
            return None;
        }
    };
    match GenreName::parse(&raw.name) {
        Ok(name) => Some(ImportRecord { id, name }),
        Err(err) => {
            tracing::warn!(record = position, %id, error = %err, "invalid genre name");
            None
        }
    }
}

/// Import genres from `path`, committing every `batch_size` records.
pub async fn import_genres(
    db: &Database,
    path: &Path,
    batch_size: usize,
) -> anyhow::Result<ImportSummary> {
    anyhow::ensure!(batch_size > 0, "batch size must be at least 1");

    let format = SourceFormat::from_path(path)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let (records, invalid) = parse_records(format, &content)?;
    tracing::info!(
        file = %path.display(),
        valid = records.len(),
        invalid,
        "genre records read"
    );

    let mut summary = ImportSummary {
        invalid,
        ..ImportSummary::default()
    };

    let total = records.len();
    let mut processed = 0;
    for batch in records.chunks(batch_size) {
        summary.absorb(import_batch(db, batch).await);
        processed += batch.len();
        tracing::info!(processed, total, "genre batch processed");
    }

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        invalid = summary.invalid,
        errors = summary.errors,
        "genre import finished"
    );
    Ok(summary)
}

async fn import_batch(db: &Database, batch: &[ImportRecord]) -> ImportSummary {
    let failed = ImportSummary {
        errors: batch.len(),
        ..ImportSummary::default()
    };

    let mut tx = match db.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            tracing::error!(error = %err, "failed to open batch transaction");
            return failed;
        }
    };

    let mut summary = ImportSummary::default();
    for record in batch {
        match upsert(&mut tx, record).await {
            Ok(Upserted::Created) => summary.created += 1,
            Ok(Upserted::Updated) => summary.updated += 1,
            Err(err) => {
                summary.errors += 1;
                tracing::error!(id = %record.id, name = record.name.as_str(), error = %err, "failed to import genre");
            }
        }
    }

    match tx.commit().await {
        Ok(()) => summary,
        Err(err) => {
            tracing::error!(error = %err, records = batch.len(), "batch commit failed");
            failed
        }
    }
}

/// By id: rename. Else by name: take the imported id. Else: insert.
async fn upsert(conn: &mut SqliteConnection, record: &ImportRecord) -> Result<Upserted, sqlx::Error> {
    let now = OffsetDateTime::now_utc();

    if let Some(mut genre) = GenreRepository::find(conn, record.id).await? {
        if genre.name != record.name.as_str() {
            genre.name = record.name.as_str().to_string();
            genre.updated_at = now;
            GenreRepository::update(conn, &genre).await?;
        }
        tracing::debug!(id = %record.id, name = record.name.as_str(), "genre updated by id");
        return Ok(Upserted::Updated);
    }

    if let Some(genre) = GenreRepository::find_by_name(conn, record.name.as_str()).await? {
        GenreRepository::change_id(conn, genre.id, record.id, now).await?;
        tracing::debug!(from = %genre.id, to = %record.id, "genre re-keyed by name");
        return Ok(Upserted::Updated);
    }

    let genre = Genre {
        id: record.id,
        name: record.name.as_str().to_string(),
        created_at: now,
        updated_at: now,
    };
    GenreRepository::insert(conn, &genre).await?;
    tracing::debug!(id = %record.id, name = %genre.name, "genre created");
    Ok(Upserted::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::genres::GenreService;
    use bookshelf_db::DatabaseSettings;
    use std::io::Write;

    async fn database() -> Database {
        let db = Database::connect(&DatabaseSettings::in_memory())
            .await
            .unwrap();
        let mut registry = bookshelf_kernel::ModuleRegistry::new();
        crate::modules::register_all(&mut registry);
        db.migrate(&registry.collect_migrations()).await.unwrap();
        db
    }

    fn source(extension: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", extension))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("g.CSV")).unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_path(Path::new("g.json")).unwrap(), SourceFormat::Json);
        assert!(SourceFormat::from_path(Path::new("g.xml")).is_err());
        assert!(SourceFormat::from_path(Path::new("genres")).is_err());
    }

    #[test]
    fn invalid_records_are_counted_not_fatal() {
        let id = Uuid::new_v4();
        let content = format!(
            "id,name\n{id},  Поэзия \nnot-a-uuid,Проза\n{},\n",
            Uuid::new_v4()
        );
        let (records, invalid) = parse_records(SourceFormat::Csv, &content).unwrap();

        assert_eq!(invalid, 2);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].name.as_str(), "Поэзия");
    }

    #[test]
    fn json_records_may_be_partially_malformed() {
        let content = serde_json::json!([
            {"id": Uuid::new_v4(), "name": "Эпос"},
            {"id": 42, "name": "Число"},
            "just a string",
            {"name": "Без id"}
        ])
        .to_string();
        let (records, invalid) = parse_records(SourceFormat::Json, &content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(invalid, 3);

        assert!(parse_records(SourceFormat::Json, "{\"id\": 1}").is_err());
    }

    #[tokio::test]
    async fn upserts_by_id_then_by_name() {
        let db = database().await;
        let genres = GenreService::new(db.clone());
        let by_id = genres.create(GenreName::parse("Мистика").unwrap()).await.unwrap();
        let by_name = genres.create(GenreName::parse("Вестерн").unwrap()).await.unwrap();
        let new_id = Uuid::new_v4();
        let fresh_id = Uuid::new_v4();

        let file = source(
            "json",
            &serde_json::json!([
                {"id": by_id.id, "name": "Мистика и ужасы"},
                {"id": new_id, "name": "Вестерн"},
                {"id": fresh_id, "name": "Киберпанк"},
                {"id": "broken", "name": "Сломано"}
            ])
            .to_string(),
        );

        let summary = import_genres(&db, file.path(), 2).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                created: 1,
                updated: 2,
                invalid: 1,
                errors: 0
            }
        );

        assert_eq!(genres.get(by_id.id).await.unwrap().name, "Мистика и ужасы");
        assert!(genres.get(by_name.id).await.is_err());
        assert_eq!(genres.get(new_id).await.unwrap().name, "Вестерн");
        assert_eq!(genres.get(fresh_id).await.unwrap().name, "Киберпанк");
    }

    #[tokio::test]
    async fn conflicting_record_fails_alone() {
        let db = database().await;
        let genres = GenreService::new(db.clone());
        let taken = genres.create(GenreName::parse("Сатира").unwrap()).await.unwrap();
        let other = genres.create(GenreName::parse("Юмор").unwrap()).await.unwrap();
        let fresh_id = Uuid::new_v4();

        let file = source(
            "csv",
            &format!("id,name\n{},Сатира\n{},Пародия\n", other.id, fresh_id),
        );
        let summary = import_genres(&db, file.path(), DEFAULT_BATCH_SIZE).await.unwrap();

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(genres.get(other.id).await.unwrap().name, "Юмор");
        assert_eq!(genres.get(taken.id).await.unwrap().name, "Сатира");
        assert_eq!(genres.get(fresh_id).await.unwrap().name, "Пародия");
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let db = database().await;
        let file = source("csv", "id,name\n");
        assert!(import_genres(&db, file.path(), 0).await.is_err());
    }
}
