use anyhow::Context;
use sqlx::SqlitePool;
use time::OffsetDateTime;

/// A schema change contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

const BOOKKEEPING: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL,
        PRIMARY KEY (module, id)
    );
"#;

/// Each migration runs in its own transaction together with its bookkeeping row.
pub(crate) async fn apply(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::raw_sql(BOOKKEEPING)
        .execute(pool)
        .await
        .context("failed to create migration bookkeeping table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        // checked under the writer lock so two processes never apply the same script
        let mut tx = crate::begin_immediate(pool).await?;
        let recorded: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM _migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(&mut *tx)
                .await
                .context("failed to read migration bookkeeping")?;
        if recorded.is_some() {
            continue;
        }

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO _migrations (module, id, applied_at) VALUES (?, ?, ?)")
            .bind(module)
            .bind(migration.id)
            .bind(OffsetDateTime::now_utc())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(
            target: "bookshelf-db",
            module = %module,
            migration = migration.id,
            "applied migration"
        );
        applied += 1;
    }

    Ok(applied)
}
