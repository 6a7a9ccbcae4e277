use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::{fmt::Hyphenated, Uuid};

use super::models::{Genre, GenreSort};
use crate::query::{self, fold_search, ListQuery};

pub const TABLE: &str = "genres";
const COLUMNS: &str = "id, name, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct GenreRow {
    id: Hyphenated,
    name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<GenreRow> for Genre {
    fn from(row: GenreRow) -> Self {
        Self {
            id: row.id.into_uuid(),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Persistence for the `genres` table
pub struct GenreRepository;

impl GenreRepository {
    pub async fn insert(conn: &mut SqliteConnection, genre: &Genre) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO genres (id, name, search_text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(genre.id.hyphenated())
        .bind(&genre.name)
        .bind(fold_search(&genre.name))
        .bind(genre.created_at)
        .bind(genre.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Genre>, sqlx::Error> {
        let row = sqlx::query_as::<_, GenreRow>(&format!(
            "SELECT {} FROM genres WHERE id = ?",
            COLUMNS
        ))
        .bind(id.hyphenated())
        .fetch_optional(conn)
        .await?;
        Ok(row.map(Genre::from))
    }

    pub async fn find_by_name(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<Genre>, sqlx::Error> {
        let row = sqlx::query_as::<_, GenreRow>(&format!(
            "SELECT {} FROM genres WHERE name = ?",
            COLUMNS
        ))
        .bind(name)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(Genre::from))
    }

    /// Returns `false` when no row has `genre.id`.
    pub async fn update(conn: &mut SqliteConnection, genre: &Genre) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE genres
            SET name = ?, search_text = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&genre.name)
        .bind(fold_search(&genre.name))
        .bind(genre.updated_at)
        .bind(genre.id.hyphenated())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a genre to a new id; book links follow through `ON UPDATE CASCADE`.
    pub async fn change_id(
        conn: &mut SqliteConnection,
        from: Uuid,
        to: Uuid,
        updated_at: OffsetDateTime,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE genres SET id = ?, updated_at = ? WHERE id = ?")
            .bind(to.hyphenated())
            .bind(updated_at)
            .bind(from.hyphenated())
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` when nothing was deleted. Book links cascade.
    pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM genres WHERE id = ?")
            .bind(id.hyphenated())
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery<GenreSort>,
    ) -> Result<(Vec<Genre>, i64), sqlx::Error> {
        let (rows, total) = query::fetch_page::<_, GenreRow>(conn, TABLE, COLUMNS, query).await?;
        Ok((rows.into_iter().map(Genre::from).collect(), total))
    }

    /// Ids among `ids` without a genre row.
    pub async fn missing(conn: &mut SqliteConnection, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        query::missing_ids(conn, TABLE, ids).await
    }
}
