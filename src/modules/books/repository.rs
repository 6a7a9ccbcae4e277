use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::{fmt::Hyphenated, Uuid};

use super::models::{BookRecord, BookSort};
use crate::query::{self, fold_search, ListQuery};

pub const TABLE: &str = "books";
const COLUMNS: &str = "id, title, rating, description, published_year, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookRow {
    id: Hyphenated,
    title: String,
    rating: Option<f64>,
    description: Option<String>,
    published_year: Option<i32>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<BookRow> for BookRecord {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id.into_uuid(),
            title: row.title,
            rating: row.rating,
            description: row.description,
            published_year: row.published_year,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Title and description are both searchable.
fn search_text(record: &BookRecord) -> String {
    match &record.description {
        Some(description) => fold_search(&format!("{}\n{}", record.title, description)),
        None => fold_search(&record.title),
    }
}

/// Persistence for the scalar `books` columns. Links live in [`super::links`].
pub struct BookRepository;

impl BookRepository {
    pub async fn insert(conn: &mut SqliteConnection, book: &BookRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO books
                (id, title, rating, description, published_year, search_text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(book.id.hyphenated())
        .bind(&book.title)
        .bind(book.rating)
        .bind(&book.description)
        .bind(book.published_year)
        .bind(search_text(book))
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> Result<Option<BookRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {} FROM books WHERE id = ?",
            COLUMNS
        ))
        .bind(id.hyphenated())
        .fetch_optional(conn)
        .await?;
        Ok(row.map(BookRecord::from))
    }

    pub async fn update(conn: &mut SqliteConnection, book: &BookRecord) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = ?, rating = ?, description = ?, published_year = ?,
                search_text = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(book.rating)
        .bind(&book.description)
        .bind(book.published_year)
        .bind(search_text(book))
        .bind(book.updated_at)
        .bind(book.id.hyphenated())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Genre and contributor links cascade with the row.
    pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id.hyphenated())
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery<BookSort>,
    ) -> Result<(Vec<BookRecord>, i64), sqlx::Error> {
        let (rows, total) = query::fetch_page::<_, BookRow>(conn, TABLE, COLUMNS, query).await?;
        Ok((rows.into_iter().map(BookRecord::from).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, description: Option<&str>) -> BookRecord {
        let now = OffsetDateTime::now_utc();
        BookRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            rating: None,
            description: description.map(str::to_string),
            published_year: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn search_text_covers_title_and_description() {
        assert_eq!(search_text(&record("Дюна", None)), "дюна");
        assert_eq!(
            search_text(&record("Dune", Some("Пустынная ПЛАНЕТА"))),
            "dune\nпустынная планета"
        );
    }
}
