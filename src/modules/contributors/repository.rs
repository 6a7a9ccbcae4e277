use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::{fmt::Hyphenated, Uuid};

use super::models::{Contributor, ContributorSort};
use crate::query::{self, fold_search, ListQuery};

pub const TABLE: &str = "contributors";
const COLUMNS: &str = "id, name, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ContributorRow {
    id: Hyphenated,
    name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ContributorRow> for Contributor {
    fn from(row: ContributorRow) -> Self {
        Self {
            id: row.id.into_uuid(),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct ContributorRepository;

impl ContributorRepository {
    pub async fn insert(
        conn: &mut SqliteConnection,
        contributor: &Contributor,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO contributors (id, name, search_text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(contributor.id.hyphenated())
        .bind(&contributor.name)
        .bind(fold_search(&contributor.name))
        .bind(contributor.created_at)
        .bind(contributor.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> Result<Option<Contributor>, sqlx::Error> {
        let row = sqlx::query_as::<_, ContributorRow>(&format!(
            "SELECT {} FROM contributors WHERE id = ?",
            COLUMNS
        ))
        .bind(id.hyphenated())
        .fetch_optional(conn)
        .await?;
        Ok(row.map(Contributor::from))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        contributor: &Contributor,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE contributors SET name = ?, search_text = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&contributor.name)
        .bind(fold_search(&contributor.name))
        .bind(contributor.updated_at)
        .bind(contributor.id.hyphenated())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contributors WHERE id = ?")
            .bind(id.hyphenated())
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery<ContributorSort>,
    ) -> Result<(Vec<Contributor>, i64), sqlx::Error> {
        let (rows, total) =
            query::fetch_page::<_, ContributorRow>(conn, TABLE, COLUMNS, query).await?;
        Ok((rows.into_iter().map(Contributor::from).collect(), total))
    }

    pub async fn missing(conn: &mut SqliteConnection, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        query::missing_ids(conn, TABLE, ids).await
    }
}
