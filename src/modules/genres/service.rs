use bookshelf_db::Database;
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{Genre, GenreName, GenreSort};
use super::repository::GenreRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::query::{ListQuery, Page};

const RESOURCE: &str = "genre";

/// Genre use cases; every write runs in one transaction.
#[derive(Clone)]
pub struct GenreService {
    db: Database,
}

impl GenreService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: GenreName) -> CatalogResult<Genre> {
        let mut tx = self.db.begin().await?;

        if GenreRepository::find_by_name(&mut tx, name.as_str())
            .await?
            .is_some()
        {
            return Err(name_taken(name.as_str()));
        }

        let now = OffsetDateTime::now_utc();
        let genre = Genre {
            id: Uuid::now_v7(),
            name: name.into_inner(),
            created_at: now,
            updated_at: now,
        };
        GenreRepository::insert(&mut tx, &genre)
            .await
            .map_err(|err| unique_to_conflict(err, &genre.name))?;
        tx.commit().await?;

        tracing::info!(genre_id = %genre.id, name = %genre.name, "genre created");
        Ok(genre)
    }

    pub async fn get(&self, id: Uuid) -> CatalogResult<Genre> {
        let mut conn = self.db.acquire().await?;
        GenreRepository::find(&mut conn, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(RESOURCE, id))
    }

    pub async fn list(&self, query: &ListQuery<GenreSort>) -> CatalogResult<Page<Genre>> {
        let mut conn = self.db.acquire().await?;
        let (items, total) = GenreRepository::list(&mut conn, query).await?;
        Ok(Page::new(items, total, query.page))
    }

    /// `None` leaves the genre as it is.
    pub async fn update(&self, id: Uuid, name: Option<GenreName>) -> CatalogResult<Genre> {
        let mut tx = self.db.begin().await?;

        let mut genre = GenreRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(RESOURCE, id))?;

        let Some(name) = name else {
            return Ok(genre);
        };
        if name.as_str() == genre.name {
            return Ok(genre);
        }

        if let Some(other) = GenreRepository::find_by_name(&mut tx, name.as_str()).await? {
            if other.id != id {
                return Err(name_taken(name.as_str()));
            }
        }

        genre.name = name.into_inner();
        genre.updated_at = OffsetDateTime::now_utc();
        GenreRepository::update(&mut tx, &genre)
            .await
            .map_err(|err| unique_to_conflict(err, &genre.name))?;
        tx.commit().await?;

        tracing::info!(genre_id = %genre.id, name = %genre.name, "genre renamed");
        Ok(genre)
    }

    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        let mut tx = self.db.begin().await?;
        if !GenreRepository::delete(&mut tx, id).await? {
            return Err(CatalogError::not_found(RESOURCE, id));
        }
        tx.commit().await?;

        tracing::info!(genre_id = %id, "genre deleted");
        Ok(())
    }
}

pub(crate) fn name_taken(name: &str) -> CatalogError {
    CatalogError::Conflict {
        field: "name",
        message: format!("genre '{}' already exists", name),
    }
}

/// A concurrent writer can claim the name between our check and our write.
fn unique_to_conflict(err: sqlx::Error, name: &str) -> CatalogError {
    if bookshelf_db::is_unique_violation(&err) {
        name_taken(name)
    } else {
        err.into()
    }
}
