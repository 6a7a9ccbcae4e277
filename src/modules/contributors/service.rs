use bookshelf_db::Database;
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{Contributor, ContributorName, ContributorSort};
use super::repository::ContributorRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::query::{ListQuery, Page};

const RESOURCE: &str = "contributor";

#[derive(Clone)]
pub struct ContributorService {
    db: Database,
}

impl ContributorService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: ContributorName) -> CatalogResult<Contributor> {
        let now = OffsetDateTime::now_utc();
        let contributor = Contributor {
            id: Uuid::now_v7(),
            name: name.into_inner(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        ContributorRepository::insert(&mut tx, &contributor).await?;
        tx.commit().await?;

        tracing::info!(contributor_id = %contributor.id, "contributor created");
        Ok(contributor)
    }

    pub async fn get(&self, id: Uuid) -> CatalogResult<Contributor> {
        let mut conn = self.db.acquire().await?;
        ContributorRepository::find(&mut conn, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(RESOURCE, id))
    }

    pub async fn list(&self, query: &ListQuery<ContributorSort>) -> CatalogResult<Page<Contributor>> {
        let mut conn = self.db.acquire().await?;
        let (items, total) = ContributorRepository::list(&mut conn, query).await?;
        Ok(Page::new(items, total, query.page))
    }

    pub async fn update(&self, id: Uuid, name: Option<ContributorName>) -> CatalogResult<Contributor> {
        let mut tx = self.db.begin().await?;

        let mut contributor = ContributorRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(RESOURCE, id))?;

        let Some(name) = name else {
            return Ok(contributor);
        };

        contributor.name = name.into_inner();
        contributor.updated_at = OffsetDateTime::now_utc();
        ContributorRepository::update(&mut tx, &contributor).await?;
        tx.commit().await?;

        tracing::info!(contributor_id = %id, "contributor renamed");
        Ok(contributor)
    }

    /// Book links cascade; the books stay.
    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        let mut tx = self.db.begin().await?;
        if !ContributorRepository::delete(&mut tx, id).await? {
            return Err(CatalogError::not_found(RESOURCE, id));
        }
        tx.commit().await?;

        tracing::info!(contributor_id = %id, "contributor deleted");
        Ok(())
    }
}
