use bookshelf_db::Database;
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use super::links::{BookContributorLinks, BookGenreLinks};
use super::models::{Book, BookChanges, BookRecord, BookSort, ContributorLink, NewBook};
use super::repository::BookRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::modules::contributors::repository::ContributorRepository;
use crate::modules::genres::repository::GenreRepository;
use crate::query::{ListQuery, Page};
use crate::validation::dedup_preserving_order;

const RESOURCE: &str = "book";

/// Book use cases. A write either lands completely (row plus links) or not
/// at all.
#[derive(Clone)]
pub struct BookService {
    db: Database,
}

impl BookService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewBook) -> CatalogResult<Book> {
        let mut tx = self.db.begin().await?;

        ensure_genres_exist(&mut tx, &new.genre_ids).await?;
        ensure_contributors_exist(&mut tx, &new.contributors).await?;

        let now = OffsetDateTime::now_utc();
        let record = BookRecord {
            id: Uuid::now_v7(),
            title: new.title,
            rating: new.rating,
            description: new.description,
            published_year: new.published_year,
            created_at: now,
            updated_at: now,
        };
        BookRepository::insert(&mut tx, &record).await?;
        BookGenreLinks::replace(&mut tx, record.id, &new.genre_ids)
            .await
            .map_err(|err| link_failure(err, "genre", &new.genre_ids))?;
        BookContributorLinks::replace(&mut tx, record.id, &new.contributors)
            .await
            .map_err(|err| link_failure(err, "contributor", &contributor_ids(&new.contributors)))?;

        let book = load(&mut tx, record.id)
            .await?
            .ok_or_else(|| CatalogError::not_found(RESOURCE, record.id))?;
        tx.commit().await?;

        tracing::info!(
            book_id = %book.record.id,
            genres = book.genres.len(),
            contributors = book.contributors.len(),
            "book created"
        );
        Ok(book)
    }

    pub async fn get(&self, id: Uuid) -> CatalogResult<Book> {
        let mut conn = self.db.acquire().await?;
        load(&mut conn, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(RESOURCE, id))
    }

    pub async fn list(&self, query: &ListQuery<BookSort>) -> CatalogResult<Page<Book>> {
        let mut conn = self.db.acquire().await?;
        let (records, total) = BookRepository::list(&mut conn, query).await?;

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut genres = BookGenreLinks::for_books(&mut conn, &ids).await?;
        let mut contributors = BookContributorLinks::for_books(&mut conn, &ids).await?;

        let page = Page::new(records, total, query.page);
        Ok(page.map(|record| Book {
            genres: genres.remove(&record.id).unwrap_or_default(),
            contributors: contributors.remove(&record.id).unwrap_or_default(),
            record,
        }))
    }

    /// An empty change set returns the book untouched.
    pub async fn update(&self, id: Uuid, changes: BookChanges) -> CatalogResult<Book> {
        let mut tx = self.db.begin().await?;

        let mut record = BookRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(RESOURCE, id))?;

        if changes.is_empty() {
            return load(&mut tx, id)
                .await?
                .ok_or_else(|| CatalogError::not_found(RESOURCE, id));
        }

        if let Some(genre_ids) = &changes.genre_ids {
            ensure_genres_exist(&mut tx, genre_ids).await?;
        }
        if let Some(links) = &changes.contributors {
            ensure_contributors_exist(&mut tx, links).await?;
        }

        changes.apply_to(&mut record);
        record.updated_at = OffsetDateTime::now_utc();
        BookRepository::update(&mut tx, &record).await?;

        if let Some(genre_ids) = &changes.genre_ids {
            BookGenreLinks::replace(&mut tx, id, genre_ids)
                .await
                .map_err(|err| link_failure(err, "genre", genre_ids))?;
        }
        if let Some(links) = &changes.contributors {
            BookContributorLinks::replace(&mut tx, id, links)
                .await
                .map_err(|err| link_failure(err, "contributor", &contributor_ids(links)))?;
        }

        let book = load(&mut tx, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(RESOURCE, id))?;
        tx.commit().await?;

        tracing::info!(book_id = %id, "book updated");
        Ok(book)
    }

    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        let mut tx = self.db.begin().await?;
        if !BookRepository::delete(&mut tx, id).await? {
            return Err(CatalogError::not_found(RESOURCE, id));
        }
        tx.commit().await?;

        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }
}

async fn load(conn: &mut SqliteConnection, id: Uuid) -> CatalogResult<Option<Book>> {
    let Some(record) = BookRepository::find(conn, id).await? else {
        return Ok(None);
    };
    let genres = BookGenreLinks::for_books(conn, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    let contributors = BookContributorLinks::for_books(conn, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();

    Ok(Some(Book {
        record,
        genres,
        contributors,
    }))
}

async fn ensure_genres_exist(conn: &mut SqliteConnection, ids: &[Uuid]) -> CatalogResult<()> {
    let missing = GenreRepository::missing(conn, ids).await?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::NotFound {
            resource: "genre",
            ids: missing,
        })
    }
}

async fn ensure_contributors_exist(
    conn: &mut SqliteConnection,
    links: &[ContributorLink],
) -> CatalogResult<()> {
    let missing = ContributorRepository::missing(conn, &contributor_ids(links)).await?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::NotFound {
            resource: "contributor",
            ids: missing,
        })
    }
}

fn contributor_ids(links: &[ContributorLink]) -> Vec<Uuid> {
    let ids: Vec<Uuid> = links.iter().map(|l| l.contributor_id).collect();
    dedup_preserving_order(&ids)
}

/// A referenced row deleted after the existence check surfaces here as a
/// foreign key failure.
fn link_failure(err: sqlx::Error, resource: &'static str, ids: &[Uuid]) -> CatalogError {
    if bookshelf_db::is_foreign_key_violation(&err) {
        CatalogError::NotFound {
            resource,
            ids: ids.to_vec(),
        }
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::{ContributorRole, CreateBook, UpdateBook};
    use crate::modules::contributors::{ContributorName, ContributorService};
    use crate::modules::genres::models::GenreName;
    use crate::modules::genres::GenreService;
    use crate::query::ListParams;
    use bookshelf_db::DatabaseSettings;
    use serde_json::json;

    struct Fixture {
        db: Database,
        books: BookService,
        genres: GenreService,
        contributors: ContributorService,
    }

    async fn fixture() -> Fixture {
        let db = Database::connect(&DatabaseSettings::in_memory())
            .await
            .unwrap();
        let mut registry = bookshelf_kernel::ModuleRegistry::new();
        crate::modules::register_all(&mut registry);
        db.migrate(&registry.collect_migrations()).await.unwrap();

        Fixture {
            books: BookService::new(db.clone()),
            genres: GenreService::new(db.clone()),
            contributors: ContributorService::new(db.clone()),
            db,
        }
    }

    fn new_book(body: serde_json::Value) -> NewBook {
        serde_json::from_value::<CreateBook>(body)
            .unwrap()
            .validate()
            .unwrap()
    }

    fn changes(body: serde_json::Value) -> BookChanges {
        serde_json::from_value::<UpdateBook>(body)
            .unwrap()
            .validate()
            .unwrap()
    }

    async fn book_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_attaches_genres_and_contributors() {
        let f = fixture().await;
        let sci_fi = f
            .genres
            .create(GenreName::parse("Фантастика").unwrap())
            .await
            .unwrap();
        let herbert = f.contributors.create(ContributorName::parse("Фрэнк Герберт").unwrap()).await.unwrap();

        let book = f
            .books
            .create(new_book(json!({
                "title": "Дюна",
                "rating": 9.1,
                "published_year": 1965,
                "genre_ids": [sci_fi.id],
                "contributors": [{"contributor_id": herbert.id, "role": "author"}]
            })))
            .await
            .unwrap();

        assert_eq!(book.genres.len(), 1);
        assert_eq!(book.genres[0].name, "Фантастика");
        assert_eq!(book.contributors[0].role, ContributorRole::Author);
        assert_eq!(f.books.get(book.record.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn unknown_genre_rolls_back_the_whole_create() {
        let f = fixture().await;
        let ghost = Uuid::new_v4();

        let err = f
            .books
            .create(new_book(json!({"title": "Пустота", "genre_ids": [ghost]})))
            .await
            .unwrap_err();

        match err {
            CatalogError::NotFound { resource, ids } => {
                assert_eq!(resource, "genre");
                assert_eq!(ids, vec![ghost]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(book_count(&f.db).await, 0);
    }

    #[tokio::test]
    async fn unknown_contributor_is_not_found() {
        let f = fixture().await;
        let err = f
            .books
            .create(new_book(json!({
                "title": "Аноним",
                "contributors": [{"contributor_id": Uuid::new_v4(), "role": "editor"}]
            })))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::NotFound { resource: "contributor", .. }
        ));
        assert_eq!(book_count(&f.db).await, 0);
    }

    #[tokio::test]
    async fn patch_clears_nullable_fields_and_replaces_links() {
        let f = fixture().await;
        let first = f.genres.create(GenreName::parse("Роман").unwrap()).await.unwrap();
        let second = f.genres.create(GenreName::parse("Драма").unwrap()).await.unwrap();

        let book = f
            .books
            .create(new_book(json!({
                "title": "Анна Каренина",
                "description": "Всё смешалось в доме Облонских",
                "rating": 8.0,
                "genre_ids": [first.id]
            })))
            .await
            .unwrap();

        let updated = f
            .books
            .update(
                book.record.id,
                changes(json!({"description": null, "genre_ids": [second.id]})),
            )
            .await
            .unwrap();

        assert_eq!(updated.record.description, None);
        assert_eq!(updated.record.rating, Some(8.0));
        assert_eq!(updated.genres.len(), 1);
        assert_eq!(updated.genres[0].id, second.id);
        assert!(updated.record.updated_at >= book.record.updated_at);
    }

    #[tokio::test]
    async fn failed_patch_leaves_book_unchanged() {
        let f = fixture().await;
        let book = f
            .books
            .create(new_book(json!({"title": "Война и мир"})))
            .await
            .unwrap();

        let err = f
            .books
            .update(
                book.record.id,
                changes(json!({"title": "Мир", "genre_ids": [Uuid::new_v4()]})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));

        let stored = f.books.get(book.record.id).await.unwrap();
        assert_eq!(stored.record.title, "Война и мир");
    }

    #[tokio::test]
    async fn deleting_a_genre_unlinks_it_from_books() {
        let f = fixture().await;
        let genre = f.genres.create(GenreName::parse("Сказка").unwrap()).await.unwrap();
        let book = f
            .books
            .create(new_book(json!({"title": "Колобок", "genre_ids": [genre.id]})))
            .await
            .unwrap();

        f.genres.delete(genre.id).await.unwrap();

        let stored = f.books.get(book.record.id).await.unwrap();
        assert!(stored.genres.is_empty());
    }

    #[tokio::test]
    async fn list_searches_description_and_attaches_links() {
        let f = fixture().await;
        let author = f.contributors.create(ContributorName::parse("Жюль Верн").unwrap()).await.unwrap();
        for (title, description) in [
            ("Восемьдесят тысяч льё под водой", Some("Капитан Немо и Наутилус")),
            ("Таинственный остров", Some("Снова КАПИТАН Немо")),
            ("Вокруг света за 80 дней", None),
        ] {
            f.books
                .create(new_book(json!({
                    "title": title,
                    "description": description,
                    "contributors": [{"contributor_id": author.id, "role": "author"}]
                })))
                .await
                .unwrap();
        }

        let query: ListQuery<BookSort> = ListParams {
            q: Some("капитан".into()),
            page_size: Some(1),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let page = f.books.list(&query).await.unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].record.title, "Восемьдесят тысяч льё под водой");
        assert_eq!(page.items[0].contributors[0].name, "Жюль Верн");
    }
}
