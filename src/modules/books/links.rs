//! Book ↔ genre and book ↔ contributor association tables.
//!
//! Both link sets are written wholesale: a replace deletes the book's rows
//! and inserts the new set. Reads are batched per page of books so a list
//! request costs two extra queries, not two per book.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::{fmt::Hyphenated, Uuid};

use super::models::{BookContributor, ContributorLink, ContributorRole, GenreRef};

pub struct BookGenreLinks;

impl BookGenreLinks {
    pub async fn replace(
        conn: &mut SqliteConnection,
        book_id: Uuid,
        genre_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = ?")
            .bind(book_id.hyphenated())
            .execute(&mut *conn)
            .await?;

        if genre_ids.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO book_genres (book_id, genre_id) ");
        builder.push_values(genre_ids, |mut row, genre_id| {
            row.push_bind(book_id.hyphenated())
                .push_bind(genre_id.hyphenated());
        });
        builder.build().execute(&mut *conn).await?;
        Ok(())
    }

    /// Genres of every book in `book_ids`, each list ordered by name.
    pub async fn for_books(
        conn: &mut SqliteConnection,
        book_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<GenreRef>>, sqlx::Error> {
        let mut by_book: HashMap<Uuid, Vec<GenreRef>> = HashMap::new();
        if book_ids.is_empty() {
            return Ok(by_book);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT bg.book_id, g.id, g.name FROM book_genres bg \
             JOIN genres g ON g.id = bg.genre_id WHERE bg.book_id IN (",
        );
        push_id_list(&mut builder, book_ids);
        builder.push(" ORDER BY g.name ASC, g.id ASC");

        let rows: Vec<(Hyphenated, Hyphenated, String)> =
            builder.build_query_as().fetch_all(&mut *conn).await?;

        for (book_id, id, name) in rows {
            by_book.entry(book_id.into_uuid()).or_default().push(GenreRef {
                id: id.into_uuid(),
                name,
            });
        }
        Ok(by_book)
    }
}

pub struct BookContributorLinks;

impl BookContributorLinks {
    /// Credits keep the order they were supplied in.
    pub async fn replace(
        conn: &mut SqliteConnection,
        book_id: Uuid,
        links: &[ContributorLink],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM book_contributors WHERE book_id = ?")
            .bind(book_id.hyphenated())
            .execute(&mut *conn)
            .await?;

        if links.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO book_contributors (book_id, contributor_id, role, position) ",
        );
        builder.push_values(links.iter().enumerate(), |mut row, (position, link)| {
            row.push_bind(book_id.hyphenated())
                .push_bind(link.contributor_id.hyphenated())
                .push_bind(link.role.as_str())
                .push_bind(position as i64);
        });
        builder.build().execute(&mut *conn).await?;
        Ok(())
    }

    pub async fn for_books(
        conn: &mut SqliteConnection,
        book_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<BookContributor>>, sqlx::Error> {
        let mut by_book: HashMap<Uuid, Vec<BookContributor>> = HashMap::new();
        if book_ids.is_empty() {
            return Ok(by_book);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT bc.book_id, c.id, c.name, bc.role FROM book_contributors bc \
             JOIN contributors c ON c.id = bc.contributor_id WHERE bc.book_id IN (",
        );
        push_id_list(&mut builder, book_ids);
        builder.push(" ORDER BY bc.position ASC");

        let rows: Vec<(Hyphenated, Hyphenated, String, String)> =
            builder.build_query_as().fetch_all(&mut *conn).await?;

        for (book_id, id, name, role) in rows {
            let role: ContributorRole = role
                .parse()
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
            by_book
                .entry(book_id.into_uuid())
                .or_default()
                .push(BookContributor {
                    id: id.into_uuid(),
                    name,
                    role,
                });
        }
        Ok(by_book)
    }
}

/// Appends `?, ?, ...)` for `ids`.
fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[Uuid]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.hyphenated());
    }
    separated.push_unseparated(")");
}
