pub mod links;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::modules::{error_response, id_parameter, json_body, json_response, list_parameters};

pub use service::BookService;

/// Books with their genre and contributor links
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        routes::router(BookService::new(ctx.db.clone()))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book = json!({ "$ref": "#/components/schemas/Book" });
        Some(json!({
            "paths": {
                "/books/": {
                    "get": {
                        "summary": "List books",
                        "description": "Search matches title and description, case-insensitively.",
                        "tags": ["Books"],
                        "parameters": list_parameters(&["title", "rating", "published_year", "created_at"]),
                        "responses": {
                            "200": json_response("Page of books", json!({
                                "type": "object",
                                "properties": {
                                    "items": { "type": "array", "items": book.clone() },
                                    "total": { "type": "integer" },
                                    "page": { "type": "integer" },
                                    "page_size": { "type": "integer" }
                                }
                            })),
                            "422": error_response("Invalid paging parameters")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": json_body("BookInput"),
                        "responses": {
                            "201": json_response("Created book", book.clone()),
                            "404": error_response("Referenced genre or contributor not found"),
                            "422": error_response("Validation error")
                        }
                    }
                },
                "/books/{id}": {
                    "parameters": [id_parameter()],
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": json_response("Book", book.clone()),
                            "404": error_response("Book not found")
                        }
                    },
                    "patch": {
                        "summary": "Partially update a book",
                        "description": "Absent fields are kept, null clears optional fields, supplied link lists replace the current ones.",
                        "tags": ["Books"],
                        "requestBody": json_body("BookPatch"),
                        "responses": {
                            "200": json_response("Updated book", book),
                            "404": error_response("Book, genre or contributor not found"),
                            "422": error_response("Validation error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error_response("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "rating": { "type": ["number", "null"] },
                            "description": { "type": ["string", "null"] },
                            "published_year": { "type": ["integer", "null"] },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" },
                            "genres": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id": { "type": "string", "format": "uuid" },
                                        "name": { "type": "string" }
                                    }
                                }
                            },
                            "contributors": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id": { "type": "string", "format": "uuid" },
                                        "name": { "type": "string" },
                                        "role": { "$ref": "#/components/schemas/ContributorRole" }
                                    }
                                }
                            }
                        },
                        "required": ["id", "title", "created_at", "updated_at", "genres", "contributors"]
                    },
                    "ContributorRole": {
                        "type": "string",
                        "enum": ["author", "editor", "illustrator", "translator"]
                    },
                    "ContributorLink": {
                        "type": "object",
                        "properties": {
                            "contributor_id": { "type": "string", "format": "uuid" },
                            "role": { "$ref": "#/components/schemas/ContributorRole" }
                        },
                        "required": ["contributor_id", "role"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": book_input_properties(),
                        "required": ["title"]
                    },
                    "BookPatch": {
                        "type": "object",
                        "properties": book_input_properties()
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn book_input_properties() -> serde_json::Value {
    json!({
        "title": { "type": "string", "minLength": 1, "maxLength": models::TITLE_MAX_CHARS },
        "rating": { "type": ["number", "null"], "minimum": models::RATING_MIN, "maximum": models::RATING_MAX },
        "description": { "type": ["string", "null"], "maxLength": models::DESCRIPTION_MAX_CHARS },
        "published_year": { "type": ["integer", "null"], "minimum": models::YEAR_MIN, "maximum": models::YEAR_MAX },
        "genre_ids": { "type": "array", "items": { "type": "string", "format": "uuid" } },
        "contributors": { "type": "array", "items": { "$ref": "#/components/schemas/ContributorLink" } }
    })
}

pub(crate) fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE books (
                id             TEXT PRIMARY KEY NOT NULL,
                title          TEXT NOT NULL CHECK (length(title) > 0),
                rating         REAL CHECK (rating IS NULL OR (rating >= 0 AND rating <= 10)),
                description    TEXT,
                published_year INTEGER CHECK (published_year IS NULL OR (published_year >= 0 AND published_year <= 2100)),
                search_text    TEXT NOT NULL,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            );
            CREATE INDEX idx_books_title ON books (title, id);
            CREATE INDEX idx_books_rating ON books (rating, id);
            CREATE INDEX idx_books_published_year ON books (published_year, id);
            CREATE INDEX idx_books_created_at ON books (created_at, id);

            CREATE TABLE book_genres (
                book_id  TEXT NOT NULL REFERENCES books (id) ON DELETE CASCADE,
                genre_id TEXT NOT NULL REFERENCES genres (id) ON DELETE CASCADE ON UPDATE CASCADE,
                PRIMARY KEY (book_id, genre_id)
            );
            CREATE INDEX idx_book_genres_genre ON book_genres (genre_id);

            CREATE TABLE book_contributors (
                book_id        TEXT NOT NULL REFERENCES books (id) ON DELETE CASCADE,
                contributor_id TEXT NOT NULL REFERENCES contributors (id) ON DELETE CASCADE ON UPDATE CASCADE,
                role           TEXT NOT NULL CHECK (role IN ('author', 'editor', 'illustrator', 'translator')),
                position       INTEGER NOT NULL,
                PRIMARY KEY (book_id, contributor_id, role)
            );
            CREATE INDEX idx_book_contributors_contributor ON book_contributors (contributor_id);
            "#,
    }]
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}
