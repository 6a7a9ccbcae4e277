pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::modules::{error_response, id_parameter, json_body, json_response, list_parameters};

pub use service::GenreService;

/// Genre catalog: unique, named categories books can be filed under
pub struct GenresModule;

impl GenresModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for GenresModule {
    fn name(&self) -> &'static str {
        "genres"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "genres module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        routes::router(GenreService::new(ctx.db.clone()))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/genres/": {
                    "get": {
                        "summary": "List genres",
                        "tags": ["Genres"],
                        "parameters": list_parameters(&["name", "created_at"]),
                        "responses": {
                            "200": json_response("Page of genres", json!({
                                "type": "object",
                                "properties": {
                                    "items": { "type": "array", "items": { "$ref": "#/components/schemas/Genre" } },
                                    "total": { "type": "integer" },
                                    "page": { "type": "integer" },
                                    "page_size": { "type": "integer" }
                                }
                            })),
                            "422": error_response("Invalid paging parameters")
                        }
                    },
                    "post": {
                        "summary": "Create a genre",
                        "tags": ["Genres"],
                        "requestBody": json_body("GenreInput"),
                        "responses": {
                            "201": json_response("Created genre", json!({ "$ref": "#/components/schemas/Genre" })),
                            "409": error_response("Genre name already exists"),
                            "422": error_response("Validation error")
                        }
                    }
                },
                "/genres/{id}": {
                    "parameters": [id_parameter()],
                    "get": {
                        "summary": "Get a genre",
                        "tags": ["Genres"],
                        "responses": {
                            "200": json_response("Genre", json!({ "$ref": "#/components/schemas/Genre" })),
                            "404": error_response("Genre not found")
                        }
                    },
                    "patch": {
                        "summary": "Rename a genre",
                        "tags": ["Genres"],
                        "requestBody": json_body("GenreInput"),
                        "responses": {
                            "200": json_response("Updated genre", json!({ "$ref": "#/components/schemas/Genre" })),
                            "404": error_response("Genre not found"),
                            "409": error_response("Genre name already exists")
                        }
                    },
                    "delete": {
                        "summary": "Delete a genre and its book links",
                        "tags": ["Genres"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error_response("Genre not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Genre": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string", "maxLength": models::NAME_MAX_CHARS },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "name", "created_at", "updated_at"]
                    },
                    "GenreInput": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "minLength": 1, "maxLength": models::NAME_MAX_CHARS }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "genres module stopped");
        Ok(())
    }
}

pub(crate) fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE genres (
                id          TEXT PRIMARY KEY NOT NULL,
                name        TEXT NOT NULL UNIQUE CHECK (length(name) > 0),
                search_text TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );
            CREATE INDEX idx_genres_created_at ON genres (created_at, id);
            "#,
    }]
}

/// Create a new instance of the genres module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(GenresModule::new())
}
