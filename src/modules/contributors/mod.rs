pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::modules::{error_response, id_parameter, json_body, json_response, list_parameters};

pub use models::ContributorName;
pub use service::ContributorService;

/// People credited on books (authors, editors, illustrators, translators)
pub struct ContributorsModule;

impl ContributorsModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for ContributorsModule {
    fn name(&self) -> &'static str {
        "contributors"
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        routes::router(ContributorService::new(ctx.db.clone()))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let contributor = json!({ "$ref": "#/components/schemas/Contributor" });
        Some(json!({
            "paths": {
                "/contributors/": {
                    "get": {
                        "summary": "List contributors",
                        "tags": ["Contributors"],
                        "parameters": list_parameters(&["name", "created_at"]),
                        "responses": {
                            "200": json_response("Page of contributors", json!({
                                "type": "object",
                                "properties": {
                                    "items": { "type": "array", "items": contributor.clone() },
                                    "total": { "type": "integer" },
                                    "page": { "type": "integer" },
                                    "page_size": { "type": "integer" }
                                }
                            })),
                            "422": error_response("Invalid paging parameters")
                        }
                    },
                    "post": {
                        "summary": "Create a contributor",
                        "tags": ["Contributors"],
                        "requestBody": json_body("ContributorInput"),
                        "responses": {
                            "201": json_response("Created contributor", contributor.clone()),
                            "422": error_response("Validation error")
                        }
                    }
                },
                "/contributors/{id}": {
                    "parameters": [id_parameter()],
                    "get": {
                        "summary": "Get a contributor",
                        "tags": ["Contributors"],
                        "responses": {
                            "200": json_response("Contributor", contributor.clone()),
                            "404": error_response("Contributor not found")
                        }
                    },
                    "patch": {
                        "summary": "Rename a contributor",
                        "tags": ["Contributors"],
                        "requestBody": json_body("ContributorInput"),
                        "responses": {
                            "200": json_response("Updated contributor", contributor),
                            "404": error_response("Contributor not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a contributor and its book links",
                        "tags": ["Contributors"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error_response("Contributor not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Contributor": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string" },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "name", "created_at", "updated_at"]
                    },
                    "ContributorInput": {
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
}

pub(crate) fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE contributors (
                id          TEXT PRIMARY KEY NOT NULL,
                name        TEXT NOT NULL CHECK (length(name) > 0),
                search_text TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );
            CREATE INDEX idx_contributors_name ON contributors (name, id);
            "#,
    }]
}

pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ContributorsModule::new())
}
