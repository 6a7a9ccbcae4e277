pub mod books;
pub mod contributors;
pub mod genres;

use bookshelf_kernel::ModuleRegistry;
use serde_json::{json, Value};

/// Register the catalog modules. Books reference genres and contributors,
/// so they come last.
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(genres::create_module());
    registry.register(contributors::create_module());
    registry.register(books::create_module());
}

// Shared OpenAPI fragments for module documents.

pub(crate) fn list_parameters(sorts: &[&str]) -> Value {
    json!([
        {
            "name": "page", "in": "query", "required": false,
            "schema": { "type": "integer", "minimum": 1, "default": 1 }
        },
        {
            "name": "page_size", "in": "query", "required": false,
            "schema": {
                "type": "integer",
                "minimum": 1,
                "maximum": crate::query::MAX_PAGE_SIZE,
                "default": crate::query::DEFAULT_PAGE_SIZE
            }
        },
        {
            "name": "q", "in": "query", "required": false,
            "description": "Case-insensitive substring search",
            "schema": { "type": "string" }
        },
        {
            "name": "sort", "in": "query", "required": false,
            "description": "Unknown fields fall back to the default",
            "schema": { "type": "string", "enum": sorts, "default": sorts.first() }
        },
        {
            "name": "order", "in": "query", "required": false,
            "schema": { "type": "string", "enum": ["asc", "desc"], "default": "asc" }
        }
    ])
}

pub(crate) fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

pub(crate) fn error_response(description: &str) -> Value {
    json_response(description, json!({ "$ref": "#/components/schemas/ErrorResponse" }))
}

pub(crate) fn json_body(schema_name: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema_name) }
            }
        }
    })
}

pub(crate) fn id_parameter() -> Value {
    json!({
        "name": "id", "in": "path", "required": true,
        "schema": { "type": "string", "format": "uuid" }
    })
}
