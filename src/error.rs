//! Domain errors raised by catalog services.
//!
//! Services never pick status codes. The conversion into
//! [`bookshelf_http::AppError`] below is the one place that decides how each
//! failure is presented to clients.

use bookshelf_http::AppError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("validation failed: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("{resource} not found: {}", describe_ids(.ids))]
    NotFound {
        resource: &'static str,
        ids: Vec<Uuid>,
    },

    #[error("{message}")]
    Conflict {
        field: &'static str,
        message: String,
    },

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        Self::NotFound {
            resource,
            ids: vec![id],
        }
    }

    pub fn invalid(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, error)])
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(fields) => {
                let details = fields
                    .iter()
                    .map(|f| json!({"field": f.field, "error": f.error}))
                    .collect();
                AppError::validation(details, "request validation failed")
            }
            err @ CatalogError::NotFound { .. } => AppError::not_found(err.to_string()),
            CatalogError::Conflict { field, message } => AppError::conflict(
                vec![json!({"field": field, "error": "already exists"})],
                message,
            ),
            CatalogError::Storage(source) => {
                AppError::Internal(anyhow::Error::new(source).context("storage failure"))
            }
        }
    }
}
