use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::query::SortKey;
use crate::validation::{present, Validator};

pub const NAME_MAX_CHARS: usize = 100;

/// A genre as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Request body for `POST /genres/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGenre {
    pub name: String,
}

/// Request body for `PATCH /genres/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGenre {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
}

/// A trimmed genre name of 1..=100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreName(String);

impl GenreName {
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        let mut v = Validator::new();
        let name = v.required_text("name", raw, NAME_MAX_CHARS);
        v.finish(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl CreateGenre {
    pub fn validate(&self) -> CatalogResult<GenreName> {
        GenreName::parse(&self.name)
    }
}

impl UpdateGenre {
    pub fn validate(&self) -> CatalogResult<Option<GenreName>> {
        let mut v = Validator::new();
        let raw = v.not_null("name", &self.name);
        v.finish(())?;
        raw.map(|raw| GenreName::parse(raw)).transpose()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenreSort {
    #[default]
    Name,
    CreatedAt,
}

impl SortKey for GenreSort {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "created_at",
        }
    }
}
