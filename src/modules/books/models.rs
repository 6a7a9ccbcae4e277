use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::query::SortKey;
use crate::validation::{dedup_preserving_order, present, Validator};

pub const TITLE_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 5000;
pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;
pub const YEAR_MIN: i32 = 0;
pub const YEAR_MAX: i32 = 2100;

/// The scalar columns of a book row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A book with its genres and credited contributors, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    #[serde(flatten)]
    pub record: BookRecord,
    pub genres: Vec<GenreRef>,
    pub contributors: Vec<BookContributor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookContributor {
    pub id: Uuid,
    pub name: String,
    pub role: ContributorRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorRole {
    Author,
    Editor,
    Illustrator,
    Translator,
}

impl ContributorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Editor => "editor",
            Self::Illustrator => "illustrator",
            Self::Translator => "translator",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown contributor role '{0}'")]
pub struct UnknownRole(String);

impl std::str::FromStr for ContributorRole {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "author" => Ok(Self::Author),
            "editor" => Ok(Self::Editor),
            "illustrator" => Ok(Self::Illustrator),
            "translator" => Ok(Self::Translator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// One `(contributor, role)` credit in a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContributorLink {
    pub contributor_id: Uuid,
    pub role: ContributorRole,
}

/// Request body for `POST /books/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBook {
    pub title: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub genre_ids: Vec<Uuid>,
    #[serde(default)]
    pub contributors: Vec<ContributorLink>,
}

/// Request body for `PATCH /books/{id}`.
///
/// An absent key means "leave as is". An explicit `null` clears the nullable
/// columns and is rejected for `title`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub published_year: Option<Option<i32>>,
    #[serde(default)]
    pub genre_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub contributors: Option<Vec<ContributorLink>>,
}

/// A validated book ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub genre_ids: Vec<Uuid>,
    pub contributors: Vec<ContributorLink>,
}

/// Validated partial update; `None` fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub rating: Option<Option<f64>>,
    pub description: Option<Option<String>>,
    pub published_year: Option<Option<i32>>,
    pub genre_ids: Option<Vec<Uuid>>,
    pub contributors: Option<Vec<ContributorLink>>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the scalar changes to `record`.
    pub fn apply_to(&self, record: &mut BookRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(rating) = self.rating {
            record.rating = rating;
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(year) = self.published_year {
            record.published_year = year;
        }
    }
}

impl CreateBook {
    pub fn validate(&self) -> CatalogResult<NewBook> {
        let mut v = Validator::new();

        let title = v.required_text("title", &self.title, TITLE_MAX_CHARS);
        let rating = self
            .rating
            .map(|r| v.range("rating", r, RATING_MIN, RATING_MAX));
        let description =
            v.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX_CHARS);
        let published_year = self
            .published_year
            .map(|y| v.range("published_year", y, YEAR_MIN, YEAR_MAX));

        v.finish(NewBook {
            title,
            rating,
            description,
            published_year,
            genre_ids: dedup_preserving_order(&self.genre_ids),
            contributors: dedup_preserving_order(&self.contributors),
        })
    }
}

impl UpdateBook {
    /// Only the supplied fields are checked.
    pub fn validate(&self) -> CatalogResult<BookChanges> {
        let mut v = Validator::new();

        let title = v
            .not_null("title", &self.title)
            .map(|t| v.required_text("title", t, TITLE_MAX_CHARS));
        let rating = self
            .rating
            .map(|r| r.map(|r| v.range("rating", r, RATING_MIN, RATING_MAX)));
        let description = self.description.as_ref().map(|d| {
            v.optional_text("description", d.as_deref(), DESCRIPTION_MAX_CHARS)
        });
        let published_year = self
            .published_year
            .map(|y| y.map(|y| v.range("published_year", y, YEAR_MIN, YEAR_MAX)));

        v.finish(BookChanges {
            title,
            rating,
            description,
            published_year,
            genre_ids: self.genre_ids.as_deref().map(dedup_preserving_order),
            contributors: self.contributors.as_deref().map(dedup_preserving_order),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookSort {
    #[default]
    Title,
    Rating,
    PublishedYear,
    CreatedAt,
}

impl SortKey for BookSort {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "rating" => Some(Self::Rating),
            "published_year" => Some(Self::PublishedYear),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Rating => "rating",
            Self::PublishedYear => "published_year",
            Self::CreatedAt => "created_at",
        }
    }
}
