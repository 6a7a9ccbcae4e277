use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::query::SortKey;
use crate::validation::{present, Validator};

pub const NAME_MAX_CHARS: usize = 255;

/// A person who worked on one or more books
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContributor {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContributor {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
}

/// Trimmed display name, 1..=255 characters. Need not be unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorName(String);

impl ContributorName {
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

impl CreateContributor {
    pub fn validate(&self) -> CatalogResult<ContributorName> {
        ContributorName::parse(&self.name)
    }
}

impl UpdateContributor {
    pub fn validate(&self) -> CatalogResult<Option<ContributorName>> {
        let mut v = Validator::new();
        let raw = v.not_null("name", &self.name);
        v.finish(())?;
        raw.map(|raw| ContributorName::parse(raw)).transpose()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContributorSort {
    #[default]
    Name,
    CreatedAt,
}

impl SortKey for ContributorSort {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    #[test]
    fn name_is_trimmed_and_bounded() {
        let create = CreateContributor {
            name: "  Аркадий Стругацкий ".into(),
        };
        assert_eq!(create.validate().unwrap().as_str(), "Аркадий Стругацкий");

        let too_long = CreateContributor {
            name: "я".repeat(NAME_MAX_CHARS + 1),
        };
        assert!(matches!(too_long.validate(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn absent_name_means_no_change() {
        assert_eq!(UpdateContributor::default().validate().unwrap(), None);
        let blank = UpdateContributor {
            name: Some(Some("   ".into())),
        };
        assert!(blank.validate().is_err());
        assert!(UpdateContributor { name: Some(None) }.validate().is_err());
    }
}
