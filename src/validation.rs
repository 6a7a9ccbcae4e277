//! Field checks shared by the request schemas of every module.

use std::{collections::HashSet, fmt::Display, hash::Hash};

use serde::{Deserialize, Deserializer};

use crate::error::{CatalogError, CatalogResult, FieldError};

/// Collects every field problem of one payload before failing.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, field: &str, error: impl Into<String>) {
        self.errors.push(FieldError::new(field, error));
    }

    /// Trimmed, non-empty text of at most `max_chars` characters.
    pub fn required_text(&mut self, field: &str, value: &str, max_chars: usize) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.reject(field, "must not be empty");
        } else if trimmed.chars().count() > max_chars {
            self.reject(field, format!("must be at most {} characters", max_chars));
        }
        trimmed.to_string()
    }

    /// Trimmed text; blank becomes `None`.
    pub fn optional_text(
        &mut self,
        field: &str,
        value: Option<&str>,
        max_chars: usize,
    ) -> Option<String> {
        let trimmed = value.map(str::trim).filter(|v| !v.is_empty())?;
        if trimmed.chars().count() > max_chars {
            self.reject(field, format!("must be at most {} characters", max_chars));
        }
        Some(trimmed.to_string())
    }

    /// Rejects an explicit `null` for a field that cannot be cleared.
    pub fn not_null<'a, T>(&mut self, field: &str, value: &'a Option<Option<T>>) -> Option<&'a T> {
        match value {
            Some(None) => {
                self.reject(field, "must not be null");
                None
            }
            Some(Some(inner)) => Some(inner),
            None => None,
        }
    }

    pub fn range<T>(&mut self, field: &str, value: T, min: T, max: T) -> T
    where
        T: PartialOrd + Display + Copy,
    {
        // NaN fails both comparisons, so it lands here too
        if !(value >= min && value <= max) {
            self.reject(field, format!("must be between {} and {}", min, max));
        }
        value
    }

    pub fn finish<T>(self, value: T) -> CatalogResult<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(CatalogError::Validation(self.errors))
        }
    }
}

/// Serde hook for PATCH fields: only called for keys present in the body,
/// so `null` becomes `Some(None)` and an absent key stays `None`.
pub fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Drops repeated entries, keeping the first occurrence.
pub fn dedup_preserving_order<T>(items: &[T]) -> Vec<T>
where
    T: Eq + Hash + Copy,
{
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().copied().filter(|item| seen.insert(*item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_problems() {
        let mut v = Validator::new();
        let title = v.required_text("title", "   ", 10);
        let rating = v.range("rating", 11.0, 0.0, 10.0);
        v.range("published_year", 1999, 0, 2100);

        assert_eq!(title, "");
        assert_eq!(rating, 11.0);
        match v.finish(()) {
            Err(CatalogError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "rating"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn text_is_trimmed_and_counted_in_chars() {
        let mut v = Validator::new();
        // 100 Cyrillic letters are 200 bytes but still within a 100 char limit
        let name = "ж".repeat(100);
        assert_eq!(v.required_text("name", &format!("  {name} "), 100), name);
        assert_eq!(v.optional_text("description", Some("  "), 10), None);
        assert!(v.finish(()).is_ok());

        let mut v = Validator::new();
        v.required_text("name", &"a".repeat(101), 100);
        assert!(v.finish(()).is_err());
    }

    #[test]
    fn nan_is_out_of_range() {
        let mut v = Validator::new();
        v.range("rating", f64::NAN, 0.0, 10.0);
        assert!(v.finish(()).is_err());
    }

    #[test]
    fn explicit_null_is_rejected_but_absence_is_not() {
        let mut v = Validator::new();
        assert_eq!(v.not_null::<String>("title", &None), None);
        assert_eq!(v.not_null("title", &Some(Some("Дюна".to_string()))).map(String::as_str), Some("Дюна"));
        assert!(v.finish(()).is_ok());

        let mut v = Validator::new();
        assert_eq!(v.not_null::<String>("title", &Some(None)), None);
        match v.finish(()) {
            Err(CatalogError::Validation(errors)) => assert_eq!(errors[0].field, "title"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_preserving_order(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
