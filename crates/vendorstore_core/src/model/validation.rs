//! Field-tagged validation error collection.

use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field name -> human readable message.
///
/// Only the first message recorded for a field is kept, so callers see the
/// most basic problem first (e.g. "must be provided" before range checks).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already has one.
    pub fn add_error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Records `message` for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.keys().copied()
    }

    /// Returns `Ok(())` when no error was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed:")?;
        for (index, (field, message)) in self.errors.iter().enumerate() {
            let sep = if index == 0 { " " } else { "; " };
            write!(f, "{sep}{field} {message}")?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::ValidationErrors;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.check(false, "title", "must be provided");
        errors.check(false, "title", "must not be more than 500 bytes long");
        errors.check(true, "year", "never recorded");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("title"), Some("must be provided"));
        assert_eq!(errors.get("year"), None);
    }

    #[test]
    fn display_and_json_are_field_tagged() {
        let mut errors = ValidationErrors::new();
        errors.add_error("year", "must not be in the future");
        errors.add_error("genres", "must contain at least 1 genre");

        assert_eq!(
            errors.to_string(),
            "validation failed: genres must contain at least 1 genre; year must not be in the future"
        );
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["year"], "must not be in the future");
        assert_eq!(json["genres"], "must contain at least 1 genre");
    }

    #[test]
    fn into_result_reflects_emptiness() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let mut errors = ValidationErrors::new();
        errors.add_error("page", "must be greater than zero");
        assert!(errors.into_result().is_err());
    }
}
