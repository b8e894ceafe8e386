//! Shared primitives for all Rust crates in Vellum.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across Vellum crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// A stable, machine-safe identifier for content types, fields and views.
///
/// Developer names start with a lowercase ASCII letter and continue with
/// lowercase letters, digits or underscores. They are safe to inline into
/// JSON paths of generated SQL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeveloperName(String);

impl DeveloperName {
    /// Creates a validated developer name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let mut chars = value.chars();
        let starts_with_letter = chars
            .next()
            .map(|first| first.is_ascii_lowercase())
            .unwrap_or(false);
        let rest_is_safe =
            chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');

        if !starts_with_letter || !rest_is_safe {
            return Err(AppError::Validation(format!(
                "developer name '{value}' must match ^[a-z][a-z0-9_]*$"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for DeveloperName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeveloperName> for String {
    fn from(value: DeveloperName) -> Self {
        value.0
    }
}

impl Display for DeveloperName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Identifier of an administrator-defined content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentTypeId(Uuid);

impl ContentTypeId {
    /// Creates a random content type identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a content type identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContentTypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ContentTypeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a saved view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(Uuid);

impl ViewId {
    /// Creates a random view identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a view identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ViewId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// A filter or sort refers to a field in a way its type does not allow.
    #[error("validation error on field '{field}': {reason}")]
    InvalidField {
        /// Developer name of the offending field.
        field: String,
        /// Human-readable rejection reason.
        reason: String,
    },

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unknown code for a closed set (field type, operator, provider).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Raw input could not be parsed into the requested typed value.
    #[error("format error: {0}")]
    Format(String),

    /// The caller cancelled the operation before it completed.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, ContentTypeId, DeveloperName, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn content_type_id_formats_as_uuid() {
        let content_type_id = ContentTypeId::new();
        assert_eq!(content_type_id.to_string().len(), 36);
    }

    #[test]
    fn developer_name_accepts_snake_case() {
        let name = DeveloperName::new("published_on2");
        assert!(name.is_ok());
    }

    #[test]
    fn developer_name_rejects_unsafe_characters() {
        for candidate in ["", "Price", "1price", "price-tag", "price'--", "pri ce"] {
            let result = DeveloperName::new(candidate);
            assert!(
                matches!(result, Err(AppError::Validation(_))),
                "expected '{candidate}' to be rejected"
            );
        }
    }

    #[test]
    fn invalid_field_error_names_field() {
        let error = AppError::InvalidField {
            field: "price".to_owned(),
            reason: "operator 'contains' is not supported".to_owned(),
        };
        assert!(error.to_string().contains("'price'"));
    }
}
