use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;
use vellum_core::{AppError, AppResult};

use crate::{BaseFieldType, DateFormat};

const GENERIC_DATE_TIME_PATTERNS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
];
const GENERIC_DATE_PATTERNS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Canonical text value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringFieldValue {
    value: String,
}

impl StringFieldValue {
    /// Normalizes raw JSON input into text.
    #[must_use]
    pub fn from_json(raw: &Value) -> Self {
        let value = match raw {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            Value::Array(_) | Value::Object(_) => raw.to_string(),
        };

        Self { value }
    }

    /// Returns the text.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Returns the display text.
    #[must_use]
    pub fn text(&self) -> String {
        self.value.clone()
    }

    /// Returns whether the text is non-empty.
    #[must_use]
    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Canonical decimal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecimalFieldValue {
    value: Option<Decimal>,
}

impl DecimalFieldValue {
    /// Normalizes raw JSON input into a decimal.
    ///
    /// Non-numeric text fails with [`AppError::Format`].
    pub fn from_json(raw: &Value) -> AppResult<Self> {
        match raw {
            Value::Null => Ok(Self::default()),
            Value::String(text) if text.trim().is_empty() => Ok(Self::default()),
            Value::String(text) => parse_decimal(text.trim()).map(Self::from_decimal),
            Value::Number(number) => parse_decimal(number.to_string().as_str()).map(Self::from_decimal),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(AppError::Format(format!(
                "'{raw}' is not a valid number"
            ))),
        }
    }

    /// Wraps an existing decimal.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Self {
        Self {
            value: Some(value.normalize()),
        }
    }

    /// Returns the decimal when present.
    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        self.value
    }

    /// Returns the normalized decimal text, or an empty string.
    #[must_use]
    pub fn text(&self) -> String {
        self.value.map(|value| value.to_string()).unwrap_or_default()
    }

    /// Returns whether a number is present.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// Canonical date-time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeFieldValue {
    value: Option<NaiveDateTime>,
}

impl DateTimeFieldValue {
    /// Normalizes raw JSON input into a date-time.
    ///
    /// Accepts RFC 3339, ISO 8601 date and date-time text, and `MM/dd/yyyy`.
    /// Unparsable text fails with [`AppError::Format`].
    pub fn from_json(raw: &Value) -> AppResult<Self> {
        Self::from_json_with_format(raw, None)
    }

    /// Normalizes raw JSON input, trying `date_format` before the generic patterns.
    pub fn from_json_with_format(raw: &Value, date_format: Option<&DateFormat>) -> AppResult<Self> {
        match raw {
            Value::Null => Ok(Self::default()),
            Value::String(text) if text.trim().is_empty() => Ok(Self::default()),
            Value::String(text) => date_format
                .and_then(|format| format.parse(text))
                .or_else(|| parse_generic_date_time(text.trim()))
                .map(Self::from_naive)
                .ok_or_else(|| AppError::Format(format!("'{text}' is not a valid date"))),
            Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => Err(
                AppError::Format(format!("'{raw}' is not a valid date")),
            ),
        }
    }

    /// Wraps an existing date-time.
    #[must_use]
    pub fn from_naive(value: NaiveDateTime) -> Self {
        Self { value: Some(value) }
    }

    /// Returns the date-time when present.
    #[must_use]
    pub fn value(&self) -> Option<NaiveDateTime> {
        self.value
    }

    /// Returns the calendar date when present.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.value.map(|value| value.date())
    }

    /// Returns ISO text: `yyyy-MM-dd` at midnight, full date-time otherwise.
    #[must_use]
    pub fn text(&self) -> String {
        match self.value {
            Some(value) if value.time() == NaiveTime::MIN => value.format("%Y-%m-%d").to_string(),
            Some(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            None => String::new(),
        }
    }

    /// Returns whether a date is present.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// Canonical boolean value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanFieldValue {
    value: bool,
    has_value: bool,
}

impl BooleanFieldValue {
    /// Normalizes raw JSON input into a boolean.
    pub fn from_json(raw: &Value) -> AppResult<Self> {
        let value = match raw {
            Value::Null => return Ok(Self::default()),
            Value::String(text) if text.trim().is_empty() => return Ok(Self::default()),
            Value::Bool(flag) => *flag,
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "checked" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(AppError::Format(format!("'{text}' is not a valid boolean")));
                }
            },
            Value::Number(number) => match number.as_i64() {
                Some(0) => false,
                Some(1) => true,
                _ => {
                    return Err(AppError::Format(format!("'{number}' is not a valid boolean")));
                }
            },
            Value::Array(_) | Value::Object(_) => {
                return Err(AppError::Format(format!("'{raw}' is not a valid boolean")));
            }
        };

        Ok(Self {
            value,
            has_value: true,
        })
    }

    /// Wraps a present flag.
    #[must_use]
    pub fn from_flag(value: bool) -> Self {
        Self {
            value,
            has_value: true,
        }
    }

    /// Returns the flag; absent input reads as `false`.
    #[must_use]
    pub fn value(&self) -> bool {
        self.value
    }

    /// Returns `true` or `false`.
    #[must_use]
    pub fn text(&self) -> String {
        self.value.to_string()
    }

    /// Returns whether the input carried a value.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.has_value
    }
}

/// Canonical identifier value.
///
/// Empty input is the nil GUID with `has_value() == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuidFieldValue {
    value: Uuid,
}

impl GuidFieldValue {
    /// Normalizes raw JSON input into a GUID.
    pub fn from_json(raw: &Value) -> AppResult<Self> {
        match raw {
            Value::Null => Ok(Self::default()),
            Value::String(text) if text.trim().is_empty() => Ok(Self::default()),
            Value::String(text) => Uuid::parse_str(text.trim())
                .map(|value| Self { value })
                .map_err(|error| AppError::Format(format!("'{text}' is not a valid identifier: {error}"))),
            _ => Err(AppError::Format(format!("'{raw}' is not a valid identifier"))),
        }
    }

    /// Wraps an existing GUID.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self { value }
    }

    /// Returns the GUID; absent input is [`Uuid::nil`].
    #[must_use]
    pub fn value(&self) -> Uuid {
        self.value
    }

    /// Returns the hyphenated lowercase GUID, or an empty string.
    #[must_use]
    pub fn text(&self) -> String {
        if self.has_value() {
            self.value.hyphenated().to_string()
        } else {
            String::new()
        }
    }

    /// Returns whether the GUID is non-nil.
    #[must_use]
    pub fn has_value(&self) -> bool {
        !self.value.is_nil()
    }
}

/// Canonical list of selected choices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArrayFieldValue {
    value: Vec<String>,
}

impl ArrayFieldValue {
    /// Normalizes raw JSON input into a list of strings.
    ///
    /// Accepts a JSON array, its serialized text, an empty string, or a
    /// single scalar which becomes a one-element list.
    pub fn from_json(raw: &Value) -> AppResult<Self> {
        match raw {
            Value::Null => Ok(Self::default()),
            Value::Array(items) => Ok(Self::from_items(items)),
            Value::String(text) if text.trim().is_empty() => Ok(Self::default()),
            Value::String(text) if text.trim_start().starts_with('[') => {
                serde_json::from_str::<Vec<Value>>(text)
                    .map(|items| Self::from_items(&items))
                    .map_err(|error| AppError::Format(format!("'{text}' is not a valid JSON array: {error}")))
            }
            Value::String(text) => Ok(Self {
                value: vec![text.clone()],
            }),
            Value::Bool(_) | Value::Number(_) => Ok(Self {
                value: vec![raw.to_string()],
            }),
            Value::Object(_) => Err(AppError::Format(format!("'{raw}' is not a valid array"))),
        }
    }

    fn from_items(items: &[Value]) -> Self {
        let value = items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect();

        Self { value }
    }

    /// Returns the selected items.
    #[must_use]
    pub fn value(&self) -> &[String] {
        self.value.as_slice()
    }

    /// Returns the items joined with `", "`.
    #[must_use]
    pub fn text(&self) -> String {
        self.value.join(", ")
    }

    /// Returns whether any item is selected.
    #[must_use]
    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }

    /// Returns whether the list contains `item`, ignoring ASCII case.
    #[must_use]
    pub fn contains_ignore_case(&self, item: &str) -> bool {
        self.value
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(item))
    }
}

/// Typed payload carried by a [`FieldValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    /// Text payload.
    Text(StringFieldValue),
    /// Decimal payload.
    Decimal(DecimalFieldValue),
    /// Date-time payload.
    DateTime(DateTimeFieldValue),
    /// Boolean payload.
    Boolean(BooleanFieldValue),
    /// Identifier payload.
    Guid(GuidFieldValue),
    /// List payload.
    Array(ArrayFieldValue),
}

/// Canonical value of one field, tagged with the field type that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    field_type: BaseFieldType,
    value: TypedValue,
}

impl FieldValue {
    pub(crate) fn new(field_type: BaseFieldType, value: TypedValue) -> Self {
        Self { field_type, value }
    }

    /// Returns the originating field type.
    #[must_use]
    pub fn field_type(&self) -> BaseFieldType {
        self.field_type
    }

    /// Returns the typed payload.
    #[must_use]
    pub fn value(&self) -> &TypedValue {
        &self.value
    }

    /// Returns the canonical display text.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.value {
            TypedValue::Text(value) => value.text(),
            TypedValue::Decimal(value) => value.text(),
            TypedValue::DateTime(value) => value.text(),
            TypedValue::Boolean(value) => value.text(),
            TypedValue::Guid(value) => value.text(),
            TypedValue::Array(value) => value.text(),
        }
    }

    /// Returns whether the raw input carried a value.
    #[must_use]
    pub fn has_value(&self) -> bool {
        match &self.value {
            TypedValue::Text(value) => value.has_value(),
            TypedValue::Decimal(value) => value.has_value(),
            TypedValue::DateTime(value) => value.has_value(),
            TypedValue::Boolean(value) => value.has_value(),
            TypedValue::Guid(value) => value.has_value(),
            TypedValue::Array(value) => value.has_value(),
        }
    }

    /// Compares two values of the same payload kind.
    ///
    /// Dates compare by calendar day. Absent values and lists are not ordered.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (&self.value, &other.value) {
            (TypedValue::Text(left), TypedValue::Text(right)) => {
                Some(left.value().cmp(right.value()))
            }
            (TypedValue::Decimal(left), TypedValue::Decimal(right)) => {
                left.value().zip(right.value()).map(|(left, right)| left.cmp(&right))
            }
            (TypedValue::DateTime(left), TypedValue::DateTime(right)) => {
                left.date().zip(right.date()).map(|(left, right)| left.cmp(&right))
            }
            (TypedValue::Boolean(left), TypedValue::Boolean(right)) => {
                Some(left.value().cmp(&right.value()))
            }
            (TypedValue::Guid(left), TypedValue::Guid(right)) => {
                Some(left.value().cmp(&right.value()))
            }
            _ => None,
        }
    }

    /// Returns a JSON rendering of the canonical value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        if !self.has_value() && !matches!(self.value, TypedValue::Array(_)) {
            return Value::Null;
        }

        match &self.value {
            TypedValue::Text(value) => Value::String(value.text()),
            TypedValue::Decimal(value) => serde_json::Number::from_str(value.text().as_str())
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(value.text())),
            TypedValue::DateTime(value) => Value::String(value.text()),
            TypedValue::Boolean(value) => Value::Bool(value.value()),
            TypedValue::Guid(value) => Value::String(value.text()),
            TypedValue::Array(value) => Value::Array(
                value
                    .value()
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

fn parse_decimal(text: &str) -> AppResult<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| AppError::Format(format!("'{text}' is not a valid number")))
}

fn parse_generic_date_time(text: &str) -> Option<NaiveDateTime> {
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.naive_utc());
    }

    GENERIC_DATE_TIME_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(text, pattern).ok())
        .or_else(|| {
            GENERIC_DATE_PATTERNS
                .iter()
                .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}
