use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use vellum_core::{AppResult, ContentTypeId};

use crate::field_value::{BooleanFieldValue, DateTimeFieldValue, GuidFieldValue, TypedValue};
use crate::{BuiltInColumn, ContentTypeDefinition, DateFormat, FieldValue, ResolvedField};

/// Stored content item with its published JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    id: Uuid,
    content_type_id: ContentTypeId,
    creation_time: DateTime<Utc>,
    last_modification_time: Option<DateTime<Utc>>,
    creator_user_id: Option<Uuid>,
    last_modifier_user_id: Option<Uuid>,
    is_published: bool,
    published_content: Map<String, Value>,
}

impl ContentItem {
    /// Creates a content item.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: Uuid,
        content_type_id: ContentTypeId,
        creation_time: DateTime<Utc>,
        last_modification_time: Option<DateTime<Utc>>,
        creator_user_id: Option<Uuid>,
        last_modifier_user_id: Option<Uuid>,
        is_published: bool,
        published_content: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            content_type_id,
            creation_time,
            last_modification_time,
            creator_user_id,
            last_modifier_user_id,
            is_published,
            published_content,
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the owning content type.
    #[must_use]
    pub fn content_type_id(&self) -> ContentTypeId {
        self.content_type_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    /// Returns the last modification timestamp.
    #[must_use]
    pub fn last_modification_time(&self) -> Option<DateTime<Utc>> {
        self.last_modification_time
    }

    /// Returns whether the item is published.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.is_published
    }

    /// Returns the raw published payload.
    #[must_use]
    pub fn published_content(&self) -> &Map<String, Value> {
        &self.published_content
    }

    /// Returns the raw JSON stored for a field, `null` when absent.
    #[must_use]
    pub fn raw_value(&self, developer_name: &str) -> &Value {
        self.published_content
            .get(developer_name)
            .unwrap_or(&Value::Null)
    }

    /// Returns the canonical value of a resolved field.
    pub fn field_value(
        &self,
        field: ResolvedField<'_>,
        date_format: &DateFormat,
    ) -> AppResult<FieldValue> {
        let field = match field {
            ResolvedField::BuiltIn(column) => return Ok(self.built_in_value(column)),
            ResolvedField::Custom(field) => field,
        };

        field.field_type().value_from_with_format(
            self.raw_value(field.developer_name().as_str()),
            Some(date_format),
        )
    }

    fn built_in_value(&self, column: BuiltInColumn) -> FieldValue {
        let guid = |value: Option<Uuid>| {
            TypedValue::Guid(value.map(GuidFieldValue::from_uuid).unwrap_or_default())
        };
        let value = match column {
            BuiltInColumn::Id => guid(Some(self.id)),
            BuiltInColumn::CreatorUserId => guid(self.creator_user_id),
            BuiltInColumn::LastModifierUserId => guid(self.last_modifier_user_id),
            BuiltInColumn::CreationTime => {
                TypedValue::DateTime(DateTimeFieldValue::from_naive(self.creation_time.naive_utc()))
            }
            BuiltInColumn::LastModificationTime => TypedValue::DateTime(
                self.last_modification_time
                    .map(|value| DateTimeFieldValue::from_naive(value.naive_utc()))
                    .unwrap_or_default(),
            ),
            BuiltInColumn::IsPublished => TypedValue::Boolean(BooleanFieldValue::from_flag(self.is_published)),
        };

        FieldValue::new(column.field_type(), value)
    }

    /// Projects the item through the content type's field definitions.
    ///
    /// Stored values that no longer parse for their field type fail with a
    /// format error.
    pub fn project(
        &self,
        content_type: &ContentTypeDefinition,
        date_format: &DateFormat,
    ) -> AppResult<ContentItemProjection> {
        let mut fields = BTreeMap::new();
        for field in content_type.fields() {
            let value = self.field_value(ResolvedField::Custom(field), date_format)?;
            fields.insert(field.developer_name().as_str().to_owned(), value);
        }

        Ok(ContentItemProjection {
            id: self.id,
            content_type_id: self.content_type_id,
            creation_time: self.creation_time,
            last_modification_time: self.last_modification_time,
            creator_user_id: self.creator_user_id,
            last_modifier_user_id: self.last_modifier_user_id,
            is_published: self.is_published,
            fields,
        })
    }
}

/// Query result row with typed field values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItemProjection {
    /// Item identifier.
    pub id: Uuid,
    /// Owning content type.
    pub content_type_id: ContentTypeId,
    /// Creation timestamp.
    pub creation_time: DateTime<Utc>,
    /// Last modification timestamp.
    pub last_modification_time: Option<DateTime<Utc>>,
    /// Creating user.
    pub creator_user_id: Option<Uuid>,
    /// Last modifying user.
    pub last_modifier_user_id: Option<Uuid>,
    /// Publication flag.
    pub is_published: bool,
    /// Field values keyed by developer name.
    pub fields: BTreeMap<String, FieldValue>,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::{Map, Value, json};
    use uuid::Uuid;
    use vellum_core::{AppError, ContentTypeId};

    use super::ContentItem;
    use crate::{
        BaseFieldType, BuiltInColumn, ContentTypeDefinition, ContentTypeField, DateFormat,
        ResolvedField,
    };

    fn content_type() -> ContentTypeDefinition {
        ContentTypeDefinition::new(
            ContentTypeId::new(),
            "article",
            "Article",
            "Articles",
            "title",
            vec![
                ContentTypeField::new("title", "Title", BaseFieldType::SingleLineText, true, Vec::new(), None)
                    .unwrap_or_else(|_| unreachable!()),
                ContentTypeField::new("price", "Price", BaseFieldType::Number, false, Vec::new(), None)
                    .unwrap_or_else(|_| unreachable!()),
            ],
        )
        .unwrap_or_else(|_| unreachable!())
    }

    fn item(content: Value) -> ContentItem {
        let Value::Object(content) = content else {
            unreachable!()
        };
        ContentItem::new(
            Uuid::new_v4(),
            ContentTypeId::new(),
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().unwrap_or_else(|| unreachable!()),
            None,
            None,
            None,
            true,
            content,
        )
    }

    #[test]
    fn projects_missing_values_as_absent() {
        let projection = item(json!({ "title": "Hello" }))
            .project(&content_type(), &DateFormat::default())
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(projection.fields["title"].text(), "Hello");
        assert!(!projection.fields["price"].has_value());
    }

    #[test]
    fn projection_fails_on_corrupt_numbers() {
        let result = item(json!({ "title": "Hello", "price": "cheap" }))
            .project(&content_type(), &DateFormat::default());
        assert!(matches!(result, Err(AppError::Format(_))));
    }

    #[test]
    fn built_in_columns_have_typed_values() {
        let item = item(Value::Object(Map::new()));
        let format = DateFormat::default();

        let published = item
            .field_value(ResolvedField::BuiltIn(BuiltInColumn::IsPublished), &format)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(published.text(), "true");

        let created = item
            .field_value(ResolvedField::BuiltIn(BuiltInColumn::CreationTime), &format)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(created.text(), "2024-01-02T03:04:05");

        let modifier = item
            .field_value(ResolvedField::BuiltIn(BuiltInColumn::LastModifierUserId), &format)
            .unwrap_or_else(|_| unreachable!());
        assert!(!modifier.has_value());
    }
}
