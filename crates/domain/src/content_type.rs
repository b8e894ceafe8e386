use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vellum_core::{AppError, AppResult, ContentTypeId, DeveloperName, NonEmptyString};

use crate::BaseFieldType;

/// Column every content item carries outside of its JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltInColumn {
    /// Item identifier.
    Id,
    /// Creation timestamp.
    CreationTime,
    /// Last modification timestamp.
    LastModificationTime,
    /// Creating user.
    CreatorUserId,
    /// Last modifying user.
    LastModifierUserId,
    /// Publication flag.
    IsPublished,
}

impl BuiltInColumn {
    /// Every built-in column in projection order.
    pub const ALL: [Self; 6] = [
        Self::Id,
        Self::CreationTime,
        Self::LastModificationTime,
        Self::CreatorUserId,
        Self::LastModifierUserId,
        Self::IsPublished,
    ];

    /// Returns the developer name used in filters and order-by input.
    #[must_use]
    pub fn developer_name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreationTime => "creation_time",
            Self::LastModificationTime => "last_modification_time",
            Self::CreatorUserId => "creator_user_id",
            Self::LastModifierUserId => "last_modifier_user_id",
            Self::IsPublished => "is_published",
        }
    }

    /// Returns the field type that governs operators and values.
    #[must_use]
    pub fn field_type(&self) -> BaseFieldType {
        match self {
            Self::Id | Self::CreatorUserId | Self::LastModifierUserId => BaseFieldType::Id,
            Self::CreationTime | Self::LastModificationTime => BaseFieldType::Date,
            Self::IsPublished => BaseFieldType::Checkbox,
        }
    }
}

impl FromStr for BuiltInColumn {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|column| column.developer_name() == value)
            .ok_or_else(|| AppError::NotFound(format!("built-in column '{value}' does not exist")))
    }
}

/// One selectable choice of a radio, dropdown or multiple select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChoice {
    developer_name: DeveloperName,
    label: NonEmptyString,
}

impl FieldChoice {
    /// Creates a validated choice.
    pub fn new(developer_name: impl Into<String>, label: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            developer_name: DeveloperName::new(developer_name)?,
            label: NonEmptyString::new(label)?,
        })
    }

    /// Returns the stored value.
    #[must_use]
    pub fn developer_name(&self) -> &DeveloperName {
        &self.developer_name
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }
}

/// Administrator-defined field of a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeField {
    developer_name: DeveloperName,
    label: NonEmptyString,
    field_type: BaseFieldType,
    is_required: bool,
    #[serde(default)]
    choices: Vec<FieldChoice>,
    #[serde(default)]
    related_content_type_id: Option<ContentTypeId>,
}

impl ContentTypeField {
    /// Creates a validated field definition.
    pub fn new(
        developer_name: impl Into<String>,
        label: impl Into<String>,
        field_type: BaseFieldType,
        is_required: bool,
        choices: Vec<FieldChoice>,
        related_content_type_id: Option<ContentTypeId>,
    ) -> AppResult<Self> {
        let developer_name = DeveloperName::new(developer_name)?;

        if field_type == BaseFieldType::Id {
            return Err(AppError::Validation(format!(
                "field '{developer_name}' cannot use the internal 'id' type"
            )));
        }

        if BuiltInColumn::from_str(developer_name.as_str()).is_ok() {
            return Err(AppError::Validation(format!(
                "field '{developer_name}' collides with a built-in column"
            )));
        }

        if field_type.has_choices() {
            if choices.is_empty() {
                return Err(AppError::Validation(format!(
                    "field '{developer_name}' of type '{field_type}' requires at least one choice"
                )));
            }

            let mut seen = HashSet::new();
            for choice in &choices {
                if !seen.insert(choice.developer_name().as_str()) {
                    return Err(AppError::Validation(format!(
                        "field '{developer_name}' has duplicate choice '{}'",
                        choice.developer_name()
                    )));
                }
            }
        } else if !choices.is_empty() {
            return Err(AppError::Validation(format!(
                "field '{developer_name}' of type '{field_type}' does not accept choices"
            )));
        }

        match (field_type, related_content_type_id) {
            (BaseFieldType::OneToOneRelationship, None) => {
                return Err(AppError::Validation(format!(
                    "relationship field '{developer_name}' requires a related content type"
                )));
            }
            (BaseFieldType::OneToOneRelationship, Some(_)) | (_, None) => {}
            (_, Some(_)) => {
                return Err(AppError::Validation(format!(
                    "field '{developer_name}' of type '{field_type}' cannot reference a content type"
                )));
            }
        }

        Ok(Self {
            developer_name,
            label: NonEmptyString::new(label)?,
            field_type,
            is_required,
            choices,
            related_content_type_id,
        })
    }

    /// Returns the developer name, also the JSON key of the stored value.
    #[must_use]
    pub fn developer_name(&self) -> &DeveloperName {
        &self.developer_name
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }

    /// Returns the field type.
    #[must_use]
    pub fn field_type(&self) -> BaseFieldType {
        self.field_type
    }

    /// Returns whether a value is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.is_required
    }

    /// Returns the configured choices.
    #[must_use]
    pub fn choices(&self) -> &[FieldChoice] {
        &self.choices
    }

    /// Returns the related content type of a relationship field.
    #[must_use]
    pub fn related_content_type_id(&self) -> Option<ContentTypeId> {
        self.related_content_type_id
    }
}

/// Field reference resolved against a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedField<'a> {
    /// Built-in table column.
    BuiltIn(BuiltInColumn),
    /// Value stored under a JSON key.
    Custom(&'a ContentTypeField),
}

impl ResolvedField<'_> {
    /// Returns the developer name.
    #[must_use]
    pub fn developer_name(&self) -> &str {
        match self {
            Self::BuiltIn(column) => column.developer_name(),
            Self::Custom(field) => field.developer_name().as_str(),
        }
    }

    /// Returns the governing field type.
    #[must_use]
    pub fn field_type(&self) -> BaseFieldType {
        match self {
            Self::BuiltIn(column) => column.field_type(),
            Self::Custom(field) => field.field_type(),
        }
    }
}

/// Administrator-defined schema of content items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeDefinition {
    id: ContentTypeId,
    developer_name: DeveloperName,
    label_singular: NonEmptyString,
    label_plural: NonEmptyString,
    primary_field: DeveloperName,
    fields: Vec<ContentTypeField>,
}

impl ContentTypeDefinition {
    /// Creates a validated content type definition.
    pub fn new(
        id: ContentTypeId,
        developer_name: impl Into<String>,
        label_singular: impl Into<String>,
        label_plural: impl Into<String>,
        primary_field: impl Into<String>,
        fields: Vec<ContentTypeField>,
    ) -> AppResult<Self> {
        let developer_name = DeveloperName::new(developer_name)?;
        let primary_field = DeveloperName::new(primary_field)?;

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.developer_name().as_str()) {
                return Err(AppError::Validation(format!(
                    "content type '{developer_name}' has duplicate field '{}'",
                    field.developer_name()
                )));
            }
        }

        let Some(primary) = fields
            .iter()
            .find(|field| field.developer_name() == &primary_field)
        else {
            return Err(AppError::Validation(format!(
                "primary field '{primary_field}' does not exist on content type '{developer_name}'"
            )));
        };

        if !primary.field_type().is_text_like() {
            return Err(AppError::Validation(format!(
                "primary field '{primary_field}' must be a text field, found '{}'",
                primary.field_type()
            )));
        }

        Ok(Self {
            id,
            developer_name,
            label_singular: NonEmptyString::new(label_singular)?,
            label_plural: NonEmptyString::new(label_plural)?,
            primary_field,
            fields,
        })
    }

    /// Returns the content type identifier.
    #[must_use]
    pub fn id(&self) -> ContentTypeId {
        self.id
    }

    /// Returns the developer name.
    #[must_use]
    pub fn developer_name(&self) -> &DeveloperName {
        &self.developer_name
    }

    /// Returns the singular label.
    #[must_use]
    pub fn label_singular(&self) -> &NonEmptyString {
        &self.label_singular
    }

    /// Returns the plural label.
    #[must_use]
    pub fn label_plural(&self) -> &NonEmptyString {
        &self.label_plural
    }

    /// Returns the primary field name.
    #[must_use]
    pub fn primary_field(&self) -> &DeveloperName {
        &self.primary_field
    }

    /// Returns the custom fields.
    #[must_use]
    pub fn fields(&self) -> &[ContentTypeField] {
        &self.fields
    }

    /// Finds a custom field by developer name.
    #[must_use]
    pub fn field(&self, developer_name: &str) -> Option<&ContentTypeField> {
        self.fields
            .iter()
            .find(|field| field.developer_name().as_str() == developer_name)
    }

    /// Resolves a developer name to a built-in column or a custom field.
    #[must_use]
    pub fn resolve_field(&self, developer_name: &str) -> Option<ResolvedField<'_>> {
        BuiltInColumn::from_str(developer_name)
            .ok()
            .map(ResolvedField::BuiltIn)
            .or_else(|| self.field(developer_name).map(ResolvedField::Custom))
    }

    /// Resolves a developer name or fails with [`AppError::InvalidField`].
    pub fn require_field(&self, developer_name: &str) -> AppResult<ResolvedField<'_>> {
        self.resolve_field(developer_name)
            .ok_or_else(|| AppError::InvalidField {
                field: developer_name.to_owned(),
                reason: format!(
                    "field does not exist on content type '{}'",
                    self.developer_name
                ),
            })
    }

    /// Returns the columns searched when a request names none: the
    /// primary field first, then every other text field.
    #[must_use]
    pub fn default_search_columns(&self) -> Vec<DeveloperName> {
        std::iter::once(self.primary_field.clone())
            .chain(
                self.fields
                    .iter()
                    .filter(|field| {
                        field.field_type().is_text_like() && field.developer_name() != &self.primary_field
                    })
                    .map(|field| field.developer_name().clone()),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use vellum_core::{AppError, ContentTypeId};

    use super::{BuiltInColumn, ContentTypeDefinition, ContentTypeField, FieldChoice, ResolvedField};
    use crate::BaseFieldType;

    fn field(name: &str, field_type: BaseFieldType) -> ContentTypeField {
        ContentTypeField::new(name, name, field_type, false, Vec::new(), None)
            .unwrap_or_else(|_| unreachable!())
    }

    fn article() -> ContentTypeDefinition {
        ContentTypeDefinition::new(
            ContentTypeId::new(),
            "article",
            "Article",
            "Articles",
            "title",
            vec![
                field("summary", BaseFieldType::LongText),
                field("title", BaseFieldType::SingleLineText),
                field("price", BaseFieldType::Number),
                field("body", BaseFieldType::Wysiwyg),
            ],
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn default_search_columns_start_with_primary_field() {
        let names: Vec<String> = article()
            .default_search_columns()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, vec!["title", "summary", "body"]);
    }

    #[test]
    fn resolves_built_in_and_custom_fields() {
        let article = article();
        assert_eq!(
            article.resolve_field("creation_time"),
            Some(ResolvedField::BuiltIn(BuiltInColumn::CreationTime))
        );
        assert_eq!(
            article.resolve_field("price").map(|field| field.field_type()),
            Some(BaseFieldType::Number)
        );
        assert!(matches!(
            article.require_field("missing"),
            Err(AppError::InvalidField { field, .. }) if field == "missing"
        ));
    }

    #[test]
    fn choice_fields_require_choices() {
        let result = ContentTypeField::new("color", "Color", BaseFieldType::Dropdown, false, Vec::new(), None);
        assert!(result.is_err());

        let choices = vec![FieldChoice::new("red", "Red").unwrap_or_else(|_| unreachable!())];
        let result = ContentTypeField::new("title", "Title", BaseFieldType::SingleLineText, false, choices, None);
        assert!(result.is_err());
    }

    #[test]
    fn relationship_fields_require_target() {
        let result = ContentTypeField::new(
            "author",
            "Author",
            BaseFieldType::OneToOneRelationship,
            false,
            Vec::new(),
            None,
        );
        assert!(result.is_err());

        let result = ContentTypeField::new(
            "author",
            "Author",
            BaseFieldType::OneToOneRelationship,
            false,
            Vec::new(),
            Some(ContentTypeId::new()),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn fields_cannot_shadow_built_in_columns() {
        let result = ContentTypeField::new("id", "Id", BaseFieldType::SingleLineText, false, Vec::new(), None);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn primary_field_must_be_text() {
        let result = ContentTypeDefinition::new(
            ContentTypeId::new(),
            "product",
            "Product",
            "Products",
            "price",
            vec![field("price", BaseFieldType::Number)],
        );
        assert!(result.is_err());
    }
}
