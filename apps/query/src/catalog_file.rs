use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use uuid::Uuid;
use vellum_core::{AppError, AppResult, ContentTypeId, DeveloperName, ViewId};
use vellum_domain::{
    BaseFieldType, BooleanOperator, ConditionOperator, ContentTypeDefinition, ContentTypeField,
    FieldChoice, FilterCondition, FilterConditionGroup, FilterNode, SortDirection, ViewDefinition,
    ViewSort,
};
use vellum_infrastructure::InMemoryContentCatalog;

/// Catalog file: `{ "content_types": [...], "views": [...] }`.
#[derive(Debug, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub content_types: Vec<ContentTypeDocument>,
    #[serde(default)]
    pub views: Vec<ViewDocument>,
}

#[derive(Debug, Deserialize)]
pub struct ContentTypeDocument {
    pub id: Uuid,
    pub developer_name: String,
    pub label_singular: String,
    pub label_plural: String,
    pub primary_field: String,
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
}

#[derive(Debug, Deserialize)]
pub struct FieldDocument {
    pub developer_name: String,
    pub label: String,
    pub field_type: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub choices: Vec<ChoiceDocument>,
    pub related_content_type_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceDocument {
    pub developer_name: String,
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewDocument {
    pub id: Uuid,
    /// Developer name of the queried content type.
    pub content_type: String,
    pub developer_name: String,
    pub label: String,
    #[serde(default)]
    pub search_columns: Vec<String>,
    pub filter: Option<FilterNodeDocument>,
    #[serde(default)]
    pub sort: Vec<SortDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterNodeDocument {
    Condition {
        field: String,
        operator: ConditionOperator,
        operand: Option<String>,
    },
    Group {
        operator: BooleanOperator,
        children: Vec<FilterNodeDocument>,
    },
}

#[derive(Debug, Deserialize)]
pub struct SortDocument {
    pub field: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    SortDirection::Asc.as_str().to_owned()
}

impl ContentTypeDocument {
    fn into_definition(self) -> AppResult<ContentTypeDefinition> {
        let fields = self
            .fields
            .into_iter()
            .map(FieldDocument::into_field)
            .collect::<AppResult<Vec<_>>>()?;

        ContentTypeDefinition::new(
            ContentTypeId::from_uuid(self.id),
            self.developer_name,
            self.label_singular,
            self.label_plural,
            self.primary_field,
            fields,
        )
    }
}

impl FieldDocument {
    fn into_field(self) -> AppResult<ContentTypeField> {
        let field_type = BaseFieldType::from_str(self.field_type.as_str())?;
        let choices = self
            .choices
            .into_iter()
            .map(|choice| FieldChoice::new(choice.developer_name, choice.label))
            .collect::<AppResult<Vec<_>>>()?;

        ContentTypeField::new(
            self.developer_name,
            self.label,
            field_type,
            self.is_required,
            choices,
            self.related_content_type_id.map(ContentTypeId::from_uuid),
        )
    }
}

impl FilterNodeDocument {
    fn into_node(self) -> AppResult<FilterNode> {
        match self {
            Self::Condition {
                field,
                operator,
                operand,
            } => Ok(FilterCondition::new(field, operator, operand)?.into()),
            Self::Group { operator, children } => {
                let children = children
                    .into_iter()
                    .map(Self::into_node)
                    .collect::<AppResult<Vec<_>>>()?;
                Ok(FilterConditionGroup::new(operator, children)?.into())
            }
        }
    }
}

impl ViewDocument {
    fn into_definition(self, content_type_id: ContentTypeId) -> AppResult<ViewDefinition> {
        let search_columns = self
            .search_columns
            .into_iter()
            .map(DeveloperName::new)
            .collect::<AppResult<Vec<_>>>()?;
        let filter = self.filter.map(FilterNodeDocument::into_node).transpose()?;
        let sort = self
            .sort
            .into_iter()
            .map(|term| ViewSort::new(term.field, SortDirection::from_str(term.direction.as_str())?))
            .collect::<AppResult<Vec<_>>>()?;

        ViewDefinition::new(
            ViewId::from_uuid(self.id),
            content_type_id,
            self.developer_name,
            self.label,
            search_columns,
            filter,
            sort,
        )
    }
}

/// Parses catalog JSON into a validated in-memory catalog.
pub async fn catalog_from_json(json: &str) -> AppResult<InMemoryContentCatalog> {
    let document: CatalogDocument = serde_json::from_str(json)
        .map_err(|error| AppError::Validation(format!("invalid catalog document: {error}")))?;

    let catalog = InMemoryContentCatalog::new();
    for content_type in document.content_types {
        catalog
            .save_content_type(content_type.into_definition()?)
            .await?;
    }

    for view in document.views {
        let content_type = catalog
            .find_content_type_by_name(view.content_type.as_str())
            .await
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "content type '{}' of view '{}' does not exist",
                    view.content_type, view.developer_name
                ))
            })?;
        catalog
            .save_view(view.into_definition(content_type.id())?)
            .await?;
    }

    Ok(catalog)
}

/// Reads and parses the catalog file.
pub async fn load_catalog(path: &Path) -> AppResult<InMemoryContentCatalog> {
    let json = std::fs::read_to_string(path).map_err(|error| {
        AppError::Validation(format!(
            "failed to read catalog file '{}': {error}",
            path.display()
        ))
    })?;

    catalog_from_json(json.as_str()).await
}
