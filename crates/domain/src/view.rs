use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vellum_core::{AppError, AppResult, ContentTypeId, DeveloperName, NonEmptyString, ViewId};

use crate::FilterNode;

/// Sort direction for view and request ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(AppError::Unsupported(format!(
                "unsupported sort direction '{value}'"
            ))),
        }
    }
}

/// One ordering term of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSort {
    developer_name: DeveloperName,
    direction: SortDirection,
}

impl ViewSort {
    /// Creates a validated sort term.
    pub fn new(developer_name: impl Into<String>, direction: SortDirection) -> AppResult<Self> {
        Ok(Self {
            developer_name: DeveloperName::new(developer_name)?,
            direction,
        })
    }

    /// Returns the sorted field.
    #[must_use]
    pub fn developer_name(&self) -> &DeveloperName {
        &self.developer_name
    }

    /// Returns the direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Saved combination of search columns, filter tree and sort order.
///
/// The view is consumed read-only; field references are checked against
/// the content type when the view is compiled or queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    id: ViewId,
    content_type_id: ContentTypeId,
    developer_name: DeveloperName,
    label: NonEmptyString,
    search_columns: Vec<DeveloperName>,
    filter: Option<FilterNode>,
    sort: Vec<ViewSort>,
}

impl ViewDefinition {
    /// Creates a validated view definition.
    pub fn new(
        id: ViewId,
        content_type_id: ContentTypeId,
        developer_name: impl Into<String>,
        label: impl Into<String>,
        search_columns: Vec<DeveloperName>,
        filter: Option<FilterNode>,
        sort: Vec<ViewSort>,
    ) -> AppResult<Self> {
        let mut seen_columns = HashSet::new();
        for column in &search_columns {
            if !seen_columns.insert(column.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate view search column '{column}'"
                )));
            }
        }

        let mut seen_sort = HashSet::new();
        for term in &sort {
            if !seen_sort.insert(term.developer_name().as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate view sort field '{}'",
                    term.developer_name()
                )));
            }
        }

        Ok(Self {
            id,
            content_type_id,
            developer_name: DeveloperName::new(developer_name)?,
            label: NonEmptyString::new(label)?,
            search_columns,
            filter,
            sort,
        })
    }

    /// Returns the view identifier.
    #[must_use]
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Returns the queried content type.
    #[must_use]
    pub fn content_type_id(&self) -> ContentTypeId {
        self.content_type_id
    }

    /// Returns the view developer name.
    #[must_use]
    pub fn developer_name(&self) -> &DeveloperName {
        &self.developer_name
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }

    /// Returns the configured search columns in order.
    #[must_use]
    pub fn search_columns(&self) -> &[DeveloperName] {
        &self.search_columns
    }

    /// Returns the saved filter tree.
    #[must_use]
    pub fn filter(&self) -> Option<&FilterNode> {
        self.filter.as_ref()
    }

    /// Returns the saved sort order.
    #[must_use]
    pub fn sort(&self) -> &[ViewSort] {
        &self.sort
    }
}
