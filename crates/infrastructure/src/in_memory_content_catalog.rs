use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vellum_application::{ContentTypeRepository, ViewRepository};
use vellum_core::{AppError, AppResult, ContentTypeId, ViewId};
use vellum_domain::{ContentTypeDefinition, ViewDefinition};

/// In-memory catalog of content types and saved views.
#[derive(Debug, Default)]
pub struct InMemoryContentCatalog {
    content_types: RwLock<HashMap<ContentTypeId, ContentTypeDefinition>>,
    views: RwLock<HashMap<ViewId, ViewDefinition>>,
}

impl InMemoryContentCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            content_types: RwLock::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or replaces a content type.
    ///
    /// Developer names stay unique across content types.
    pub async fn save_content_type(&self, content_type: ContentTypeDefinition) -> AppResult<()> {
        let mut content_types = self.content_types.write().await;
        let name_taken = content_types.values().any(|existing| {
            existing.id() != content_type.id()
                && existing.developer_name() == content_type.developer_name()
        });
        if name_taken {
            return Err(AppError::Validation(format!(
                "content type '{}' already exists",
                content_type.developer_name()
            )));
        }

        content_types.insert(content_type.id(), content_type);
        Ok(())
    }

    /// Inserts or replaces a view after checking it against its content type.
    ///
    /// Search columns, sort fields and filter conditions must name fields
    /// of the content type, and filter operators must suit those fields.
    pub async fn save_view(&self, view: ViewDefinition) -> AppResult<()> {
        let content_types = self.content_types.read().await;
        let content_type = content_types.get(&view.content_type_id()).ok_or_else(|| {
            AppError::NotFound(format!(
                "content type '{}' of view '{}' does not exist",
                view.content_type_id(),
                view.developer_name()
            ))
        })?;

        for column in view.search_columns() {
            content_type.require_field(column.as_str())?;
        }
        for sort in view.sort() {
            content_type.require_field(sort.developer_name().as_str())?;
        }
        if let Some(filter) = view.filter() {
            for condition in filter.conditions() {
                let field = content_type.require_field(condition.field().as_str())?;
                if !field.field_type().supports(condition.operator()) {
                    return Err(AppError::InvalidField {
                        field: condition.field().as_str().to_owned(),
                        reason: format!(
                            "operator '{}' is not supported for {} fields",
                            condition.operator().as_str(),
                            field.field_type().as_str()
                        ),
                    });
                }
            }
        }
        drop(content_types);

        let mut views = self.views.write().await;
        let name_taken = views.values().any(|existing| {
            existing.id() != view.id() && existing.developer_name() == view.developer_name()
        });
        if name_taken {
            return Err(AppError::Validation(format!(
                "view '{}' already exists",
                view.developer_name()
            )));
        }

        views.insert(view.id(), view);
        Ok(())
    }

    /// Lists views of one content type ordered by developer name.
    pub async fn list_views(&self, content_type_id: ContentTypeId) -> Vec<ViewDefinition> {
        let mut views: Vec<ViewDefinition> = self
            .views
            .read()
            .await
            .values()
            .filter(|view| view.content_type_id() == content_type_id)
            .cloned()
            .collect();
        views.sort_by(|left, right| {
            left.developer_name()
                .as_str()
                .cmp(right.developer_name().as_str())
        });
        views
    }

    /// Finds a content type by developer name.
    pub async fn find_content_type_by_name(
        &self,
        developer_name: &str,
    ) -> Option<ContentTypeDefinition> {
        self.content_types
            .read()
            .await
            .values()
            .find(|content_type| content_type.developer_name().as_str() == developer_name)
            .cloned()
    }
}

#[async_trait]
impl ContentTypeRepository for InMemoryContentCatalog {
    async fn find_content_type(
        &self,
        content_type_id: ContentTypeId,
    ) -> AppResult<Option<ContentTypeDefinition>> {
        Ok(self.content_types.read().await.get(&content_type_id).cloned())
    }

    async fn list_content_types(&self) -> AppResult<Vec<ContentTypeDefinition>> {
        let mut values: Vec<ContentTypeDefinition> =
            self.content_types.read().await.values().cloned().collect();
        values.sort_by(|left, right| {
            left.developer_name()
                .as_str()
                .cmp(right.developer_name().as_str())
        });

        Ok(values)
    }
}

#[async_trait]
impl ViewRepository for InMemoryContentCatalog {
    async fn find_view(&self, view_id: ViewId) -> AppResult<Option<ViewDefinition>> {
        Ok(self.views.read().await.get(&view_id).cloned())
    }

    async fn find_view_by_name(&self, developer_name: &str) -> AppResult<Option<ViewDefinition>> {
        Ok(self
            .views
            .read()
            .await
            .values()
            .find(|view| view.developer_name().as_str() == developer_name)
            .cloned())
    }
}
