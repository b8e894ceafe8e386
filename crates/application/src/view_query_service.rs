use std::sync::Arc;

use tracing::debug;
use vellum_core::{AppError, AppResult, ViewId};
use vellum_domain::{ContentItemProjection, ContentTypeDefinition, ViewDefinition};

use crate::order_by::{OrderByItem, parse_order_by};
use crate::query_ports::{QueryPage, ViewRepository};
use crate::{CancellationSignal, FilterCompiler, JsonQueryEngine, JsonQueryRequest};


/// Request-level additions to a saved view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQueryRequest {
    /// Free-text search term.
    pub search_term: Option<String>,
    /// Search columns overriding the view's.
    pub search_columns: Vec<String>,
    /// Extra portable filters ANDed with the view filter.
    pub filters: Vec<String>,
    /// Order overriding the view sort.
    pub order_by: Option<String>,
    /// Requested page size; zero means the configured default.
    pub page_size: u32,
    /// One-based page number.
    pub page_number: u32,
}

impl Default for ViewQueryRequest {
    fn default() -> Self {
        Self {
            search_term: None,
            search_columns: Vec::new(),
            filters: Vec::new(),
            order_by: None,
            page_size: 0,
            page_number: 1,
        }
    }
}

/// Runs saved views through the JSON query engine.
#[derive(Clone)]
pub struct ViewQueryService {
    views: Arc<dyn ViewRepository>,
    engine: JsonQueryEngine,
    compiler: FilterCompiler,
}

impl ViewQueryService {
    /// Creates a view query service.
    #[must_use]
    pub fn new(views: Arc<dyn ViewRepository>, engine: JsonQueryEngine) -> Self {
        let compiler = FilterCompiler::new(engine.settings().date_format().clone());
        Self {
            views,
            engine,
            compiler,
        }
    }

    /// Returns the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &JsonQueryEngine {
        &self.engine
    }

    /// Loads a view by identifier.
    pub async fn load_view(&self, view_id: ViewId) -> AppResult<ViewDefinition> {
        self.views
            .find_view(view_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("view '{view_id}' does not exist")))
    }

    /// Loads a view by developer name.
    pub async fn load_view_by_name(&self, developer_name: &str) -> AppResult<ViewDefinition> {
        self.views
            .find_view_by_name(developer_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("view '{developer_name}' does not exist")))
    }

    /// Loads the content type a view queries.
    pub async fn load_content_type(&self, view: &ViewDefinition) -> AppResult<ContentTypeDefinition> {
        self.engine.load_content_type(view.content_type_id()).await
    }

    /// Compiles the view's saved filter, if any.
    pub fn compile_view_filter(
        &self,
        content_type: &ContentTypeDefinition,
        view: &ViewDefinition,
    ) -> AppResult<Option<String>> {
        view.filter()
            .map(|filter| self.compiler.compile(content_type, filter))
            .transpose()
    }

    /// Merges a view with request-level additions.
    ///
    /// Search columns come from the request, then the view, then the
    /// content type defaults. Order comes from the request, then the view
    /// sort, then newest first.
    pub fn build_request(
        &self,
        content_type: &ContentTypeDefinition,
        view: &ViewDefinition,
        request: ViewQueryRequest,
    ) -> AppResult<JsonQueryRequest> {
        let mut filters = Vec::new();
        if let Some(compiled) = self.compile_view_filter(content_type, view)? {
            filters.push(compiled);
        }
        filters.extend(request.filters);

        let search_columns = if request.search_columns.is_empty() {
            view.search_columns()
                .iter()
                .map(|column| column.as_str().to_owned())
                .collect()
        } else {
            request.search_columns
        };

        let mut order_items = request
            .order_by
            .as_deref()
            .map(parse_order_by)
            .unwrap_or_default();
        if order_items.is_empty() {
            order_items = view.sort().iter().map(OrderByItem::from).collect();
        }
        let order_by = (!order_items.is_empty()).then(|| {
            order_items
                .iter()
                .map(|item| format!("{} {}", item.field, item.direction.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        });

        Ok(JsonQueryRequest {
            content_type_id: content_type.id(),
            search_columns,
            search_term: request.search_term,
            filters,
            page_size: request.page_size,
            page_number: request.page_number,
            order_by,
        })
    }

    /// Runs a view and returns one page with the total count.
    pub async fn query_view(
        &self,
        view_id: ViewId,
        request: ViewQueryRequest,
        cancellation: &CancellationSignal,
    ) -> AppResult<QueryPage<ContentItemProjection>> {
        let view = self.load_view(view_id).await?;
        self.query_loaded_view(&view, request, cancellation).await
    }

    /// Runs an already loaded view.
    pub async fn query_loaded_view(
        &self,
        view: &ViewDefinition,
        request: ViewQueryRequest,
        cancellation: &CancellationSignal,
    ) -> AppResult<QueryPage<ContentItemProjection>> {
        let content_type = self.load_content_type(view).await?;
        let request = self.build_request(&content_type, view, request)?;
        debug!(
            view = %view.developer_name(),
            filter_count = request.filters.len(),
            "querying view"
        );

        self.engine
            .query_content_type(&content_type, &request, cancellation)
            .await
    }
}
