use std::sync::Arc;

use tracing::debug;
use vellum_core::{AppError, AppResult, ContentTypeId};
use vellum_domain::{ContentItemProjection, ContentTypeDefinition};

use crate::filter_binder::FilterBinder;
use crate::order_by::{parse_order_by, resolve_order_by};
use crate::portable_filter::parse_filter;
use crate::query_ports::{
    BoundFilter, ContentItemQueryExecutor, ContentItemQueryPlan, ContentTypeRepository,
    FieldTarget, PageWindow, QueryPage, SearchColumn, SearchPredicate,
};
use crate::{CancellationSignal, JsonQuerySettings};

#[cfg(test)]
mod tests;

/// Query over the JSON payloads of one content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonQueryRequest {
    /// Queried content type.
    pub content_type_id: ContentTypeId,
    /// Columns searched for `search_term`; empty means the content type defaults.
    pub search_columns: Vec<String>,
    /// Free-text search term.
    pub search_term: Option<String>,
    /// Portable filter strings, combined with `and`.
    pub filters: Vec<String>,
    /// Requested page size; zero means the configured default.
    pub page_size: u32,
    /// One-based page number.
    pub page_number: u32,
    /// Comma-separated `"<field> <asc|desc>"` list.
    pub order_by: Option<String>,
}

impl JsonQueryRequest {
    /// Creates a request for the first page with default settings.
    #[must_use]
    pub fn new(content_type_id: ContentTypeId) -> Self {
        Self {
            content_type_id,
            search_columns: Vec::new(),
            search_term: None,
            filters: Vec::new(),
            page_size: 0,
            page_number: 1,
            order_by: None,
        }
    }
}

/// Plans JSON payload queries and runs them through an executor.
#[derive(Clone)]
pub struct JsonQueryEngine {
    content_types: Arc<dyn ContentTypeRepository>,
    executor: Arc<dyn ContentItemQueryExecutor>,
    settings: JsonQuerySettings,
}

impl JsonQueryEngine {
    /// Creates a query engine.
    #[must_use]
    pub fn new(
        content_types: Arc<dyn ContentTypeRepository>,
        executor: Arc<dyn ContentItemQueryExecutor>,
        settings: JsonQuerySettings,
    ) -> Self {
        Self {
            content_types,
            executor,
            settings,
        }
    }

    /// Returns the engine settings.
    #[must_use]
    pub fn settings(&self) -> &JsonQuerySettings {
        &self.settings
    }

    /// Loads a content type or fails with [`AppError::NotFound`].
    pub async fn load_content_type(
        &self,
        content_type_id: ContentTypeId,
    ) -> AppResult<ContentTypeDefinition> {
        self.content_types
            .find_content_type(content_type_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("content type '{content_type_id}' does not exist"))
            })
    }

    /// Returns one page of matching items and the total count.
    pub async fn query(
        &self,
        request: &JsonQueryRequest,
        cancellation: &CancellationSignal,
    ) -> AppResult<QueryPage<ContentItemProjection>> {
        let content_type = self.load_content_type(request.content_type_id).await?;
        self.query_content_type(&content_type, request, cancellation)
            .await
    }

    /// Counts matching items with the same filter and search as [`Self::query`].
    pub async fn count(
        &self,
        request: &JsonQueryRequest,
        cancellation: &CancellationSignal,
    ) -> AppResult<u64> {
        let content_type = self.load_content_type(request.content_type_id).await?;
        let plan = self.plan(&content_type, request)?;
        self.executor
            .count(&content_type, &plan, cancellation)
            .await
    }

    /// Runs a request against an already loaded content type.
    pub async fn query_content_type(
        &self,
        content_type: &ContentTypeDefinition,
        request: &JsonQueryRequest,
        cancellation: &CancellationSignal,
    ) -> AppResult<QueryPage<ContentItemProjection>> {
        let plan = self.plan(content_type, request)?;
        debug!(
            content_type_id = %plan.content_type_id,
            limit = plan.page.limit,
            offset = plan.page.offset,
            has_filter = plan.filter.is_some(),
            has_search = plan.search.is_some(),
            "running json query"
        );

        let items = self
            .executor
            .fetch_page(content_type, &plan, cancellation)
            .await?;
        let total_count = self
            .executor
            .count(content_type, &plan, cancellation)
            .await?;

        Ok(QueryPage { items, total_count })
    }

    /// Resolves a request into an executable plan.
    ///
    /// Filters are parsed and bound to the content type, search columns
    /// default to the content type's text fields, the order falls back to
    /// newest first and the page size is clamped to the configured limits.
    pub fn plan(
        &self,
        content_type: &ContentTypeDefinition,
        request: &JsonQueryRequest,
    ) -> AppResult<ContentItemQueryPlan> {
        if request.content_type_id != content_type.id() {
            return Err(AppError::Validation(format!(
                "request targets content type '{}' but '{}' was supplied",
                request.content_type_id,
                content_type.id()
            )));
        }

        if request.page_number == 0 {
            return Err(AppError::Validation(
                "page number must be one or greater".to_owned(),
            ));
        }

        let order_items = request
            .order_by
            .as_deref()
            .map(parse_order_by)
            .unwrap_or_default();
        let order_by = resolve_order_by(content_type, &order_items)?;

        let binder = FilterBinder::new(content_type, self.settings.date_format());
        let mut filters = Vec::new();
        for text in &request.filters {
            if text.trim().is_empty() {
                continue;
            }
            filters.push(binder.bind(&parse_filter(text)?)?);
        }
        let filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(BoundFilter::And(filters)),
        };

        let search = self.search_predicate(content_type, request)?;

        let limit = self.settings.effective_page_size(request.page_size);
        let offset = u64::from(request.page_number - 1) * u64::from(limit);

        Ok(ContentItemQueryPlan {
            content_type_id: content_type.id(),
            filter,
            search,
            order_by,
            page: PageWindow { limit, offset },
        })
    }

    fn search_predicate(
        &self,
        content_type: &ContentTypeDefinition,
        request: &JsonQueryRequest,
    ) -> AppResult<Option<SearchPredicate>> {
        let Some(term) = request
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        else {
            return Ok(None);
        };

        let names: Vec<String> = if request.search_columns.is_empty() {
            content_type
                .default_search_columns()
                .into_iter()
                .map(String::from)
                .collect()
        } else {
            request.search_columns.clone()
        };

        let columns = names
            .iter()
            .map(|name| {
                let field = content_type.require_field(name.as_str())?;
                Ok(SearchColumn {
                    target: FieldTarget::from(field),
                    field_type: field.field_type(),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Some(SearchPredicate {
            term: term.to_owned(),
            columns,
        }))
    }
}
