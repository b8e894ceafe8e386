use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use vellum_application::{CancellationSignal, ContentItemQueryExecutor, ContentItemQueryPlan};
use vellum_core::{AppError, AppResult};
use vellum_domain::{ContentItem, ContentItemProjection, ContentTypeDefinition, DatabaseProvider, DateFormat};

use crate::{ContentItemStorageLayout, JsonQuerySqlRenderer, SqlStatement};

/// Runs rendered statements against one database connection.
///
/// Rows are returned in the column order of
/// [`ContentItemStorageLayout::selected_columns`].
#[async_trait]
pub trait SqlStatementRunner: Send + Sync {
    /// Returns the backend the runner talks to.
    fn provider(&self) -> DatabaseProvider;

    /// Runs a select statement and decodes content item rows.
    async fn fetch_content_items(&self, statement: &SqlStatement) -> AppResult<Vec<ContentItem>>;

    /// Runs a count statement and returns the single scalar.
    async fn fetch_count(&self, statement: &SqlStatement) -> AppResult<i64>;
}

/// Query executor rendering plans to SQL for the configured provider.
#[derive(Clone)]
pub struct SqlContentItemQueryExecutor {
    renderer: JsonQuerySqlRenderer,
    runner: Arc<dyn SqlStatementRunner>,
}

impl SqlContentItemQueryExecutor {
    /// Creates an executor for the provider detected from `connection_string`.
    ///
    /// Fails when the connection string is unrecognized or names a
    /// different backend than the runner.
    pub fn new(
        connection_string: &str,
        runner: Arc<dyn SqlStatementRunner>,
        layout: ContentItemStorageLayout,
        date_format: DateFormat,
    ) -> AppResult<Self> {
        let provider = DatabaseProvider::detect(connection_string)?;
        if runner.provider() != provider {
            return Err(AppError::Unsupported(format!(
                "connection string targets '{}' but the statement runner targets '{}'",
                provider.as_str(),
                runner.provider().as_str()
            )));
        }

        Ok(Self {
            renderer: JsonQuerySqlRenderer::new(provider, layout, date_format),
            runner,
        })
    }

    /// Returns the renderer, for explaining queries without running them.
    #[must_use]
    pub fn renderer(&self) -> &JsonQuerySqlRenderer {
        &self.renderer
    }
}

#[async_trait]
impl ContentItemQueryExecutor for SqlContentItemQueryExecutor {
    async fn fetch_page(
        &self,
        content_type: &ContentTypeDefinition,
        plan: &ContentItemQueryPlan,
        cancellation: &CancellationSignal,
    ) -> AppResult<Vec<ContentItemProjection>> {
        let statement = self.renderer.render_select(plan)?;
        debug!(
            provider = self.renderer.provider().as_str(),
            content_type = %content_type.developer_name(),
            param_count = statement.params.len(),
            sql = %statement.sql,
            "running content item select"
        );

        let items = cancellation
            .guard(
                "content item query",
                self.runner.fetch_content_items(&statement),
            )
            .await?;

        items
            .iter()
            .map(|item| item.project(content_type, self.renderer.date_format()))
            .collect()
    }

    async fn count(
        &self,
        content_type: &ContentTypeDefinition,
        plan: &ContentItemQueryPlan,
        cancellation: &CancellationSignal,
    ) -> AppResult<u64> {
        let statement = self.renderer.render_count(plan)?;
        debug!(
            provider = self.renderer.provider().as_str(),
            content_type = %content_type.developer_name(),
            sql = %statement.sql,
            "running content item count"
        );

        let count = cancellation
            .guard("content item count", self.runner.fetch_count(&statement))
            .await?;

        u64::try_from(count).map_err(|_| {
            AppError::Internal(format!(
                "content item count for '{}' returned negative value {count}",
                content_type.developer_name()
            ))
        })
    }
}
