use vellum_application::{ContentItemQueryPlan, FieldTarget, OrderTerm, PageWindow};
use vellum_core::{AppError, AppResult};
use vellum_domain::sql_fragments::{json_array_value, json_text_value, qualified_column, quote_identifier};
use vellum_domain::{BaseFieldType, BuiltInColumn, DatabaseProvider, DateFormat};

use crate::ContentItemStorageLayout;

mod predicates;
mod statement;


pub use statement::{SqlParam, SqlStatement};
pub(crate) use statement::SqlStatementBuilder;

/// Renders content item query plans as parameterized SQL for one provider.
///
/// Every leaf predicate renders as a two-valued condition, so `NOT` over a
/// missing or unparsable value yields true, matching in-memory evaluation.
#[derive(Debug, Clone)]
pub struct JsonQuerySqlRenderer {
    provider: DatabaseProvider,
    layout: ContentItemStorageLayout,
    date_format: DateFormat,
}

impl JsonQuerySqlRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new(
        provider: DatabaseProvider,
        layout: ContentItemStorageLayout,
        date_format: DateFormat,
    ) -> Self {
        Self {
            provider,
            layout,
            date_format,
        }
    }

    /// Returns the target provider.
    #[must_use]
    pub fn provider(&self) -> DatabaseProvider {
        self.provider
    }

    /// Returns the storage layout.
    #[must_use]
    pub fn layout(&self) -> &ContentItemStorageLayout {
        &self.layout
    }

    /// Returns the date format used for stored date text.
    #[must_use]
    pub fn date_format(&self) -> &DateFormat {
        &self.date_format
    }

    /// Renders the page query: filtered, searched, ordered and windowed.
    pub fn render_select(&self, plan: &ContentItemQueryPlan) -> AppResult<SqlStatement> {
        let mut builder = SqlStatementBuilder::new(self.provider);
        let columns = self
            .layout
            .selected_columns()
            .into_iter()
            .map(|column| self.qualified(column))
            .collect::<Vec<_>>()
            .join(", ");

        builder.push("SELECT ").push(columns);
        self.push_from_where(&mut builder, plan)?;
        builder
            .push(" ORDER BY ")
            .push(self.order_by_clause(&plan.order_by));
        self.push_page(&mut builder, plan.page)?;

        Ok(builder.build())
    }

    /// Renders the total count query, ignoring order and paging.
    pub fn render_count(&self, plan: &ContentItemQueryPlan) -> AppResult<SqlStatement> {
        let mut builder = SqlStatementBuilder::new(self.provider);
        builder.push("SELECT COUNT(*)");
        self.push_from_where(&mut builder, plan)?;

        Ok(builder.build())
    }

    fn push_from_where(
        &self,
        builder: &mut SqlStatementBuilder,
        plan: &ContentItemQueryPlan,
    ) -> AppResult<()> {
        builder
            .push(" FROM ")
            .push(quote_identifier(self.provider, self.layout.table()))
            .push(" AS ")
            .push(quote_identifier(self.provider, self.layout.alias()))
            .push(" WHERE ")
            .push(self.qualified(self.layout.content_type_id_column()))
            .push(" = ")
            .push_bind(SqlParam::Uuid(plan.content_type_id.as_uuid()));

        if let Some(filter) = &plan.filter {
            builder.push(" AND ");
            self.render_filter(builder, filter)?;
        }

        if let Some(search) = &plan.search
            && !search.columns.is_empty()
        {
            builder.push(" AND ");
            self.render_search(builder, search);
        }

        Ok(())
    }

    fn order_by_clause(&self, terms: &[OrderTerm]) -> String {
        let mut parts: Vec<String> = terms
            .iter()
            .map(|term| match &term.target {
                FieldTarget::Column(column) => {
                    format!("{} {}", self.column(*column), term.direction.as_sql())
                }
                FieldTarget::JsonKey(key) => term.field_type.order_by_expression(
                    self.provider,
                    self.layout.alias(),
                    self.layout.json_column(),
                    key.as_str(),
                    term.direction,
                    Some(&self.date_format),
                ),
            })
            .collect();

        let ordered_by_id = terms
            .iter()
            .any(|term| term.target == FieldTarget::Column(BuiltInColumn::Id));
        if !ordered_by_id {
            parts.push(format!("{} ASC", self.column(BuiltInColumn::Id)));
        }

        parts.join(", ")
    }

    fn push_page(&self, builder: &mut SqlStatementBuilder, page: PageWindow) -> AppResult<()> {
        let limit = SqlParam::Integer(i64::from(page.limit));
        let offset = SqlParam::Integer(i64::try_from(page.offset).map_err(|_| {
            AppError::Validation(format!("page offset {} is out of range", page.offset))
        })?);

        match self.provider {
            DatabaseProvider::Postgres => {
                builder
                    .push(" LIMIT ")
                    .push_bind(limit)
                    .push(" OFFSET ")
                    .push_bind(offset);
            }
            DatabaseProvider::SqlServer => {
                builder
                    .push(" OFFSET ")
                    .push_bind(offset)
                    .push(" ROWS FETCH NEXT ")
                    .push_bind(limit)
                    .push(" ROWS ONLY");
            }
        }

        Ok(())
    }

    fn qualified(&self, column: &str) -> String {
        qualified_column(self.provider, self.layout.alias(), column)
    }

    fn column(&self, column: BuiltInColumn) -> String {
        self.qualified(self.layout.column(column))
    }

    fn json_text(&self, key: &str) -> String {
        json_text_value(self.provider, self.layout.alias(), self.layout.json_column(), key)
    }

    fn json_array(&self, key: &str) -> String {
        json_array_value(self.provider, self.layout.alias(), self.layout.json_column(), key)
    }

    /// Text form of a target, used by search, equality and pattern matching.
    fn text_expression(&self, target: &FieldTarget, field_type: BaseFieldType) -> String {
        match target {
            FieldTarget::Column(column) => match self.provider {
                DatabaseProvider::Postgres => format!("CAST({} AS TEXT)", self.column(*column)),
                DatabaseProvider::SqlServer => {
                    format!("CAST({} AS NVARCHAR(MAX))", self.column(*column))
                }
            },
            FieldTarget::JsonKey(key)
                if field_type == BaseFieldType::MultipleSelect
                    && self.provider == DatabaseProvider::SqlServer =>
            {
                format!(
                    "COALESCE({}, {})",
                    self.json_array(key.as_str()),
                    self.json_text(key.as_str())
                )
            }
            FieldTarget::JsonKey(key) => self.json_text(key.as_str()),
        }
    }
}
