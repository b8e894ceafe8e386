use async_trait::async_trait;
use serde::Serialize;
use vellum_core::{AppResult, ContentTypeId, DeveloperName, ViewId};
use vellum_domain::{
    BaseFieldType, BuiltInColumn, ConditionOperator, ContentItemProjection, ContentTypeDefinition,
    FieldValue, ResolvedField, SortDirection, ViewDefinition,
};

use crate::CancellationSignal;

/// Where a field's value is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// Built-in table column.
    Column(BuiltInColumn),
    /// Key inside the JSON payload column.
    JsonKey(DeveloperName),
}

impl FieldTarget {
    /// Returns the developer name of the targeted field.
    #[must_use]
    pub fn developer_name(&self) -> &str {
        match self {
            Self::Column(column) => column.developer_name(),
            Self::JsonKey(key) => key.as_str(),
        }
    }
}

impl From<ResolvedField<'_>> for FieldTarget {
    fn from(value: ResolvedField<'_>) -> Self {
        match value {
            ResolvedField::BuiltIn(column) => Self::Column(column),
            ResolvedField::Custom(field) => Self::JsonKey(field.developer_name().clone()),
        }
    }
}

/// Leaf predicate bound to a field.
///
/// Operators are normalized to their positive form: `ne`, `notempty`,
/// `false` and the negated text and choice operators are expressed as
/// [`BoundFilter::Not`] around the positive predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPredicate {
    /// Value source.
    pub target: FieldTarget,
    /// Type governing comparison semantics.
    pub field_type: BaseFieldType,
    /// Positive operator.
    pub operator: ConditionOperator,
    /// Normalized operand for operators that take one.
    pub operand: Option<FieldValue>,
}

/// Filter tree bound to a content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundFilter {
    /// All children hold.
    And(Vec<BoundFilter>),
    /// Any child holds.
    Or(Vec<BoundFilter>),
    /// The child does not hold.
    Not(Box<BoundFilter>),
    /// Leaf predicate. Never unknown: a missing value makes it false.
    Predicate(FieldPredicate),
}

/// Column included in free-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchColumn {
    /// Value source.
    pub target: FieldTarget,
    /// Field type of the column.
    pub field_type: BaseFieldType,
}

/// Case-insensitive substring search across columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate {
    /// Trimmed, non-empty search term.
    pub term: String,
    /// Columns ORed together.
    pub columns: Vec<SearchColumn>,
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    /// Value source.
    pub target: FieldTarget,
    /// Type selecting the ordering expression.
    pub field_type: BaseFieldType,
    /// Direction.
    pub direction: SortDirection,
}

/// Row window of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Maximum rows.
    pub limit: u32,
    /// Rows skipped.
    pub offset: u64,
}

/// Fully resolved query handed to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItemQueryPlan {
    /// Queried content type.
    pub content_type_id: ContentTypeId,
    /// Combined request and view filters.
    pub filter: Option<BoundFilter>,
    /// Free-text search.
    pub search: Option<SearchPredicate>,
    /// Ordering, without the identifier tiebreak.
    pub order_by: Vec<OrderTerm>,
    /// Requested page.
    pub page: PageWindow,
}

/// Page of results with the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPage<T> {
    /// Items of the requested page.
    pub items: Vec<T>,
    /// Count of all matching items.
    pub total_count: u64,
}

/// Content type lookup port.
#[async_trait]
pub trait ContentTypeRepository: Send + Sync {
    /// Finds a content type by identifier.
    async fn find_content_type(
        &self,
        content_type_id: ContentTypeId,
    ) -> AppResult<Option<ContentTypeDefinition>>;

    /// Lists every content type.
    async fn list_content_types(&self) -> AppResult<Vec<ContentTypeDefinition>>;
}

/// Saved view lookup port.
#[async_trait]
pub trait ViewRepository: Send + Sync {
    /// Finds a view by identifier.
    async fn find_view(&self, view_id: ViewId) -> AppResult<Option<ViewDefinition>>;

    /// Finds a view by developer name.
    async fn find_view_by_name(&self, developer_name: &str) -> AppResult<Option<ViewDefinition>>;
}

/// Executes planned content item queries against a store.
#[async_trait]
pub trait ContentItemQueryExecutor: Send + Sync {
    /// Returns one page of matching items in plan order.
    async fn fetch_page(
        &self,
        content_type: &ContentTypeDefinition,
        plan: &ContentItemQueryPlan,
        cancellation: &CancellationSignal,
    ) -> AppResult<Vec<ContentItemProjection>>;

    /// Counts every matching item, ignoring order and paging.
    async fn count(
        &self,
        content_type: &ContentTypeDefinition,
        plan: &ContentItemQueryPlan,
        cancellation: &CancellationSignal,
    ) -> AppResult<u64>;
}
