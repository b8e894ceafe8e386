use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use vellum_core::{AppError, AppResult, ContentTypeId};
use vellum_domain::{
    BaseFieldType, BuiltInColumn, ConditionOperator, ContentItemProjection, ContentTypeDefinition,
    ContentTypeField, SortDirection,
};

use super::{JsonQueryEngine, JsonQueryRequest};
use crate::query_ports::{
    BoundFilter, ContentItemQueryExecutor, ContentItemQueryPlan, ContentTypeRepository,
    FieldTarget,
};
use crate::{CancellationSignal, JsonQuerySettings};

struct FakeContentTypes {
    content_types: HashMap<ContentTypeId, ContentTypeDefinition>,
}

#[async_trait]
impl ContentTypeRepository for FakeContentTypes {
    async fn find_content_type(
        &self,
        content_type_id: ContentTypeId,
    ) -> AppResult<Option<ContentTypeDefinition>> {
        Ok(self.content_types.get(&content_type_id).cloned())
    }

    async fn list_content_types(&self) -> AppResult<Vec<ContentTypeDefinition>> {
        Ok(self.content_types.values().cloned().collect())
    }
}

#[derive(Default)]
struct RecordingExecutor {
    plans: Mutex<Vec<ContentItemQueryPlan>>,
}

#[async_trait]
impl ContentItemQueryExecutor for RecordingExecutor {
    async fn fetch_page(
        &self,
        _content_type: &ContentTypeDefinition,
        plan: &ContentItemQueryPlan,
        cancellation: &CancellationSignal,
    ) -> AppResult<Vec<ContentItemProjection>> {
        cancellation
            .guard("fetch", async {
                self.plans.lock().await.push(plan.clone());
                Ok(Vec::new())
            })
            .await
    }

    async fn count(
        &self,
        _content_type: &ContentTypeDefinition,
        _plan: &ContentItemQueryPlan,
        cancellation: &CancellationSignal,
    ) -> AppResult<u64> {
        cancellation.guard("count", async { Ok(42) }).await
    }
}

fn article() -> ContentTypeDefinition {
    let field = |name: &str, field_type: BaseFieldType| {
        ContentTypeField::new(name, name, field_type, false, Vec::new(), None)
            .unwrap_or_else(|_| unreachable!())
    };

    ContentTypeDefinition::new(
        ContentTypeId::new(),
        "article",
        "Article",
        "Articles",
        "title",
        vec![
            field("title", BaseFieldType::SingleLineText),
            field("summary", BaseFieldType::LongText),
            field("price", BaseFieldType::Number),
            field("published_on", BaseFieldType::Date),
        ],
    )
    .unwrap_or_else(|_| unreachable!())
}

fn engine(content_type: &ContentTypeDefinition) -> (JsonQueryEngine, Arc<RecordingExecutor>) {
    let executor = Arc::new(RecordingExecutor::default());
    let content_types = FakeContentTypes {
        content_types: HashMap::from([(content_type.id(), content_type.clone())]),
    };
    let engine = JsonQueryEngine::new(
        Arc::new(content_types),
        executor.clone(),
        JsonQuerySettings::default(),
    );
    (engine, executor)
}

#[test]
fn plan_defaults_to_newest_first_and_default_page() {
    let article = article();
    let (engine, _) = engine(&article);

    let plan = engine
        .plan(&article, &JsonQueryRequest::new(article.id()))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(plan.order_by.len(), 1);
    assert_eq!(
        plan.order_by[0].target,
        FieldTarget::Column(BuiltInColumn::CreationTime)
    );
    assert_eq!(plan.order_by[0].direction, SortDirection::Desc);
    assert_eq!(plan.page.limit, 50);
    assert_eq!(plan.page.offset, 0);
    assert!(plan.filter.is_none());
    assert!(plan.search.is_none());
}

#[test]
fn plan_combines_filters_with_and() {
    let article = article();
    let (engine, _) = engine(&article);
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec![
        "(price gt 10)".to_owned(),
        "  ".to_owned(),
        "(published_on ne null)".to_owned(),
    ];

    let plan = engine
        .plan(&article, &request)
        .unwrap_or_else(|_| unreachable!());
    let Some(BoundFilter::And(children)) = plan.filter else {
        panic!("expected filters combined with and");
    };
    assert_eq!(children.len(), 2);
}

#[test]
fn plan_searches_default_columns_when_none_given() {
    let article = article();
    let (engine, _) = engine(&article);
    let mut request = JsonQueryRequest::new(article.id());
    request.search_term = Some("  rust  ".to_owned());

    let plan = engine
        .plan(&article, &request)
        .unwrap_or_else(|_| unreachable!());
    let search = plan.search.unwrap_or_else(|| unreachable!());
    assert_eq!(search.term, "rust");
    let names: Vec<&str> = search
        .columns
        .iter()
        .map(|column| column.target.developer_name())
        .collect();
    assert_eq!(names, vec!["title", "summary"]);
}

#[test]
fn plan_ignores_blank_search_terms() {
    let article = article();
    let (engine, _) = engine(&article);
    let mut request = JsonQueryRequest::new(article.id());
    request.search_term = Some("   ".to_owned());
    request.search_columns = vec!["missing".to_owned()];

    let plan = engine
        .plan(&article, &request)
        .unwrap_or_else(|_| unreachable!());
    assert!(plan.search.is_none());
}

#[test]
fn plan_clamps_paging() {
    let article = article();
    let (engine, _) = engine(&article);
    let mut request = JsonQueryRequest::new(article.id());
    request.page_size = 5000;
    request.page_number = 3;

    let plan = engine
        .plan(&article, &request)
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(plan.page.limit, 1000);
    assert_eq!(plan.page.offset, 2000);

    request.page_number = 0;
    assert!(matches!(
        engine.plan(&article, &request),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn plan_rejects_unknown_order_fields_but_drops_bad_directions() {
    let article = article();
    let (engine, _) = engine(&article);
    let mut request = JsonQueryRequest::new(article.id());
    request.order_by = Some("price upward, title desc".to_owned());

    let plan = engine
        .plan(&article, &request)
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(plan.order_by.len(), 1);
    assert_eq!(plan.order_by[0].target.developer_name(), "title");

    request.order_by = Some("rating desc".to_owned());
    assert!(matches!(
        engine.plan(&article, &request),
        Err(AppError::InvalidField { field, .. }) if field == "rating"
    ));
}

#[test]
fn plan_rejects_filters_with_unsupported_operators() {
    let article = article();
    let (engine, _) = engine(&article);
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec!["startswith(price, '1')".to_owned()];

    assert!(matches!(
        engine.plan(&article, &request),
        Err(AppError::InvalidField { .. })
    ));
}

#[tokio::test]
async fn query_returns_items_and_total() {
    let article = article();
    let (engine, executor) = engine(&article);
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec!["not (startswith(title, 'draft'))".to_owned()];

    let page = engine
        .query(&request, &CancellationSignal::new())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 42);

    let plans = executor.plans.lock().await;
    assert_eq!(plans.len(), 1);
    let Some(BoundFilter::Not(inner)) = &plans[0].filter else {
        panic!("expected a negated filter");
    };
    assert!(matches!(
        inner.as_ref(),
        BoundFilter::Predicate(predicate) if predicate.operator == ConditionOperator::StartsWith
    ));
}

#[tokio::test]
async fn query_unknown_content_type_is_not_found() {
    let article = article();
    let (engine, _) = engine(&article);

    let result = engine
        .query(
            &JsonQueryRequest::new(ContentTypeId::new()),
            &CancellationSignal::new(),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn cancelled_query_returns_cancelled() {
    let article = article();
    let (engine, executor) = engine(&article);
    let cancellation = CancellationSignal::new();
    cancellation.cancel();

    let result = engine
        .query(&JsonQueryRequest::new(article.id()), &cancellation)
        .await;
    assert!(matches!(result, Err(AppError::Cancelled(_))));
    assert!(executor.plans.lock().await.is_empty());

    let result = engine
        .count(&JsonQueryRequest::new(article.id()), &cancellation)
        .await;
    assert!(matches!(result, Err(AppError::Cancelled(_))));
}
