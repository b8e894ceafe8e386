use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{Map, Value, json};
use uuid::Uuid;
use vellum_application::{
    CancellationSignal, JsonQueryEngine, JsonQueryRequest, JsonQuerySettings, QueryPage,
};
use vellum_core::{AppError, ContentTypeId};
use vellum_domain::{
    BaseFieldType, ContentItem, ContentItemProjection, ContentTypeDefinition, ContentTypeField,
    FieldChoice,
};

use super::InMemoryContentItemStore;
use crate::InMemoryContentCatalog;

fn article() -> ContentTypeDefinition {
    let field = |name: &str, field_type: BaseFieldType| {
        ContentTypeField::new(name, name, field_type, false, Vec::new(), None)
            .unwrap_or_else(|_| unreachable!())
    };
    let choice = |name: &str| FieldChoice::new(name, name).unwrap_or_else(|_| unreachable!());

    ContentTypeDefinition::new(
        ContentTypeId::new(),
        "article",
        "Article",
        "Articles",
        "title",
        vec![
            field("title", BaseFieldType::SingleLineText),
            field("price", BaseFieldType::Number),
            field("published_on", BaseFieldType::Date),
            field("featured", BaseFieldType::Checkbox),
            ContentTypeField::new(
                "tags",
                "Tags",
                BaseFieldType::MultipleSelect,
                false,
                vec![choice("rust"), choice("databases"), choice("tips")],
                None,
            )
            .unwrap_or_else(|_| unreachable!()),
        ],
    )
    .unwrap_or_else(|_| unreachable!())
}

fn item(content_type: &ContentTypeDefinition, day: u32, payload: Value) -> ContentItem {
    let published_content: Map<String, Value> = match payload {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    ContentItem::new(
        Uuid::new_v4(),
        content_type.id(),
        Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!()),
        None,
        None,
        None,
        true,
        published_content,
    )
}

async fn fixture() -> (JsonQueryEngine, ContentTypeDefinition) {
    fixture_with(Vec::new()).await
}

async fn fixture_with(extra: Vec<Value>) -> (JsonQueryEngine, ContentTypeDefinition) {
    let article = article();
    let catalog = InMemoryContentCatalog::new();
    catalog
        .save_content_type(article.clone())
        .await
        .unwrap_or_else(|_| unreachable!());

    let store = InMemoryContentItemStore::default();
    let items = [
        json!({"title": "Rust in Action", "price": 25, "published_on": "03/01/2024", "featured": true, "tags": ["rust"]}),
        json!({"title": "Cheap Tips", "price": 5, "published_on": "03/02/2024", "featured": "false", "tags": ["tips"]}),
        json!({"title": "Draft Guide", "price": 40, "published_on": "", "tags": []}),
        json!({"title": "Deep Dive", "price": "12.50", "published_on": "02/15/2024", "tags": ["Rust", "databases"]}),
        json!({"title": "Premium Pack", "price": 99, "published_on": "01/10/2024", "featured": "yes", "tags": "databases"}),
    ];
    let expected = items.len() + extra.len();
    for (index, payload) in items.into_iter().chain(extra).enumerate() {
        let day = u32::try_from(index + 1).unwrap_or_else(|_| unreachable!());
        store.save(item(&article, day, payload)).await;
    }
    assert_eq!(store.count_items(article.id()).await, expected);

    let engine = JsonQueryEngine::new(
        Arc::new(catalog),
        Arc::new(store),
        JsonQuerySettings::default(),
    );
    (engine, article)
}

fn titles(page: &QueryPage<ContentItemProjection>) -> Vec<String> {
    page.items
        .iter()
        .map(|item| item.fields["title"].text())
        .collect()
}

async fn run(engine: &JsonQueryEngine, request: &JsonQueryRequest) -> QueryPage<ContentItemProjection> {
    engine
        .query(request, &CancellationSignal::new())
        .await
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn priced_and_dated_articles_sorted_by_price() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec!["(price gt 10) and (published_on ne null)".to_owned()];
    request.order_by = Some("price desc".to_owned());

    let page = run(&engine, &request).await;
    assert_eq!(page.total_count, 3);
    assert_eq!(titles(&page), vec!["Premium Pack", "Rust in Action", "Deep Dive"]);
    assert_eq!(page.items[2].fields["price"].to_json(), json!(12.5));
}

#[tokio::test]
async fn paging_keeps_the_unpaged_total() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.order_by = Some("price asc".to_owned());
    request.page_size = 2;
    request.page_number = 2;

    let page = run(&engine, &request).await;
    assert_eq!(page.total_count, 5);
    assert_eq!(titles(&page), vec!["Rust in Action", "Draft Guide"]);
}

#[tokio::test]
async fn absent_values_sort_last_ascending_and_first_descending() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.order_by = Some("published_on asc".to_owned());

    let page = run(&engine, &request).await;
    assert_eq!(titles(&page).last().map(String::as_str), Some("Draft Guide"));

    request.order_by = Some("published_on desc".to_owned());
    let page = run(&engine, &request).await;
    assert_eq!(titles(&page).first().map(String::as_str), Some("Draft Guide"));
    assert_eq!(titles(&page)[1], "Cheap Tips");
}

#[tokio::test]
async fn default_order_is_newest_first() {
    let (engine, article) = fixture().await;
    let page = run(&engine, &JsonQueryRequest::new(article.id())).await;
    assert_eq!(titles(&page).first().map(String::as_str), Some("Premium Pack"));
}

#[tokio::test]
async fn negated_text_functions_include_items_without_match() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec!["not (startswith(title, 'DRAFT'))".to_owned()];

    let total = engine
        .count(&request, &CancellationSignal::new())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(total, 4);
}

#[tokio::test]
async fn search_matches_default_columns_case_insensitively() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.search_term = Some("  DIVE ".to_owned());

    let page = run(&engine, &request).await;
    assert_eq!(titles(&page), vec!["Deep Dive"]);
}

#[tokio::test]
async fn has_matches_arrays_and_single_scalars() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec!["has(tags, 'databases')".to_owned()];
    request.order_by = Some("title asc".to_owned());

    let page = run(&engine, &request).await;
    assert_eq!(titles(&page), vec!["Deep Dive", "Premium Pack"]);

    request.filters = vec!["has(tags, 'RUST')".to_owned()];
    let page = run(&engine, &request).await;
    assert_eq!(titles(&page), vec!["Deep Dive", "Rust in Action"]);
}

#[tokio::test]
async fn checkbox_filters_read_textual_flags() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec!["(featured eq true)".to_owned()];
    request.order_by = Some("title asc".to_owned());

    let page = run(&engine, &request).await;
    assert_eq!(titles(&page), vec!["Premium Pack", "Rust in Action"]);

    request.filters = vec!["(featured eq false)".to_owned()];
    let page = run(&engine, &request).await;
    assert_eq!(page.total_count, 3);
}

#[tokio::test]
async fn date_filters_compare_by_day() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec!["(published_on ge '2024-02-15')".to_owned()];

    let total = engine
        .count(&request, &CancellationSignal::new())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(total, 3);
}

#[tokio::test]
async fn unknown_fields_are_rejected() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());
    request.filters = vec!["(rating gt 3)".to_owned()];

    let result = engine.query(&request, &CancellationSignal::new()).await;
    assert!(matches!(result, Err(AppError::InvalidField { field, .. }) if field == "rating"));
}

async fn count(engine: &JsonQueryEngine, request: &JsonQueryRequest) -> u64 {
    engine
        .count(request, &CancellationSignal::new())
        .await
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn null_comparisons_on_built_in_columns_test_presence() {
    let (engine, article) = fixture().await;
    let mut request = JsonQueryRequest::new(article.id());

    request.filters = vec!["creator_user_id eq null".to_owned()];
    assert_eq!(count(&engine, &request).await, 5);

    request.filters = vec!["creator_user_id ne null".to_owned()];
    assert_eq!(count(&engine, &request).await, 0);

    request.filters = vec!["(last_modification_time eq null) and (id ne null)".to_owned()];
    assert_eq!(count(&engine, &request).await, 5);
}

#[tokio::test]
async fn unparsable_stored_dates_never_match() {
    let (engine, article) =
        fixture_with(vec![json!({"title": "Someday", "price": 1, "published_on": "soon"})]).await;
    let mut request = JsonQueryRequest::new(article.id());

    request.filters = vec!["published_on ge '2024-01-01'".to_owned()];
    request.order_by = Some("title asc".to_owned());
    let page = run(&engine, &request).await;
    assert_eq!(page.total_count, 4);
    assert!(!titles(&page).contains(&"Someday".to_owned()));

    request.filters = vec!["published_on lt '2024-01-01'".to_owned()];
    assert_eq!(count(&engine, &request).await, 0);
}
