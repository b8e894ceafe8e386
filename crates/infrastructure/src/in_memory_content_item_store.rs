use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vellum_application::{
    BoundFilter, CancellationSignal, ContentItemQueryExecutor, ContentItemQueryPlan,
    FieldPredicate, FieldTarget, OrderTerm, SearchPredicate,
};
use vellum_core::{AppError, AppResult, ContentTypeId};
use vellum_domain::{
    BaseFieldType, ConditionOperator, ContentItem, ContentItemProjection, ContentTypeDefinition,
    DateFormat, FieldValue, ResolvedField, SortDirection, TypedValue,
};

#[cfg(test)]
mod tests;

/// In-memory content item store evaluating plans with field value semantics.
///
/// Results agree with the SQL executor: stored values that do not parse
/// for their field type match no predicate, and absent values sort last
/// ascending and first descending.
#[derive(Debug)]
pub struct InMemoryContentItemStore {
    items: RwLock<Vec<ContentItem>>,
    date_format: DateFormat,
}

impl InMemoryContentItemStore {
    /// Creates an empty store reading dates with `date_format`.
    #[must_use]
    pub fn new(date_format: DateFormat) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            date_format,
        }
    }

    /// Inserts or replaces an item by identifier.
    pub async fn save(&self, item: ContentItem) {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|stored| stored.id() == item.id()) {
            Some(stored) => *stored = item,
            None => items.push(item),
        }
    }

    /// Returns the number of stored items of a content type.
    pub async fn count_items(&self, content_type_id: ContentTypeId) -> usize {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| item.content_type_id() == content_type_id)
            .count()
    }

    async fn matching_items(
        &self,
        content_type: &ContentTypeDefinition,
        plan: &ContentItemQueryPlan,
    ) -> AppResult<Vec<ContentItem>> {
        let items = self.items.read().await;
        let mut matching = Vec::new();
        for item in items
            .iter()
            .filter(|item| item.content_type_id() == plan.content_type_id)
        {
            let evaluator = ItemEvaluator {
                item,
                content_type,
                date_format: &self.date_format,
            };
            let passes_filter = match &plan.filter {
                Some(filter) => evaluator.matches(filter)?,
                None => true,
            };
            let passes_search = match &plan.search {
                Some(search) => evaluator.matches_search(search)?,
                None => true,
            };
            if passes_filter && passes_search {
                matching.push(item.clone());
            }
        }

        Ok(matching)
    }
}

impl Default for InMemoryContentItemStore {
    fn default() -> Self {
        Self::new(DateFormat::default())
    }
}

#[async_trait]
impl ContentItemQueryExecutor for InMemoryContentItemStore {
    async fn fetch_page(
        &self,
        content_type: &ContentTypeDefinition,
        plan: &ContentItemQueryPlan,
        cancellation: &CancellationSignal,
    ) -> AppResult<Vec<ContentItemProjection>> {
        cancellation
            .guard("content item query", async {
                let matching = self.matching_items(content_type, plan).await?;
                let mut keyed = Vec::with_capacity(matching.len());
                for item in matching {
                    let evaluator = ItemEvaluator {
                        item: &item,
                        content_type,
                        date_format: &self.date_format,
                    };
                    let keys = plan
                        .order_by
                        .iter()
                        .map(|term| evaluator.value(&term.target))
                        .collect::<AppResult<Vec<_>>>()?;
                    keyed.push((item, keys));
                }

                keyed.sort_by(|(left, left_keys), (right, right_keys)| {
                    compare_for_sort(&plan.order_by, left_keys, right_keys)
                        .then_with(|| left.id().cmp(&right.id()))
                });

                let offset = usize::try_from(plan.page.offset).unwrap_or(usize::MAX);
                let limit = usize::try_from(plan.page.limit).unwrap_or(usize::MAX);
                keyed
                    .into_iter()
                    .skip(offset)
                    .take(limit)
                    .map(|(item, _)| item.project(content_type, &self.date_format))
                    .collect()
            })
            .await
    }

    async fn count(
        &self,
        content_type: &ContentTypeDefinition,
        plan: &ContentItemQueryPlan,
        cancellation: &CancellationSignal,
    ) -> AppResult<u64> {
        cancellation
            .guard("content item count", async {
                let matching = self.matching_items(content_type, plan).await?;
                Ok(u64::try_from(matching.len()).unwrap_or(u64::MAX))
            })
            .await
    }
}

struct ItemEvaluator<'a> {
    item: &'a ContentItem,
    content_type: &'a ContentTypeDefinition,
    date_format: &'a DateFormat,
}

impl ItemEvaluator<'_> {
    /// Reads a target's value; `None` when the stored value does not parse.
    fn value(&self, target: &FieldTarget) -> AppResult<Option<FieldValue>> {
        let field = match target {
            FieldTarget::Column(column) => ResolvedField::BuiltIn(*column),
            FieldTarget::JsonKey(key) => self.content_type.require_field(key.as_str())?,
        };

        match self.item.field_value(field, self.date_format) {
            Ok(value) => Ok(Some(value)),
            Err(AppError::Format(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn matches(&self, filter: &BoundFilter) -> AppResult<bool> {
        match filter {
            BoundFilter::And(children) => {
                for child in children {
                    if !self.matches(child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            BoundFilter::Or(children) => {
                for child in children {
                    if self.matches(child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            BoundFilter::Not(child) => Ok(!self.matches(child)?),
            BoundFilter::Predicate(predicate) => {
                let Some(value) = self.value(&predicate.target)? else {
                    return Ok(false);
                };
                predicate_holds(predicate, &value)
            }
        }
    }

    fn matches_search(&self, search: &SearchPredicate) -> AppResult<bool> {
        if search.columns.is_empty() {
            return Ok(true);
        }

        let term = search.term.to_lowercase();
        for column in &search.columns {
            if let Some(value) = self.value(&column.target)?
                && value.has_value()
                && value.text().to_lowercase().contains(term.as_str())
            {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

fn predicate_holds(predicate: &FieldPredicate, value: &FieldValue) -> AppResult<bool> {
    let operand = || {
        predicate.operand.as_ref().ok_or_else(|| {
            AppError::Internal(format!(
                "operator '{}' on field '{}' is missing its operand",
                predicate.operator.as_str(),
                predicate.target.developer_name()
            ))
        })
    };
    let ordered = |accept: fn(Ordering) -> bool| -> AppResult<bool> {
        Ok(value.compare(operand()?).is_some_and(accept))
    };
    let lowered_text = |candidate: &FieldValue| candidate.text().to_lowercase();

    match predicate.operator {
        ConditionOperator::IsEmpty => Ok(!value.has_value()),
        ConditionOperator::IsTrue => Ok(matches!(
            value.value(),
            TypedValue::Boolean(flag) if flag.has_value() && flag.value()
        )),
        ConditionOperator::Equals => match predicate.field_type {
            BaseFieldType::Number | BaseFieldType::Date | BaseFieldType::Id => {
                ordered(Ordering::is_eq)
            }
            _ => Ok(value.has_value() && lowered_text(value) == lowered_text(operand()?)),
        },
        ConditionOperator::Contains => {
            Ok(value.has_value() && lowered_text(value).contains(lowered_text(operand()?).as_str()))
        }
        ConditionOperator::StartsWith => Ok(value.has_value()
            && lowered_text(value).starts_with(lowered_text(operand()?).as_str())),
        ConditionOperator::EndsWith => Ok(value.has_value()
            && lowered_text(value).ends_with(lowered_text(operand()?).as_str())),
        ConditionOperator::Has => {
            let (TypedValue::Array(items), TypedValue::Array(expected)) =
                (value.value(), operand()?.value())
            else {
                return Ok(false);
            };
            Ok(expected
                .value()
                .first()
                .is_some_and(|item| items.contains_ignore_case(item)))
        }
        ConditionOperator::GreaterThan => ordered(Ordering::is_gt),
        ConditionOperator::LessThan => ordered(Ordering::is_lt),
        ConditionOperator::GreaterThanOrEqual => ordered(Ordering::is_ge),
        ConditionOperator::LessThanOrEqual => ordered(Ordering::is_le),
        operator => Err(AppError::Internal(format!(
            "operator '{}' on field '{}' must be normalized before evaluation",
            operator.as_str(),
            predicate.target.developer_name()
        ))),
    }
}

fn compare_for_sort(
    terms: &[OrderTerm],
    left: &[Option<FieldValue>],
    right: &[Option<FieldValue>],
) -> Ordering {
    for ((term, left), right) in terms.iter().zip(left).zip(right) {
        let present = |value: &Option<FieldValue>| value.clone().filter(FieldValue::has_value);
        let ordering = match (present(left), present(right)) {
            (Some(left), Some(right)) => left.compare(&right).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match term.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}
