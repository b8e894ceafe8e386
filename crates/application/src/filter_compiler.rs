use serde_json::Value;
use vellum_core::{AppError, AppResult};
use vellum_domain::{
    BaseFieldType, BooleanOperator, ConditionOperator, ContentTypeDefinition, DateFormat,
    FilterCondition, FilterConditionGroup, FilterNode, TypedValue,
};

use crate::portable_filter::{ComparisonOperator, FilterExpression, FilterFunction, Literal};

/// Compiles saved filter trees into portable filter expressions.
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    date_format: DateFormat,
}

impl FilterCompiler {
    /// Creates a compiler that reads date operands in `date_format`.
    #[must_use]
    pub fn new(date_format: DateFormat) -> Self {
        Self { date_format }
    }

    /// Compiles a filter tree into its portable text.
    pub fn compile(
        &self,
        content_type: &ContentTypeDefinition,
        node: &FilterNode,
    ) -> AppResult<String> {
        self.compile_expression(content_type, node)
            .map(|expression| expression.to_string())
    }

    /// Compiles a filter tree into a portable expression.
    ///
    /// Every leaf is checked against the content type: the field must exist
    /// and its type must support the operator.
    pub fn compile_expression(
        &self,
        content_type: &ContentTypeDefinition,
        node: &FilterNode,
    ) -> AppResult<FilterExpression> {
        match node {
            FilterNode::Condition(condition) => self.compile_condition(content_type, condition),
            FilterNode::Group(group) => self.compile_group(content_type, group),
        }
    }

    fn compile_group(
        &self,
        content_type: &ContentTypeDefinition,
        group: &FilterConditionGroup,
    ) -> AppResult<FilterExpression> {
        group.validate()?;

        let mut children = group
            .children()
            .iter()
            .map(|child| self.compile_expression(content_type, child))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(match group.operator() {
            BooleanOperator::Not => FilterExpression::Not(Box::new(children.remove(0))),
            _ if children.len() == 1 => children.remove(0),
            BooleanOperator::And => FilterExpression::And(children),
            BooleanOperator::Or => FilterExpression::Or(children),
        })
    }

    fn compile_condition(
        &self,
        content_type: &ContentTypeDefinition,
        condition: &FilterCondition,
    ) -> AppResult<FilterExpression> {
        let field_name = condition.field().as_str();
        let field = content_type.require_field(field_name)?;
        let field_type = field.field_type();
        let operator = condition.operator();

        if !field_type.supports(operator) {
            return Err(AppError::InvalidField {
                field: field_name.to_owned(),
                reason: format!(
                    "operator '{}' is not supported for field type '{}'",
                    operator.as_str(),
                    field_type.as_str()
                ),
            });
        }

        let compare = |operator, value| FilterExpression::Compare {
            field: field_name.to_owned(),
            operator,
            value,
        };

        let operand = if operator.takes_operand() {
            let raw = condition.operand().ok_or_else(|| AppError::InvalidField {
                field: field_name.to_owned(),
                reason: format!("operator '{}' requires an operand", operator.as_str()),
            })?;
            self.operand_literal(field_type, raw)?
        } else {
            None
        };

        let Some(operand) = operand else {
            return match operator {
                ConditionOperator::IsEmpty | ConditionOperator::Equals => {
                    Ok(compare(ComparisonOperator::Eq, Literal::Null))
                }
                ConditionOperator::IsNotEmpty | ConditionOperator::NotEquals => {
                    Ok(compare(ComparisonOperator::Ne, Literal::Null))
                }
                ConditionOperator::IsTrue => Ok(compare(ComparisonOperator::Eq, Literal::Boolean(true))),
                ConditionOperator::IsFalse => {
                    Ok(compare(ComparisonOperator::Eq, Literal::Boolean(false)))
                }
                _ => Err(AppError::InvalidField {
                    field: field_name.to_owned(),
                    reason: format!("operator '{}' requires a non-empty operand", operator.as_str()),
                }),
            };
        };

        let (negated, positive) = operator.split_negation();
        let expression = match positive {
            ConditionOperator::Equals => compare(ComparisonOperator::Eq, operand),
            ConditionOperator::NotEquals => compare(ComparisonOperator::Ne, operand),
            ConditionOperator::GreaterThan => compare(ComparisonOperator::Gt, operand),
            ConditionOperator::GreaterThanOrEqual => compare(ComparisonOperator::Ge, operand),
            ConditionOperator::LessThan => compare(ComparisonOperator::Lt, operand),
            ConditionOperator::LessThanOrEqual => compare(ComparisonOperator::Le, operand),
            ConditionOperator::Contains => function(FilterFunction::Contains, field_name, operand),
            ConditionOperator::StartsWith => {
                function(FilterFunction::StartsWith, field_name, operand)
            }
            ConditionOperator::EndsWith => function(FilterFunction::EndsWith, field_name, operand),
            ConditionOperator::Has => function(FilterFunction::Has, field_name, operand),
            other => {
                return Err(AppError::Internal(format!(
                    "operator '{}' cannot take an operand",
                    other.as_str()
                )));
            }
        };

        Ok(if negated {
            FilterExpression::Not(Box::new(expression))
        } else {
            expression
        })
    }

    /// Normalizes a raw operand into a literal, `None` when it has no value.
    fn operand_literal(&self, field_type: BaseFieldType, raw: &str) -> AppResult<Option<Literal>> {
        let value = field_type
            .value_from_with_format(&Value::String(raw.to_owned()), Some(&self.date_format))?;
        if !value.has_value() {
            return Ok(None);
        }

        let literal = match value.value() {
            TypedValue::Decimal(decimal) => match decimal.value() {
                Some(number) => Literal::Number(number),
                None => Literal::Null,
            },
            TypedValue::DateTime(date) => match date.date() {
                Some(day) => Literal::String(day.format("%Y-%m-%d").to_string()),
                None => Literal::Null,
            },
            TypedValue::Boolean(flag) => Literal::Boolean(flag.value()),
            TypedValue::Array(_) => Literal::String(raw.trim().to_owned()),
            TypedValue::Text(_) | TypedValue::Guid(_) => Literal::String(value.text()),
        };

        Ok(Some(literal))
    }
}

fn function(function: FilterFunction, field: &str, value: Literal) -> FilterExpression {
    FilterExpression::Function {
        function,
        field: field.to_owned(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use vellum_core::{AppError, ContentTypeId};
    use vellum_domain::{
        BaseFieldType, BooleanOperator, ConditionOperator, ContentTypeDefinition, ContentTypeField,
        DateFormat, FieldChoice, FilterCondition, FilterConditionGroup, FilterNode,
    };

    use super::FilterCompiler;
    use crate::filter_binder::FilterBinder;
    use crate::portable_filter::parse_filter;
    use crate::query_ports::BoundFilter;

    fn article() -> ContentTypeDefinition {
        let choices = vec![
            FieldChoice::new("red", "Red").unwrap_or_else(|_| unreachable!()),
            FieldChoice::new("blue", "Blue").unwrap_or_else(|_| unreachable!()),
        ];
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
                field("price", BaseFieldType::Number),
                field("published_on", BaseFieldType::Date),
                field("featured", BaseFieldType::Checkbox),
                ContentTypeField::new("tags", "Tags", BaseFieldType::MultipleSelect, false, choices, None)
                    .unwrap_or_else(|_| unreachable!()),
            ],
        )
        .unwrap_or_else(|_| unreachable!())
    }

    fn leaf(field: &str, operator: ConditionOperator, operand: Option<&str>) -> FilterNode {
        FilterCondition::new(field, operator, operand.map(str::to_owned))
            .unwrap_or_else(|_| unreachable!())
            .into()
    }

    fn group(operator: BooleanOperator, children: Vec<FilterNode>) -> FilterNode {
        FilterConditionGroup::new(operator, children)
            .unwrap_or_else(|_| unreachable!())
            .into()
    }

    fn compile(node: &FilterNode) -> String {
        FilterCompiler::default()
            .compile(&article(), node)
            .unwrap_or_else(|error| panic!("compile failed: {error}"))
    }

    #[test]
    fn compiles_numeric_and_date_conditions() {
        let node = group(
            BooleanOperator::And,
            vec![
                leaf("price", ConditionOperator::GreaterThan, Some("10.00")),
                leaf("published_on", ConditionOperator::IsNotEmpty, None),
            ],
        );
        assert_eq!(compile(&node), "((price gt 10) and (published_on ne null))");
    }

    #[test]
    fn dates_compile_to_iso_days() {
        let node = leaf("published_on", ConditionOperator::LessThan, Some("03/15/2024"));
        assert_eq!(compile(&node), "(published_on lt '2024-03-15')");

        let compiler = FilterCompiler::new(DateFormat::new("dd/MM/yyyy").unwrap_or_else(|_| unreachable!()));
        let node = leaf("published_on", ConditionOperator::GreaterThanOrEqual, Some("15/03/2024"));
        let compiled = compiler
            .compile(&article(), &node)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(compiled, "(published_on ge '2024-03-15')");
    }

    #[test]
    fn negated_text_operators_wrap_in_not() {
        let node = group(
            BooleanOperator::Or,
            vec![
                leaf("title", ConditionOperator::NotContains, Some("draft")),
                leaf("tags", ConditionOperator::HasNot, Some("red")),
                leaf("title", ConditionOperator::StartsWith, Some("O'Neil")),
            ],
        );
        assert_eq!(
            compile(&node),
            "((not (contains(title, 'draft'))) or (not (has(tags, 'red'))) or (startswith(title, 'O''Neil')))"
        );
    }

    #[test]
    fn boolean_and_presence_operators_need_no_operand() {
        let node = group(
            BooleanOperator::Not,
            vec![group(
                BooleanOperator::And,
                vec![
                    leaf("featured", ConditionOperator::IsFalse, None),
                    leaf("title", ConditionOperator::IsEmpty, None),
                ],
            )],
        );
        assert_eq!(
            compile(&node),
            "(not ((featured eq false) and (title eq null)))"
        );
    }

    #[test]
    fn empty_equality_operand_means_no_value() {
        let node = leaf("title", ConditionOperator::Equals, Some(""));
        assert_eq!(compile(&node), "(title eq null)");
    }

    #[test]
    fn single_child_groups_collapse() {
        let node = group(
            BooleanOperator::And,
            vec![leaf("id", ConditionOperator::NotEquals, Some("00000000-0000-0000-0000-000000000001"))],
        );
        assert_eq!(
            compile(&node),
            "(id ne '00000000-0000-0000-0000-000000000001')"
        );
    }

    #[test]
    fn rejects_unsupported_operator_for_field_type() {
        let node = leaf("price", ConditionOperator::Contains, Some("1"));
        let result = FilterCompiler::default().compile(&article(), &node);
        assert!(matches!(result, Err(AppError::InvalidField { field, .. }) if field == "price"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let node = leaf("rating", ConditionOperator::Equals, Some("5"));
        let result = FilterCompiler::default().compile(&article(), &node);
        assert!(matches!(result, Err(AppError::InvalidField { field, .. }) if field == "rating"));
    }

    #[test]
    fn invalid_numeric_operand_is_a_format_error() {
        let node = leaf("price", ConditionOperator::GreaterThan, Some("ten"));
        let result = FilterCompiler::default().compile(&article(), &node);
        assert!(matches!(result, Err(AppError::Format(_))));
    }

    #[test]
    fn rejects_deserialized_not_group_with_two_children() {
        let node: FilterNode = serde_json::from_value(serde_json::json!({
            "type": "group",
            "operator": "not",
            "children": [
                { "type": "condition", "field": "title", "operator": "empty" },
                { "type": "condition", "field": "price", "operator": "empty" }
            ]
        }))
        .unwrap_or_else(|_| unreachable!());
        let result = FilterCompiler::default().compile(&article(), &node);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn compiled_filters_bind_back_under_the_same_format() {
        let date_format = DateFormat::new("yyyy-dd-MM").unwrap_or_else(|_| unreachable!());
        let compiler = FilterCompiler::new(date_format.clone());
        let content_type = article();
        let node = group(
            BooleanOperator::And,
            vec![
                leaf("creator_user_id", ConditionOperator::NotEquals, Some("")),
                leaf("published_on", ConditionOperator::LessThan, Some("2024-15-03")),
            ],
        );

        let compiled = compiler
            .compile(&content_type, &node)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            compiled,
            "((creator_user_id ne null) and (published_on lt '2024-03-15'))"
        );

        let expression = parse_filter(compiled.as_str()).unwrap_or_else(|_| unreachable!());
        let bound = FilterBinder::new(&content_type, &date_format)
            .bind(&expression)
            .unwrap_or_else(|_| unreachable!());
        let BoundFilter::And(children) = bound else {
            panic!("expected an and filter");
        };
        assert!(matches!(children[0], BoundFilter::Not(_)));
        let BoundFilter::Predicate(date) = &children[1] else {
            panic!("expected a date predicate");
        };
        let day = date.operand.as_ref().map(|value| value.text());
        assert_eq!(day.as_deref(), Some("2024-03-15"));
    }
}
