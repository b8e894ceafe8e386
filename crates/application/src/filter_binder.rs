use serde_json::Value;
use vellum_core::{AppError, AppResult};
use vellum_domain::{
    BaseFieldType, ConditionOperator, ContentTypeDefinition, DateFormat, FieldValue,
};

use crate::portable_filter::{ComparisonOperator, FilterExpression, FilterFunction, Literal};
use crate::query_ports::{BoundFilter, FieldPredicate, FieldTarget};

/// Binds parsed filter expressions to a content type.
pub(crate) struct FilterBinder<'a> {
    content_type: &'a ContentTypeDefinition,
    date_format: &'a DateFormat,
}

impl<'a> FilterBinder<'a> {
    pub(crate) fn new(content_type: &'a ContentTypeDefinition, date_format: &'a DateFormat) -> Self {
        Self {
            content_type,
            date_format,
        }
    }

    pub(crate) fn bind(&self, expression: &FilterExpression) -> AppResult<BoundFilter> {
        match expression {
            FilterExpression::And(children) => Ok(BoundFilter::And(self.bind_all(children)?)),
            FilterExpression::Or(children) => Ok(BoundFilter::Or(self.bind_all(children)?)),
            FilterExpression::Not(child) => Ok(negate(self.bind(child)?)),
            FilterExpression::Compare {
                field,
                operator,
                value,
            } => self.bind_comparison(field, *operator, value),
            FilterExpression::Function {
                function,
                field,
                value,
            } => self.bind_function(field, *function, value),
        }
    }

    fn bind_all(&self, children: &[FilterExpression]) -> AppResult<Vec<BoundFilter>> {
        children.iter().map(|child| self.bind(child)).collect()
    }

    fn bind_comparison(
        &self,
        field: &str,
        operator: ComparisonOperator,
        literal: &Literal,
    ) -> AppResult<BoundFilter> {
        let (target, field_type) = self.resolve(field)?;

        if field_type == BaseFieldType::Checkbox {
            return self.bind_checkbox(field, target, operator, literal);
        }

        let requested = match operator {
            ComparisonOperator::Eq => ConditionOperator::Equals,
            ComparisonOperator::Ne => ConditionOperator::NotEquals,
            ComparisonOperator::Gt => ConditionOperator::GreaterThan,
            ComparisonOperator::Ge => ConditionOperator::GreaterThanOrEqual,
            ComparisonOperator::Lt => ConditionOperator::LessThan,
            ComparisonOperator::Le => ConditionOperator::LessThanOrEqual,
        };

        let operand = match literal {
            Literal::Null => None,
            literal => Some(self.operand(field, field_type, literal)?).filter(FieldValue::has_value),
        };

        let Some(operand) = operand else {
            return presence(field, target, field_type, operator);
        };

        self.leaf(field, target, field_type, requested, Some(operand))
    }

    fn bind_checkbox(
        &self,
        field: &str,
        target: FieldTarget,
        operator: ComparisonOperator,
        literal: &Literal,
    ) -> AppResult<BoundFilter> {
        let flag = match literal {
            Literal::Boolean(flag) => *flag,
            Literal::String(text) => {
                let value = BaseFieldType::Checkbox.value_from(&Value::String(text.clone()))?;
                if !value.has_value() {
                    return Err(invalid(field, "checkbox fields compare with true or false"));
                }
                value.text() == "true"
            }
            Literal::Number(_) | Literal::Null => {
                return Err(invalid(field, "checkbox fields compare with true or false"));
            }
        };

        let requested = match (operator, flag) {
            (ComparisonOperator::Eq, true) | (ComparisonOperator::Ne, false) => {
                ConditionOperator::IsTrue
            }
            (ComparisonOperator::Eq, false) | (ComparisonOperator::Ne, true) => {
                ConditionOperator::IsFalse
            }
            _ => {
                return Err(invalid(
                    field,
                    format!(
                        "operator '{}' is not supported for field type 'checkbox'",
                        operator.as_str()
                    ),
                ));
            }
        };

        self.leaf(field, target, BaseFieldType::Checkbox, requested, None)
    }

    fn bind_function(
        &self,
        field: &str,
        function: FilterFunction,
        literal: &Literal,
    ) -> AppResult<BoundFilter> {
        let (target, field_type) = self.resolve(field)?;
        let requested = match function {
            FilterFunction::Contains => ConditionOperator::Contains,
            FilterFunction::StartsWith => ConditionOperator::StartsWith,
            FilterFunction::EndsWith => ConditionOperator::EndsWith,
            FilterFunction::Has => ConditionOperator::Has,
        };
        ensure_supported(field, field_type, requested)?;

        let operand = match literal {
            Literal::String(_) | Literal::Number(_) => {
                self.operand(field, field_type, literal)?
            }
            Literal::Boolean(_) | Literal::Null => {
                return Err(invalid(
                    field,
                    format!("function '{}' requires a text argument", function.as_str()),
                ));
            }
        };

        if !operand.has_value() {
            return Err(invalid(
                field,
                format!("function '{}' requires a non-empty argument", function.as_str()),
            ));
        }

        self.leaf(field, target, field_type, requested, Some(operand))
    }

    /// Checks the operator against the field type, then normalizes it.
    fn leaf(
        &self,
        field: &str,
        target: FieldTarget,
        field_type: BaseFieldType,
        requested: ConditionOperator,
        operand: Option<FieldValue>,
    ) -> AppResult<BoundFilter> {
        ensure_supported(field, field_type, requested)?;

        let (negated, positive) = match requested {
            ConditionOperator::NotEquals => (true, ConditionOperator::Equals),
            ConditionOperator::IsNotEmpty => (true, ConditionOperator::IsEmpty),
            ConditionOperator::IsFalse => (true, ConditionOperator::IsTrue),
            other => other.split_negation(),
        };

        let predicate = BoundFilter::Predicate(FieldPredicate {
            target,
            field_type,
            operator: positive,
            operand,
        });

        Ok(if negated { negate(predicate) } else { predicate })
    }

    fn resolve(&self, field: &str) -> AppResult<(FieldTarget, BaseFieldType)> {
        let resolved = self.content_type.require_field(field)?;
        Ok((FieldTarget::from(resolved), resolved.field_type()))
    }

    fn operand(&self, field: &str, field_type: BaseFieldType, literal: &Literal) -> AppResult<FieldValue> {
        let raw = match literal {
            Literal::String(text) => Value::String(text.clone()),
            Literal::Number(number) => Value::String(number.to_string()),
            Literal::Boolean(flag) => Value::Bool(*flag),
            Literal::Null => Value::Null,
        };

        // Compiled filters write dates as ISO text whatever the configured pattern.
        let iso = DateFormat::iso();
        let date_format = match literal {
            Literal::String(text) if field_type == BaseFieldType::Date && iso.parse(text).is_some() => {
                &iso
            }
            _ => self.date_format,
        };

        field_type
            .value_from_with_format(&raw, Some(date_format))
            .map_err(|error| match error {
                AppError::Format(reason) => AppError::Format(format!("field '{field}': {reason}")),
                other => other,
            })
    }
}

/// Null comparisons test presence on every field type, including identifiers
/// whose view conditions only offer equality.
fn presence(
    field: &str,
    target: FieldTarget,
    field_type: BaseFieldType,
    operator: ComparisonOperator,
) -> AppResult<BoundFilter> {
    let negated = match operator {
        ComparisonOperator::Eq => false,
        ComparisonOperator::Ne => true,
        _ => {
            return Err(invalid(
                field,
                format!("operator '{}' cannot compare with null", operator.as_str()),
            ));
        }
    };

    let predicate = BoundFilter::Predicate(FieldPredicate {
        target,
        field_type,
        operator: ConditionOperator::IsEmpty,
        operand: None,
    });

    Ok(if negated { negate(predicate) } else { predicate })
}

fn negate(filter: BoundFilter) -> BoundFilter {
    match filter {
        BoundFilter::Not(inner) => *inner,
        other => BoundFilter::Not(Box::new(other)),
    }
}

fn ensure_supported(
    field: &str,
    field_type: BaseFieldType,
    operator: ConditionOperator,
) -> AppResult<()> {
    if field_type.supports(operator) {
        return Ok(());
    }

    Err(invalid(
        field,
        format!(
            "operator '{}' is not supported for field type '{}'",
            operator.as_str(),
            field_type.as_str()
        ),
    ))
}

fn invalid(field: &str, reason: impl Into<String>) -> AppError {
    AppError::InvalidField {
        field: field.to_owned(),
        reason: reason.into(),
    }
}
