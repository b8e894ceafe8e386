use std::str::FromStr;

use pest::Parser as _;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;
use rust_decimal::Decimal;
use vellum_core::{AppError, AppResult};

use super::{ComparisonOperator, FilterExpression, FilterFunction, Literal};

#[derive(Parser)]
#[grammar = "portable_filter/portable_filter.pest"]
struct PortableFilterParser;

pub(super) fn parse(text: &str) -> AppResult<FilterExpression> {
    let mut pairs = PortableFilterParser::parse(Rule::filter, text).map_err(|error| {
        let position = match error.location {
            InputLocation::Pos(position) => position,
            InputLocation::Span((start, _)) => start,
        };
        AppError::Validation(format!(
            "invalid filter '{text}' at position {position}: {error}"
        ))
    })?;

    let expression = pairs
        .next()
        .and_then(|filter| {
            filter
                .into_inner()
                .find(|pair| pair.as_rule() == Rule::or_expr)
        })
        .ok_or_else(|| AppError::Validation(format!("filter '{text}' is empty")))?;

    or_expression(expression)
}

fn or_expression(pair: Pair<'_, Rule>) -> AppResult<FilterExpression> {
    let children = pair
        .into_inner()
        .filter(|child| child.as_rule() == Rule::and_expr)
        .map(and_expression)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(collapse(children, FilterExpression::Or))
}

fn and_expression(pair: Pair<'_, Rule>) -> AppResult<FilterExpression> {
    let children = pair
        .into_inner()
        .filter(|child| child.as_rule() == Rule::unary_expr)
        .map(unary_expression)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(collapse(children, FilterExpression::And))
}

fn collapse(
    mut children: Vec<FilterExpression>,
    group: fn(Vec<FilterExpression>) -> FilterExpression,
) -> FilterExpression {
    if children.len() == 1
        && let Some(only) = children.pop()
    {
        return only;
    }

    group(children)
}

fn unary_expression(pair: Pair<'_, Rule>) -> AppResult<FilterExpression> {
    let mut inner = pair.into_inner();
    let first = next_pair(&mut inner, "expression")?;

    match first.as_rule() {
        Rule::not_op => {
            let operand = next_pair(&mut inner, "negated expression")?;
            Ok(FilterExpression::Not(Box::new(unary_expression(operand)?)))
        }
        Rule::primary => primary_expression(first),
        rule => Err(unexpected(rule)),
    }
}

fn primary_expression(pair: Pair<'_, Rule>) -> AppResult<FilterExpression> {
    let inner = next_pair(&mut pair.into_inner(), "expression")?;

    match inner.as_rule() {
        Rule::or_expr => or_expression(inner),
        Rule::call => call_expression(inner),
        Rule::compare => compare_expression(inner),
        rule => Err(unexpected(rule)),
    }
}

fn call_expression(pair: Pair<'_, Rule>) -> AppResult<FilterExpression> {
    let mut inner = pair.into_inner();
    let name = next_pair(&mut inner, "function name")?
        .as_str()
        .to_ascii_lowercase();
    let function = FilterFunction::from_keyword(name.as_str())
        .ok_or_else(|| AppError::Validation(format!("unknown filter function '{name}'")))?;
    let field = next_pair(&mut inner, "field name")?.as_str().to_owned();
    let value = literal(next_pair(&mut inner, "literal")?)?;

    Ok(FilterExpression::Function {
        function,
        field,
        value,
    })
}

fn compare_expression(pair: Pair<'_, Rule>) -> AppResult<FilterExpression> {
    let mut inner = pair.into_inner();
    let field = next_pair(&mut inner, "field name")?.as_str().to_owned();
    let keyword = next_pair(&mut inner, "comparison operator")?
        .as_str()
        .to_ascii_lowercase();
    let operator = ComparisonOperator::from_keyword(keyword.as_str()).ok_or_else(|| {
        AppError::Validation(format!("unknown comparison operator '{keyword}'"))
    })?;
    let value = literal(next_pair(&mut inner, "literal")?)?;

    Ok(FilterExpression::Compare {
        field,
        operator,
        value,
    })
}

fn literal(pair: Pair<'_, Rule>) -> AppResult<Literal> {
    let inner = next_pair(&mut pair.into_inner(), "literal")?;
    let text = inner.as_str();

    match inner.as_rule() {
        Rule::string => {
            let content = inner
                .into_inner()
                .next()
                .map(|content| content.as_str())
                .unwrap_or_default();
            Ok(Literal::String(content.replace("''", "'")))
        }
        Rule::number => Decimal::from_str(text)
            .map(Literal::Number)
            .map_err(|_| AppError::Validation(format!("invalid number '{text}' in filter"))),
        Rule::boolean => Ok(Literal::Boolean(text.eq_ignore_ascii_case("true"))),
        Rule::null => Ok(Literal::Null),
        rule => Err(unexpected(rule)),
    }
}

fn next_pair<'i>(
    pairs: &mut pest::iterators::Pairs<'i, Rule>,
    description: &str,
) -> AppResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| AppError::Validation(format!("filter is missing a {description}")))
}

fn unexpected(rule: Rule) -> AppError {
    AppError::Internal(format!("unexpected filter grammar rule {rule:?}"))
}
