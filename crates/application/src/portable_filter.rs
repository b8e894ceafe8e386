//! Portable, backend-agnostic filter expressions.
//!
//! The textual form is an OData-flavoured language:
//!
//! ```text
//! ((price gt 10) and (not (contains(title, 'draft'))))
//! ```
//!
//! Compiled filters are always fully parenthesized so that printing a
//! parsed expression reproduces the same text.

use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use vellum_core::AppResult;

mod parser;


/// Comparison keyword of a binary comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// `eq`
    Eq,
    /// `ne`
    Ne,
    /// `gt`
    Gt,
    /// `ge`
    Ge,
    /// `lt`
    Lt,
    /// `le`
    Le,
}

impl ComparisonOperator {
    /// Returns the keyword.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
        }
    }

    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            _ => None,
        }
    }
}

/// Function-call predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFunction {
    /// `contains(field, 'text')`
    Contains,
    /// `startswith(field, 'text')`
    StartsWith,
    /// `endswith(field, 'text')`
    EndsWith,
    /// `has(field, 'choice')`
    Has,
}

impl FilterFunction {
    /// Returns the function name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Has => "has",
        }
    }

    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "contains" => Some(Self::Contains),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            "has" => Some(Self::Has),
            _ => None,
        }
    }
}

/// Literal operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Single-quoted string.
    String(String),
    /// Unquoted decimal number.
    Number(Decimal),
    /// `true` or `false`.
    Boolean(bool),
    /// `null`
    Null,
}

impl Display for Literal {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(value) => write!(formatter, "'{}'", value.replace('\'', "''")),
            Self::Number(value) => write!(formatter, "{value}"),
            Self::Boolean(value) => write!(formatter, "{value}"),
            Self::Null => formatter.write_str("null"),
        }
    }
}

/// Parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpression {
    /// All children hold.
    And(Vec<FilterExpression>),
    /// Any child holds.
    Or(Vec<FilterExpression>),
    /// The child does not hold.
    Not(Box<FilterExpression>),
    /// `field op literal`
    Compare {
        /// Field developer name.
        field: String,
        /// Comparison keyword.
        operator: ComparisonOperator,
        /// Right-hand side.
        value: Literal,
    },
    /// `function(field, literal)`
    Function {
        /// Predicate function.
        function: FilterFunction,
        /// Field developer name.
        field: String,
        /// Second argument.
        value: Literal,
    },
}

impl FilterExpression {
    /// Joins expressions with `and`, flattening a single expression.
    #[must_use]
    pub fn all(mut expressions: Vec<FilterExpression>) -> Option<FilterExpression> {
        match expressions.len() {
            0 => None,
            1 => expressions.pop(),
            _ => Some(Self::And(expressions)),
        }
    }
}

impl Display for FilterExpression {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And(children) | Self::Or(children) => {
                let keyword = if matches!(self, Self::And(_)) {
                    " and "
                } else {
                    " or "
                };
                formatter.write_str("(")?;
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(keyword)?;
                    }
                    write!(formatter, "{child}")?;
                }
                formatter.write_str(")")
            }
            Self::Not(child) => write!(formatter, "(not {child})"),
            Self::Compare {
                field,
                operator,
                value,
            } => write!(formatter, "({field} {} {value})", operator.as_str()),
            Self::Function {
                function,
                field,
                value,
            } => write!(formatter, "({}({field}, {value}))", function.as_str()),
        }
    }
}

/// Parses one portable filter string.
pub fn parse_filter(text: &str) -> AppResult<FilterExpression> {
    parser::parse(text)
}
