use serde::{Deserialize, Serialize};
use vellum_core::{AppError, AppResult, DeveloperName};

use crate::{BooleanOperator, ConditionOperator};

/// Node of a saved filter tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterNode {
    /// Single comparison.
    Condition(FilterCondition),
    /// Children combined by one boolean operator.
    Group(FilterConditionGroup),
}

impl FilterNode {
    /// Returns every leaf condition, depth first.
    #[must_use]
    pub fn conditions(&self) -> Vec<&FilterCondition> {
        let mut conditions = Vec::new();
        self.collect_conditions(&mut conditions);
        conditions
    }

    fn collect_conditions<'a>(&'a self, conditions: &mut Vec<&'a FilterCondition>) {
        match self {
            Self::Condition(condition) => conditions.push(condition),
            Self::Group(group) => {
                for child in group.children() {
                    child.collect_conditions(conditions);
                }
            }
        }
    }
}

impl From<FilterCondition> for FilterNode {
    fn from(value: FilterCondition) -> Self {
        Self::Condition(value)
    }
}

impl From<FilterConditionGroup> for FilterNode {
    fn from(value: FilterConditionGroup) -> Self {
        Self::Group(value)
    }
}

/// Leaf comparison of one field against an optional operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    field: DeveloperName,
    operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operand: Option<String>,
}

impl FilterCondition {
    /// Creates a condition.
    ///
    /// Operators that take an operand require one. The operand of an
    /// operand-less operator is discarded.
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        operand: Option<String>,
    ) -> AppResult<Self> {
        let field = DeveloperName::new(field)?;
        let operand = if operator.takes_operand() {
            Some(operand.ok_or_else(|| AppError::InvalidField {
                field: field.as_str().to_owned(),
                reason: format!("operator '{}' requires an operand", operator.as_str()),
            })?)
        } else {
            None
        };

        Ok(Self {
            field,
            operator,
            operand,
        })
    }

    /// Returns the referenced field.
    #[must_use]
    pub fn field(&self) -> &DeveloperName {
        &self.field
    }

    /// Returns the operator.
    #[must_use]
    pub fn operator(&self) -> ConditionOperator {
        self.operator
    }

    /// Returns the raw operand.
    #[must_use]
    pub fn operand(&self) -> Option<&str> {
        self.operand.as_deref()
    }
}

/// Children joined by one boolean operator.
///
/// `not` groups negate exactly one child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConditionGroup {
    operator: BooleanOperator,
    children: Vec<FilterNode>,
}

impl FilterConditionGroup {
    /// Creates a validated group.
    pub fn new(operator: BooleanOperator, children: Vec<FilterNode>) -> AppResult<Self> {
        let group = Self { operator, children };
        group.validate()?;
        Ok(group)
    }

    /// Checks the child count rules for this group's operator.
    pub fn validate(&self) -> AppResult<()> {
        if self.children.is_empty() {
            return Err(AppError::Validation(format!(
                "filter group '{}' must include at least one child",
                self.operator.as_str()
            )));
        }

        if self.operator == BooleanOperator::Not && self.children.len() != 1 {
            return Err(AppError::Validation(format!(
                "filter group 'not' must have exactly one child, found {}",
                self.children.len()
            )));
        }

        Ok(())
    }

    /// Returns the joining operator.
    #[must_use]
    pub fn operator(&self) -> BooleanOperator {
        self.operator
    }

    /// Returns the children in order.
    #[must_use]
    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }
}
