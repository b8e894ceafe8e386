use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vellum_core::AppError;

/// Comparison operator applied by one filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ConditionOperator {
    /// Value equals the operand.
    Equals,
    /// Value differs from the operand or is absent.
    NotEquals,
    /// Text contains the operand.
    Contains,
    /// Text does not contain the operand.
    NotContains,
    /// Text starts with the operand.
    StartsWith,
    /// Text does not start with the operand.
    NotStartsWith,
    /// Text ends with the operand.
    EndsWith,
    /// Text does not end with the operand.
    NotEndsWith,
    /// Value is greater than the operand.
    GreaterThan,
    /// Value is less than the operand.
    LessThan,
    /// Value is greater than or equal to the operand.
    GreaterThanOrEqual,
    /// Value is less than or equal to the operand.
    LessThanOrEqual,
    /// Field has no value.
    IsEmpty,
    /// Field has a value.
    IsNotEmpty,
    /// Boolean field is set.
    IsTrue,
    /// Boolean field is unset.
    IsFalse,
    /// Multi-choice field includes the operand.
    Has,
    /// Multi-choice field does not include the operand.
    HasNot,
}

impl ConditionOperator {
    const ALL: [Self; 18] = [
        Self::Equals,
        Self::NotEquals,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::NotStartsWith,
        Self::EndsWith,
        Self::NotEndsWith,
        Self::GreaterThan,
        Self::LessThan,
        Self::GreaterThanOrEqual,
        Self::LessThanOrEqual,
        Self::IsEmpty,
        Self::IsNotEmpty,
        Self::IsTrue,
        Self::IsFalse,
        Self::Has,
        Self::HasNot,
    ];

    const WITHOUT_VALUES: [Self; 4] = [Self::IsTrue, Self::IsFalse, Self::IsEmpty, Self::IsNotEmpty];

    /// Returns every operator in declaration order.
    #[must_use]
    pub fn supported_operators() -> &'static [Self] {
        &Self::ALL
    }

    /// Returns the operators that take no operand.
    #[must_use]
    pub fn operators_without_values() -> &'static [Self] {
        &Self::WITHOUT_VALUES
    }

    /// Returns the stable developer name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::NotEquals => "ne",
            Self::Contains => "contains",
            Self::NotContains => "ncontains",
            Self::StartsWith => "startswith",
            Self::NotStartsWith => "nstartswith",
            Self::EndsWith => "endswith",
            Self::NotEndsWith => "nendswith",
            Self::GreaterThan => "gt",
            Self::LessThan => "lt",
            Self::GreaterThanOrEqual => "ge",
            Self::LessThanOrEqual => "le",
            Self::IsEmpty => "empty",
            Self::IsNotEmpty => "notempty",
            Self::IsTrue => "true",
            Self::IsFalse => "false",
            Self::Has => "has",
            Self::HasNot => "nhas",
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::NotEquals => "Does not equal",
            Self::Contains => "Contains",
            Self::NotContains => "Does not contain",
            Self::StartsWith => "Starts with",
            Self::NotStartsWith => "Does not start with",
            Self::EndsWith => "Ends with",
            Self::NotEndsWith => "Does not end with",
            Self::GreaterThan => "Greater than",
            Self::LessThan => "Less than",
            Self::GreaterThanOrEqual => "Greater than or equal",
            Self::LessThanOrEqual => "Less than or equal",
            Self::IsEmpty => "Is empty",
            Self::IsNotEmpty => "Is not empty",
            Self::IsTrue => "Is true",
            Self::IsFalse => "Is false",
            Self::Has => "Has",
            Self::HasNot => "Does not have",
        }
    }

    /// Returns whether the operator compares against an operand.
    #[must_use]
    pub fn takes_operand(&self) -> bool {
        !Self::WITHOUT_VALUES.contains(self)
    }

    /// Returns the positive operator for negated variants.
    ///
    /// `ncontains` becomes `(true, contains)`, `ne` stays `(false, ne)`
    /// because inequality has its own comparison semantics.
    #[must_use]
    pub fn split_negation(self) -> (bool, Self) {
        match self {
            Self::NotContains => (true, Self::Contains),
            Self::NotStartsWith => (true, Self::StartsWith),
            Self::NotEndsWith => (true, Self::EndsWith),
            Self::HasNot => (true, Self::Has),
            other => (false, other),
        }
    }
}

impl Display for ConditionOperator {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ConditionOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|operator| operator.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| AppError::Unsupported(format!("unsupported condition operator '{value}'")))
    }
}

impl TryFrom<String> for ConditionOperator {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConditionOperator> for &'static str {
    fn from(value: ConditionOperator) -> Self {
        value.as_str()
    }
}

/// Combinator joining sibling filter conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BooleanOperator {
    /// Every child must match.
    And,
    /// Any child may match.
    Or,
    /// The single child must not match.
    Not,
}

impl BooleanOperator {
    const ALL: [Self; 3] = [Self::And, Self::Or, Self::Not];

    /// Returns every boolean operator.
    #[must_use]
    pub fn supported_operators() -> &'static [Self] {
        &Self::ALL
    }

    /// Returns the stable developer name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Or => "Or",
            Self::Not => "Not",
        }
    }
}

impl Display for BooleanOperator {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for BooleanOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|operator| operator.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| AppError::Unsupported(format!("unsupported boolean operator '{value}'")))
    }
}

impl TryFrom<String> for BooleanOperator {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BooleanOperator> for &'static str {
    fn from(value: BooleanOperator) -> Self {
        value.as_str()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use vellum_core::AppError;

    use super::{BooleanOperator, ConditionOperator};

    #[test]
    fn condition_operator_cardinality_is_fixed() {
        assert_eq!(ConditionOperator::supported_operators().len(), 18);
        assert_eq!(ConditionOperator::operators_without_values().len(), 4);

        let codes: HashSet<&str> = ConditionOperator::supported_operators()
            .iter()
            .map(ConditionOperator::as_str)
            .collect();
        assert_eq!(codes.len(), 18);
    }

    #[test]
    fn operand_less_operators_are_true_false_empty_notempty() {
        let mut codes: Vec<&str> = ConditionOperator::operators_without_values()
            .iter()
            .map(ConditionOperator::as_str)
            .collect();
        codes.sort_unstable();
        assert_eq!(codes, vec!["empty", "false", "notempty", "true"]);

        for operator in ConditionOperator::supported_operators() {
            let operand_less = ConditionOperator::operators_without_values().contains(operator);
            assert_eq!(operator.takes_operand(), !operand_less);
        }
    }

    #[test]
    fn condition_operator_codes_round_trip() {
        for operator in ConditionOperator::supported_operators() {
            let parsed = operator.as_str().parse::<ConditionOperator>();
            assert_eq!(parsed.ok(), Some(*operator));
            assert_eq!(operator.to_string(), operator.as_str());
        }
    }

    #[test]
    fn unknown_condition_operator_fails_closed() {
        let result = "between".parse::<ConditionOperator>();
        assert!(matches!(result, Err(AppError::Unsupported(message)) if message.contains("between")));
    }

    #[test]
    fn boolean_operator_cardinality_and_lookup() {
        assert_eq!(BooleanOperator::supported_operators().len(), 3);
        assert_eq!("AND".parse::<BooleanOperator>().ok(), Some(BooleanOperator::And));
        assert_eq!("Or".parse::<BooleanOperator>().ok(), Some(BooleanOperator::Or));
        assert_eq!("not".parse::<BooleanOperator>().ok(), Some(BooleanOperator::Not));
        assert!(matches!(
            "xor".parse::<BooleanOperator>(),
            Err(AppError::Unsupported(_))
        ));
    }

    #[test]
    fn operators_serialize_as_developer_names() {
        let json = serde_json::to_string(&ConditionOperator::NotContains)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(json, "\"ncontains\"");

        let parsed: Result<ConditionOperator, _> = serde_json::from_str("\"NotEmpty\"");
        assert_eq!(parsed.ok(), Some(ConditionOperator::IsNotEmpty));

        let rejected: Result<BooleanOperator, _> = serde_json::from_str("\"nand\"");
        assert!(rejected.is_err());
    }

    #[test]
    fn negated_operators_split_into_positive_forms() {
        assert_eq!(
            ConditionOperator::NotContains.split_negation(),
            (true, ConditionOperator::Contains)
        );
        assert_eq!(
            ConditionOperator::HasNot.split_negation(),
            (true, ConditionOperator::Has)
        );
        assert_eq!(
            ConditionOperator::NotEquals.split_negation(),
            (false, ConditionOperator::NotEquals)
        );
    }

    proptest! {
        #[test]
        fn condition_operator_lookup_ignores_case(index in 0usize..18, mask in any::<u32>()) {
            let operator = ConditionOperator::supported_operators()[index];
            let mixed: String = operator
                .as_str()
                .chars()
                .enumerate()
                .map(|(position, ch)| {
                    if mask & (1 << (position % 32)) != 0 {
                        ch.to_ascii_uppercase()
                    } else {
                        ch
                    }
                })
                .collect();
            prop_assert_eq!(mixed.parse::<ConditionOperator>().ok(), Some(operator));
        }
    }
}
